//! Recency-weighted multiplier estimation.
//!
//! The multiplier is the ratio of decay-weighted actual time to
//! decay-weighted estimated time over the usable history, most recent record
//! weighted 1, the next `decay`, then `decay^2`, and so on.

use serde::{Deserialize, Serialize};

use super::filter::filter_history;
use super::CorrectionConfig;
use crate::history::HistoricalRecord;

/// Why a multiplier has the value it has.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MultiplierSource {
    /// Computed from the user's own history
    Personalized,
    /// Too few usable records; the default was used
    InsufficientHistory { usable: usize, required: usize },
    /// The history store could not be read; the default was used
    StoreUnavailable { reason: String },
}

/// A computed correction factor and its provenance.
///
/// Derived fresh per request; callers may hold it for the duration of one
/// batch but should not persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierEstimate {
    pub multiplier: f64,
    pub source: MultiplierSource,
    /// Usable records that went into the computation
    pub sample_count: usize,
}

impl MultiplierEstimate {
    /// Default multiplier with the given fallback reason.
    pub fn fallback(config: &CorrectionConfig, source: MultiplierSource, sample_count: usize) -> Self {
        Self {
            multiplier: config.default_multiplier,
            source,
            sample_count,
        }
    }

    pub fn is_personalized(&self) -> bool {
        self.source == MultiplierSource::Personalized
    }
}

/// Decay-weighted `Σ w·actual / Σ w·estimated` over most-recent-first samples.
///
/// Returns `None` when the weighted denominator is not a finite positive
/// number (empty input, or weights underflowed to zero). No clamping or
/// rounding is applied.
pub fn weighted_ratio(samples: &[HistoricalRecord], decay: f64) -> Option<f64> {
    let mut weighted_actual = 0.0_f64;
    let mut weighted_estimated = 0.0_f64;
    let mut weight = 1.0_f64;
    for sample in samples {
        weighted_actual += weight * sample.actual_duration;
        weighted_estimated += weight * sample.estimated_duration;
        weight *= decay;
    }

    if !(weighted_estimated.is_finite() && weighted_estimated > 0.0) {
        return None;
    }
    let ratio = weighted_actual / weighted_estimated;
    ratio.is_finite().then_some(ratio)
}

/// Clamp into the configured range and round to two decimals.
///
/// Never panics: with inverted bounds the upper bound wins, and a NaN bound
/// is ignored.
pub fn clamp_multiplier(ratio: f64, config: &CorrectionConfig) -> f64 {
    let clamped = bound(ratio, config.min_multiplier, config.max_multiplier);
    // Re-clamp in case a bound itself carries more than two decimals.
    bound(round_to_hundredths(clamped), config.min_multiplier, config.max_multiplier)
}

fn bound(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the multiplier for a most-recent-first history.
///
/// Pure and deterministic: the same records and config always produce the
/// same estimate. Falls back to `default_multiplier` when fewer than
/// `min_data_points` records survive filtering.
pub fn estimate_multiplier(records: &[HistoricalRecord], config: &CorrectionConfig) -> MultiplierEstimate {
    let filtered = filter_history(records, config);
    let usable = filtered.len();

    let insufficient = MultiplierSource::InsufficientHistory {
        usable,
        required: config.min_data_points,
    };
    if usable < config.min_data_points {
        return MultiplierEstimate::fallback(config, insufficient, usable);
    }

    match weighted_ratio(&filtered.samples, config.decay) {
        Some(ratio) => MultiplierEstimate {
            multiplier: clamp_multiplier(ratio, config),
            source: MultiplierSource::Personalized,
            sample_count: usable,
        },
        None => MultiplierEstimate::fallback(config, insufficient, usable),
    }
}
