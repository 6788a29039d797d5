//! Correction policy constants.
//!
//! A single weighted-decay-with-clamp policy is used everywhere; every
//! constant is named here and tunable per deployment through `config.toml`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::history::DurationUnit;

/// Tunable constants for the correction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionConfig {
    /// Maximum number of records considered per computation
    #[serde(default = "default_max_history_window")]
    pub max_history_window: usize,
    /// Below this many usable records the default multiplier is returned
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,
    /// Records with actual > estimated * this are discarded as runaways
    #[serde(default = "default_outlier_factor")]
    pub outlier_factor: f64,
    /// Geometric recency weighting base, in (0, 1)
    #[serde(default = "default_decay")]
    pub decay: f64,
    /// Lower clamp bound
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: f64,
    /// Upper clamp bound
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: f64,
    /// Cold-start / fallback multiplier
    #[serde(default = "default_multiplier")]
    pub default_multiplier: f64,
    /// Unit all history is normalized to before weighting
    #[serde(default)]
    pub unit: DurationUnit,
}

fn default_max_history_window() -> usize {
    50
}
fn default_min_data_points() -> usize {
    5
}
fn default_outlier_factor() -> f64 {
    10.0
}
fn default_decay() -> f64 {
    0.85
}
fn default_min_multiplier() -> f64 {
    0.8
}
fn default_max_multiplier() -> f64 {
    2.5
}
fn default_multiplier() -> f64 {
    1.0
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            max_history_window: default_max_history_window(),
            min_data_points: default_min_data_points(),
            outlier_factor: default_outlier_factor(),
            decay: default_decay(),
            min_multiplier: default_min_multiplier(),
            max_multiplier: default_max_multiplier(),
            default_multiplier: default_multiplier(),
            unit: DurationUnit::default(),
        }
    }
}

impl CorrectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_history_window(mut self, window: usize) -> Self {
        self.max_history_window = window;
        self
    }

    pub fn with_min_data_points(mut self, points: usize) -> Self {
        self.min_data_points = points;
        self
    }

    pub fn with_outlier_factor(mut self, factor: f64) -> Self {
        self.outlier_factor = factor;
        self
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    pub fn with_bounds(mut self, min_multiplier: f64, max_multiplier: f64) -> Self {
        self.min_multiplier = min_multiplier;
        self.max_multiplier = max_multiplier;
        self
    }

    pub fn with_default_multiplier(mut self, multiplier: f64) -> Self {
        self.default_multiplier = multiplier;
        self
    }

    pub fn with_unit(mut self, unit: DurationUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Check that the constants describe a usable policy.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_window == 0 {
            return Err(invalid("max_history_window", "must be at least 1"));
        }
        if self.min_data_points == 0 {
            return Err(invalid("min_data_points", "must be at least 1"));
        }
        if !(self.outlier_factor.is_finite() && self.outlier_factor >= 1.0) {
            return Err(invalid("outlier_factor", "must be a finite number >= 1"));
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(invalid("decay", "must lie strictly between 0 and 1"));
        }
        for (key, value) in [
            ("min_multiplier", self.min_multiplier),
            ("max_multiplier", self.max_multiplier),
            ("default_multiplier", self.default_multiplier),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(key, "must be a finite positive number"));
            }
        }
        if self.min_multiplier > self.max_multiplier {
            return Err(invalid(
                "min_multiplier",
                &format!(
                    "{} exceeds max_multiplier {}",
                    self.min_multiplier, self.max_multiplier
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
