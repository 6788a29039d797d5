//! History cleaning: which records are allowed to influence the multiplier.

use serde::{Deserialize, Serialize};

use super::CorrectionConfig;
use crate::history::HistoricalRecord;

/// How a single record is treated by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordVerdict {
    /// Counts toward the multiplier
    Usable,
    /// Missing, non-positive or non-finite duration
    Malformed,
    /// Ran more than `outlier_factor` times over its estimate (left running, etc.)
    Outlier,
}

/// Classify one record against the outlier guard.
///
/// Overestimates (actual below estimate) are always usable; only runaway
/// actuals strictly above `estimated * outlier_factor` are rejected.
pub fn classify_record(record: &HistoricalRecord, outlier_factor: f64) -> RecordVerdict {
    if !record.is_well_formed() {
        return RecordVerdict::Malformed;
    }
    if record.actual_duration > record.estimated_duration * outlier_factor {
        return RecordVerdict::Outlier;
    }
    RecordVerdict::Usable
}

/// Result of cleaning a history window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredHistory {
    /// Usable records, most recent first, converted into the configured unit
    pub samples: Vec<HistoricalRecord>,
    /// Records dropped as malformed
    pub malformed: usize,
    /// Records dropped as runaway outliers
    pub outliers: usize,
}

impl FilteredHistory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Clean a most-recent-first history window.
///
/// Only the first `max_history_window` records are considered. Order is
/// preserved so recency ranks stay meaningful after filtering.
pub fn filter_history(records: &[HistoricalRecord], config: &CorrectionConfig) -> FilteredHistory {
    let mut filtered = FilteredHistory::default();
    for record in records.iter().take(config.max_history_window) {
        match classify_record(record, config.outlier_factor) {
            RecordVerdict::Usable => filtered.samples.push(record.in_unit(config.unit)),
            RecordVerdict::Malformed => filtered.malformed += 1,
            RecordVerdict::Outlier => filtered.outliers += 1,
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::DurationUnit;

    fn rec(estimated: f64, actual: f64) -> HistoricalRecord {
        HistoricalRecord::new(estimated, actual, DurationUnit::Minutes)
    }

    #[test]
    fn classify_boundaries() {
        assert_eq!(classify_record(&rec(10.0, 100.0), 10.0), RecordVerdict::Usable);
        assert_eq!(classify_record(&rec(10.0, 100.1), 10.0), RecordVerdict::Outlier);
        assert_eq!(classify_record(&rec(10.0, 2.0), 10.0), RecordVerdict::Usable);
        assert_eq!(classify_record(&rec(0.0, 2.0), 10.0), RecordVerdict::Malformed);
        assert_eq!(classify_record(&rec(10.0, 0.0), 10.0), RecordVerdict::Malformed);
    }

    #[test]
    fn filter_counts_and_preserves_order() {
        let records = vec![
            rec(30.0, 40.0),
            rec(-5.0, 10.0),
            rec(30.0, 600.0),
            rec(30.0, 20.0),
        ];
        let filtered = filter_history(&records, &CorrectionConfig::default());
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.malformed, 1);
        assert_eq!(filtered.outliers, 1);
        assert_eq!(filtered.samples[0].actual_duration, 40.0);
        assert_eq!(filtered.samples[1].actual_duration, 20.0);
    }

    #[test]
    fn filter_respects_history_window() {
        let records: Vec<_> = (0..10).map(|i| rec(10.0, 10.0 + i as f64)).collect();
        let config = CorrectionConfig::default().with_max_history_window(4);
        let filtered = filter_history(&records, &config);
        assert_eq!(filtered.len(), 4);
        assert_eq!(filtered.samples[3].actual_duration, 13.0);
    }

    #[test]
    fn filter_normalizes_units() {
        let records = vec![HistoricalRecord::new(600.0, 900.0, DurationUnit::Seconds)];
        let filtered = filter_history(&records, &CorrectionConfig::default());
        assert_eq!(filtered.samples[0].estimated_duration, 10.0);
        assert_eq!(filtered.samples[0].actual_duration, 15.0);
        assert_eq!(filtered.samples[0].unit, DurationUnit::Minutes);
    }
}
