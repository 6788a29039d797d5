//! Estimate accuracy summary.
//!
//! Describes how far a user's estimates have been from reality over the
//! usable history window. The figures are unweighted, unlike the engine's
//! multiplier, so they read as plain averages.

use serde::{Deserialize, Serialize};

use crate::correction::{filter_history, CorrectionConfig};
use crate::history::{DurationUnit, HistoricalRecord};

/// Accuracy metrics for a single completed task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateAccuracy {
    pub estimated: f64,
    pub actual: f64,
    /// actual - estimated, positive = underestimation
    pub error: f64,
    pub absolute_error: f64,
    /// error / estimated
    pub relative_error: f64,
}

impl EstimateAccuracy {
    pub fn from_record(record: &HistoricalRecord) -> Self {
        let error = record.actual_duration - record.estimated_duration;
        let relative_error = if record.estimated_duration > 0.0 {
            error / record.estimated_duration
        } else {
            0.0
        };
        Self {
            estimated: record.estimated_duration,
            actual: record.actual_duration,
            error,
            absolute_error: error.abs(),
            relative_error,
        }
    }

    /// Task took longer than estimated.
    pub fn is_underestimation(&self) -> bool {
        self.error > 0.0
    }

    /// Task finished faster than estimated.
    pub fn is_overestimation(&self) -> bool {
        self.error < 0.0
    }
}

/// Aggregated accuracy over a user's usable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub unit: DurationUnit,
    pub sample_count: usize,
    pub skipped_malformed: usize,
    pub skipped_outliers: usize,
    pub mean_estimated: f64,
    pub mean_actual: f64,
    /// Mean absolute error
    pub mean_absolute_error: f64,
    /// Mean signed error (positive = underestimation)
    pub mean_bias: f64,
    /// 1 - MAE / mean estimate, floored at 0
    pub accuracy_percentage: f64,
    /// Unweighted total actual / total estimated
    pub corrective_factor: f64,
    /// 0.0-1.0, grows with sample count
    pub confidence: f64,
}

/// Confidence from sample count: linear to 0.5 until `min_samples`, then
/// approaching 1.0 exponentially.
pub fn calculate_confidence(count: usize, min_samples: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    if count < min_samples {
        return (count as f64 / min_samples as f64) * 0.5;
    }
    (0.5 + 0.5 * (1.0 - (-((count - min_samples) as f64) / 10.0).exp())).min(1.0)
}

impl AccuracyReport {
    /// Summarize a most-recent-first history with the engine's filtering rules.
    pub fn from_history(records: &[HistoricalRecord], config: &CorrectionConfig) -> Self {
        let filtered = filter_history(records, config);
        let count = filtered.len();
        let confidence = calculate_confidence(count, config.min_data_points);

        if filtered.is_empty() {
            return Self {
                unit: config.unit,
                sample_count: 0,
                skipped_malformed: filtered.malformed,
                skipped_outliers: filtered.outliers,
                mean_estimated: 0.0,
                mean_actual: 0.0,
                mean_absolute_error: 0.0,
                mean_bias: 0.0,
                accuracy_percentage: 1.0,
                corrective_factor: 1.0,
                confidence,
            };
        }

        let accuracies: Vec<EstimateAccuracy> =
            filtered.samples.iter().map(EstimateAccuracy::from_record).collect();
        let n = count as f64;

        let total_estimated: f64 = accuracies.iter().map(|a| a.estimated).sum();
        let total_actual: f64 = accuracies.iter().map(|a| a.actual).sum();
        let mean_estimated = total_estimated / n;
        let mean_actual = total_actual / n;
        let mean_absolute_error = accuracies.iter().map(|a| a.absolute_error).sum::<f64>() / n;
        let mean_bias = accuracies.iter().map(|a| a.error).sum::<f64>() / n;

        Self {
            unit: config.unit,
            sample_count: count,
            skipped_malformed: filtered.malformed,
            skipped_outliers: filtered.outliers,
            mean_estimated,
            mean_actual,
            mean_absolute_error,
            mean_bias,
            accuracy_percentage: (1.0 - mean_absolute_error / mean_estimated).max(0.0),
            corrective_factor: total_actual / total_estimated,
            confidence,
        }
    }

    /// Human-readable description of the bias, relative to the mean estimate.
    pub fn bias_description(&self) -> &'static str {
        if self.sample_count == 0 {
            return "No history yet";
        }
        let relative = self.mean_bias / self.mean_estimated;
        if relative.abs() < 0.05 {
            "Accurate estimates"
        } else if relative > 0.5 {
            "Severe underestimation"
        } else if relative > 0.0 {
            "Moderate underestimation"
        } else if relative < -0.5 {
            "Severe overestimation"
        } else {
            "Moderate overestimation"
        }
    }

    pub fn correction_suggestion(&self) -> String {
        let factor = self.corrective_factor;
        if (factor - 1.0).abs() < 0.05 {
            format!("Estimates are accurate (factor: {factor:.2}x)")
        } else if factor > 1.0 {
            format!(
                "Multiply estimates by {factor:.2}x (tasks take ~{:.0}% longer)",
                (factor - 1.0) * 100.0
            )
        } else {
            format!(
                "Multiply estimates by {factor:.2}x (tasks finish ~{:.0}% faster)",
                (1.0 - factor) * 100.0
            )
        }
    }

    /// Render the report as an ASCII block.
    pub fn render(&self, user_id: &str) -> String {
        let unit = match self.unit {
            DurationUnit::Minutes => "m",
            DurationUnit::Seconds => "s",
        };
        let mut output = String::new();
        output.push_str(&format!("\nEstimate Accuracy Report: {user_id}\n"));
        output.push_str(&"=".repeat(60));
        output.push_str("\n\n");

        if self.sample_count == 0 {
            output.push_str("No usable history.\n");
            return output;
        }

        output.push_str(&format!("{:<22} {:>10}\n", "Samples", self.sample_count));
        output.push_str(&format!(
            "{:<22} {:>10}\n",
            "Skipped (bad/outlier)",
            format!("{}/{}", self.skipped_malformed, self.skipped_outliers)
        ));
        output.push_str(&format!("{:<22} {:>9.1}{unit}\n", "Mean estimate", self.mean_estimated));
        output.push_str(&format!("{:<22} {:>9.1}{unit}\n", "Mean actual", self.mean_actual));
        output.push_str(&format!("{:<22} {:>9.1}{unit}\n", "Mean abs. error", self.mean_absolute_error));
        output.push_str(&format!("{:<22} {:>9.0}%\n", "Accuracy", self.accuracy_percentage * 100.0));
        output.push_str(&format!("{:<22} {:>9.0}%\n", "Confidence", self.confidence * 100.0));
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("{}\n", self.bias_description()));
        if self.confidence >= 0.5 {
            output.push_str(&format!("{}\n", self.correction_suggestion()));
        }
        output
    }
}
