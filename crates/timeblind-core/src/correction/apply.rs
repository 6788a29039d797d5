//! Applying a multiplier to new estimates.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scale `raw_estimate` by `multiplier`, rounding up.
///
/// - `raw_estimate <= 0` yields 0: there is nothing to correct.
/// - `multiplier <= 0` leaves the estimate unchanged; a non-positive
///   multiplier means "no correction available", never "zero the task".
/// - Otherwise `ceil(raw_estimate * multiplier)`, so the result is never
///   below the exact product.
pub fn apply_multiplier(raw_estimate: f64, multiplier: f64) -> f64 {
    if raw_estimate.is_nan() || raw_estimate <= 0.0 {
        return 0.0;
    }
    if multiplier.is_nan() || multiplier <= 0.0 {
        return raw_estimate;
    }
    (raw_estimate * multiplier).ceil()
}

/// An incoming task whose duration estimate should be corrected.
///
/// Fields other than `title` and `estimate` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTaskEstimate {
    pub title: String,
    /// Raw third-party estimate
    pub estimate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewTaskEstimate {
    pub fn new(title: impl Into<String>, estimate: f64) -> Self {
        Self {
            title: title.into(),
            estimate,
            extra: Map::new(),
        }
    }

    /// Attach an opaque field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Keys written by [`CorrectedTaskEstimate`] next to the task's own fields.
const ANNOTATION_KEYS: [&str; 3] = ["original_estimate", "multiplier", "corrected_estimate"];

/// A task annotated with its corrected duration.
///
/// Opaque task fields named like an annotation are dropped so the
/// serialized object never repeats a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedTaskEstimate {
    #[serde(flatten)]
    pub task: NewTaskEstimate,
    pub original_estimate: f64,
    pub multiplier: f64,
    pub corrected_estimate: f64,
}

impl CorrectedTaskEstimate {
    pub fn from_task(mut task: NewTaskEstimate, multiplier: f64) -> Self {
        for key in ANNOTATION_KEYS {
            task.extra.remove(key);
        }
        let original_estimate = task.estimate;
        Self {
            corrected_estimate: apply_multiplier(original_estimate, multiplier),
            original_estimate,
            multiplier,
            task,
        }
    }
}

/// Correct every task with the same multiplier, preserving input order.
pub fn correct_batch<I>(tasks: I, multiplier: f64) -> Vec<CorrectedTaskEstimate>
where
    I: IntoIterator<Item = NewTaskEstimate>,
{
    tasks
        .into_iter()
        .map(|task| CorrectedTaskEstimate::from_task(task, multiplier))
        .collect()
}
