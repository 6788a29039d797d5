//! Completed-task timing records and the duration units they are measured in.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Unit a duration value is expressed in.
///
/// Every record declares its unit, and the engine converts records into its
/// configured unit before weighting them, so mixed-unit histories never get
/// summed together raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Minutes,
    Seconds,
}

impl DurationUnit {
    /// Number of seconds in one of this unit.
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            DurationUnit::Minutes => 60.0,
            DurationUnit::Seconds => 1.0,
        }
    }

    /// Convert `value` from this unit into `target`.
    pub fn convert(self, value: f64, target: DurationUnit) -> f64 {
        if self == target {
            value
        } else {
            value * self.seconds_per_unit() / target.seconds_per_unit()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Minutes => "minutes",
            DurationUnit::Seconds => "seconds",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DurationUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minutes" | "minute" | "min" | "m" => Ok(DurationUnit::Minutes),
            "seconds" | "second" | "sec" | "s" => Ok(DurationUnit::Seconds),
            other => Err(ValidationError::UnknownUnit(other.to_string())),
        }
    }
}

/// One completed task's timing outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Duration the third-party estimate predicted
    pub estimated_duration: f64,
    /// Duration the task actually took
    pub actual_duration: f64,
    /// Unit both durations are expressed in
    #[serde(default)]
    pub unit: DurationUnit,
    /// When the task was completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl HistoricalRecord {
    pub fn new(estimated_duration: f64, actual_duration: f64, unit: DurationUnit) -> Self {
        Self {
            estimated_duration,
            actual_duration,
            unit,
            completed_at: None,
        }
    }

    /// Set the completion timestamp.
    pub fn with_completed_at(mut self, completed_at: DateTime<Utc>) -> Self {
        self.completed_at = Some(completed_at);
        self
    }

    /// Copy of this record with both durations converted into `unit`.
    pub fn in_unit(&self, unit: DurationUnit) -> Self {
        Self {
            estimated_duration: self.unit.convert(self.estimated_duration, unit),
            actual_duration: self.unit.convert(self.actual_duration, unit),
            unit,
            completed_at: self.completed_at,
        }
    }

    /// Whether both durations are finite and strictly positive.
    pub fn is_well_formed(&self) -> bool {
        is_positive_finite(self.estimated_duration) && is_positive_finite(self.actual_duration)
    }
}

fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Order records most-recent-first by `completed_at`.
///
/// The sort is stable: records sharing a timestamp keep their relative
/// order, and records without a timestamp sink to the end in input order.
pub fn sort_most_recent_first(records: &mut [HistoricalRecord]) {
    records.sort_by(|a, b| match (a.completed_at, b.completed_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
