//! Statistics over completion history.

mod accuracy;

pub use accuracy::{calculate_confidence, AccuracyReport, EstimateAccuracy};
