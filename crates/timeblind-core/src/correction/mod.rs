//! Personal estimate correction.
//!
//! Pipeline: [`filter_history`] drops malformed and runaway records,
//! [`estimate_multiplier`] folds the rest into a recency-weighted ratio with
//! clamping and a cold-start default, and [`apply_multiplier`] /
//! [`correct_batch`] scale new estimates. [`CorrectionEngine`] wires the
//! pipeline to a [`HistoryStore`](crate::history::HistoryStore).

mod apply;
mod config;
mod engine;
mod estimator;
mod filter;

pub use apply::{apply_multiplier, correct_batch, CorrectedTaskEstimate, NewTaskEstimate};
pub use config::CorrectionConfig;
pub use engine::{CompletionReport, CorrectionEngine, RecordOutcome};
pub use estimator::{
    clamp_multiplier, estimate_multiplier, weighted_ratio, MultiplierEstimate, MultiplierSource,
};
pub use filter::{classify_record, filter_history, FilteredHistory, RecordVerdict};
