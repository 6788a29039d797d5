//! # Timeblind Core Library
//!
//! Learns how long a person's tasks really take compared with the estimates
//! they are given, and rescales new estimates accordingly. The CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Correction**: pure filter, recency-weighted estimator, clamp/default
//!   policy and multiplier application, plus the async [`CorrectionEngine`]
//!   that reads history through an injected store
//! - **History**: [`HistoricalRecord`], [`DurationUnit`] and the
//!   [`HistoryStore`] contract, with an in-memory implementation
//! - **Storage**: SQLite-backed [`SqliteHistoryStore`] and TOML [`Config`]
//! - **Stats**: unweighted accuracy reporting over the same history
//!
//! ## Key Components
//!
//! - [`CorrectionEngine`]: multiplier lookup, batch correction, completion recording
//! - [`estimate_multiplier`]: the pure multiplier computation
//! - [`apply_multiplier`]: ceiling-rounded application to one estimate

pub mod correction;
pub mod error;
pub mod history;
pub mod stats;
pub mod storage;

pub use correction::{
    apply_multiplier, correct_batch, estimate_multiplier, CompletionReport, CorrectedTaskEstimate,
    CorrectionConfig, CorrectionEngine, MultiplierEstimate, MultiplierSource, NewTaskEstimate,
    RecordOutcome,
};
pub use error::{ConfigError, CoreError, DatabaseError, StoreError, ValidationError};
pub use history::{DurationUnit, HistoricalRecord, HistoryStore, MemoryHistoryStore};
pub use stats::AccuracyReport;
pub use storage::{Config, SqliteHistoryStore};
