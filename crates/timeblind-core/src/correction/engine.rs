//! The correction engine: history store in, multiplier out.
//!
//! Reads and appends go through the injected [`HistoryStore`]; everything
//! between them is pure. The engine keeps no mutable state, so it can be
//! shared behind an `Arc` and called concurrently for any number of users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::apply::{correct_batch, CorrectedTaskEstimate, NewTaskEstimate};
use super::estimator::{estimate_multiplier, MultiplierEstimate, MultiplierSource};
use super::filter::{classify_record, RecordVerdict};
use super::CorrectionConfig;
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::history::{DurationUnit, HistoricalRecord, HistoryStore};

/// What happened to a completion handed to the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Appended to the store
    Recorded,
    /// Not written: ran past the outlier guard
    SkippedOutlier,
    /// Not written: non-positive or non-finite duration
    SkippedMalformed,
}

/// Result of [`CorrectionEngine::complete_task`].
///
/// The multiplier is always available; `persistence_error` is set when the
/// store rejected the write.
#[derive(Debug)]
pub struct CompletionReport {
    pub outcome: RecordOutcome,
    pub multiplier: MultiplierEstimate,
    pub persistence_error: Option<StoreError>,
}

impl CompletionReport {
    pub fn persisted(&self) -> bool {
        self.outcome == RecordOutcome::Recorded && self.persistence_error.is_none()
    }
}

/// Per-user correction engine over an injected history store.
pub struct CorrectionEngine<S> {
    store: S,
    config: CorrectionConfig,
}

impl<S: HistoryStore> CorrectionEngine<S> {
    /// Create an engine after validating `config`.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the policy constants are unusable.
    pub fn new(store: S, config: CorrectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &CorrectionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Compute the current multiplier for `user_id`.
    ///
    /// Never fails: an unreadable store or thin history both resolve to the
    /// configured default, distinguished by [`MultiplierSource`].
    pub async fn multiplier_for(&self, user_id: &str) -> MultiplierEstimate {
        match self.recent_history(user_id).await {
            Ok(history) => self.estimate(user_id, &history),
            Err(err) => {
                warn!(user_id, error = %err, "history unavailable, using default multiplier");
                MultiplierEstimate::fallback(
                    &self.config,
                    MultiplierSource::StoreUnavailable {
                        reason: err.to_string(),
                    },
                    0,
                )
            }
        }
    }

    /// Correct a batch of tasks with one multiplier lookup for `user_id`.
    pub async fn correct_for_user(
        &self,
        user_id: &str,
        tasks: Vec<NewTaskEstimate>,
    ) -> (MultiplierEstimate, Vec<CorrectedTaskEstimate>) {
        let estimate = self.multiplier_for(user_id).await;
        let corrected = correct_batch(tasks, estimate.multiplier);
        debug!(
            user_id,
            multiplier = estimate.multiplier,
            count = corrected.len(),
            "corrected task batch"
        );
        (estimate, corrected)
    }

    /// Record a completed task, subject to the outlier guard.
    ///
    /// `completed_at` defaults to now.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] for an empty user id and
    /// [`CoreError::Store`] when the append fails.
    pub async fn record_completion(
        &self,
        user_id: &str,
        estimated_duration: f64,
        actual_duration: f64,
        unit: DurationUnit,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<RecordOutcome> {
        let record = build_record(user_id, estimated_duration, actual_duration, unit, completed_at)?;
        let outcome = self.verdict(user_id, &record);
        if outcome == RecordOutcome::Recorded {
            self.store.append_record(user_id, &record).await?;
        }
        Ok(outcome)
    }

    /// Record a completion and return the refreshed multiplier.
    ///
    /// The multiplier includes the just-completed task even if the store
    /// rejects the write, so the current session keeps its personalization.
    ///
    /// # Errors
    /// Returns [`CoreError::Validation`] for an empty user id. Store failures
    /// are reported inside the [`CompletionReport`] instead.
    pub async fn complete_task(
        &self,
        user_id: &str,
        estimated_duration: f64,
        actual_duration: f64,
        unit: DurationUnit,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<CompletionReport> {
        let record = build_record(user_id, estimated_duration, actual_duration, unit, completed_at)?;
        let outcome = self.verdict(user_id, &record);

        let multiplier = match self.recent_history(user_id).await {
            Ok(mut history) => {
                if outcome == RecordOutcome::Recorded {
                    history.insert(0, record.clone());
                }
                self.estimate(user_id, &history)
            }
            Err(err) => {
                warn!(user_id, error = %err, "history unavailable while completing task");
                MultiplierEstimate::fallback(
                    &self.config,
                    MultiplierSource::StoreUnavailable {
                        reason: err.to_string(),
                    },
                    0,
                )
            }
        };

        let persistence_error = if outcome == RecordOutcome::Recorded {
            match self.store.append_record(user_id, &record).await {
                Ok(()) => None,
                Err(err) => {
                    warn!(user_id, error = %err, "failed to persist completed task");
                    Some(err)
                }
            }
        } else {
            None
        };

        Ok(CompletionReport {
            outcome,
            multiplier,
            persistence_error,
        })
    }

    async fn recent_history(&self, user_id: &str) -> std::result::Result<Vec<HistoricalRecord>, StoreError> {
        self.store
            .fetch_recent_history(user_id, self.config.max_history_window)
            .await
    }

    fn estimate(&self, user_id: &str, history: &[HistoricalRecord]) -> MultiplierEstimate {
        let estimate = estimate_multiplier(history, &self.config);
        match &estimate.source {
            MultiplierSource::InsufficientHistory { usable, required } => {
                debug!(user_id, usable, required, "not enough history, using default multiplier");
            }
            _ => {
                debug!(
                    user_id,
                    multiplier = estimate.multiplier,
                    samples = estimate.sample_count,
                    "computed personal multiplier"
                );
            }
        }
        estimate
    }

    fn verdict(&self, user_id: &str, record: &HistoricalRecord) -> RecordOutcome {
        match classify_record(record, self.config.outlier_factor) {
            RecordVerdict::Usable => RecordOutcome::Recorded,
            RecordVerdict::Outlier => {
                info!(
                    user_id,
                    estimated = record.estimated_duration,
                    actual = record.actual_duration,
                    "skipping runaway completion"
                );
                RecordOutcome::SkippedOutlier
            }
            RecordVerdict::Malformed => {
                debug!(user_id, "skipping malformed completion");
                RecordOutcome::SkippedMalformed
            }
        }
    }
}

fn build_record(
    user_id: &str,
    estimated_duration: f64,
    actual_duration: f64,
    unit: DurationUnit,
    completed_at: Option<DateTime<Utc>>,
) -> Result<HistoricalRecord> {
    if user_id.trim().is_empty() {
        return Err(CoreError::Validation(ValidationError::EmptyId("user_id".to_string())));
    }
    Ok(HistoricalRecord::new(estimated_duration, actual_duration, unit)
        .with_completed_at(completed_at.unwrap_or_else(Utc::now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryHistoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Store whose reads and writes can be forced to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryHistoryStore,
        fail_reads: bool,
        fail_writes: bool,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl HistoryStore for FlakyStore {
        async fn fetch_recent_history(
            &self,
            user_id: &str,
            max_count: usize,
        ) -> std::result::Result<Vec<HistoricalRecord>, StoreError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(StoreError::Unavailable("connection refused".to_string()));
            }
            self.inner.fetch_recent_history(user_id, max_count).await
        }

        async fn append_record(
            &self,
            user_id: &str,
            record: &HistoricalRecord,
        ) -> std::result::Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            self.inner.append_record(user_id, record).await
        }
    }

    async fn seed(store: &impl HistoryStore, user: &str, count: usize, estimated: f64, actual: f64) {
        for _ in 0..count {
            let rec = HistoricalRecord::new(estimated, actual, DurationUnit::Minutes);
            store.append_record(user, &rec).await.unwrap();
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = CorrectionEngine::new(MemoryHistoryStore::new(), CorrectionConfig::new().with_decay(1.5));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn cold_start_returns_default() {
        let engine = CorrectionEngine::new(MemoryHistoryStore::new(), CorrectionConfig::default()).unwrap();
        let estimate = engine.multiplier_for("newcomer").await;
        assert_eq!(estimate.multiplier, 1.0);
        assert_eq!(
            estimate.source,
            MultiplierSource::InsufficientHistory { usable: 0, required: 5 }
        );
    }

    #[tokio::test]
    async fn personalized_after_enough_history() {
        let store = MemoryHistoryStore::new();
        seed(&store, "alice", 6, 30.0, 45.0).await;
        let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();

        let estimate = engine.multiplier_for("alice").await;
        assert_eq!(estimate.multiplier, 1.5);
        assert!(estimate.is_personalized());
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_default() {
        let store = FlakyStore {
            fail_reads: true,
            ..Default::default()
        };
        let config = CorrectionConfig::default().with_default_multiplier(1.35);
        let engine = CorrectionEngine::new(store, config).unwrap();

        let estimate = engine.multiplier_for("alice").await;
        assert_eq!(estimate.multiplier, 1.35);
        assert!(matches!(estimate.source, MultiplierSource::StoreUnavailable { .. }));
    }

    #[tokio::test]
    async fn batch_reads_history_once() {
        let store = FlakyStore::default();
        seed(&store, "alice", 6, 20.0, 30.0).await;
        let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();

        let tasks = vec![
            NewTaskEstimate::new("a", 10.0),
            NewTaskEstimate::new("b", 20.0),
            NewTaskEstimate::new("c", 30.0),
        ];
        let (estimate, corrected) = engine.correct_for_user("alice", tasks).await;

        assert_eq!(engine.store().reads.load(Ordering::SeqCst), 1);
        assert_eq!(estimate.multiplier, 1.5);
        let values: Vec<f64> = corrected.iter().map(|c| c.corrected_estimate).collect();
        assert_eq!(values, vec![15.0, 30.0, 45.0]);
    }

    #[tokio::test]
    async fn recorder_skips_runaway_and_malformed() {
        let engine = CorrectionEngine::new(MemoryHistoryStore::new(), CorrectionConfig::default()).unwrap();

        let outcome = engine
            .record_completion("alice", 30.0, 400.0, DurationUnit::Minutes, None)
            .await
            .unwrap();
        assert_eq!(outcome, RecordOutcome::SkippedOutlier);

        let outcome = engine
            .record_completion("alice", 0.0, 20.0, DurationUnit::Minutes, None)
            .await
            .unwrap();
        assert_eq!(outcome, RecordOutcome::SkippedMalformed);

        let outcome = engine
            .record_completion("alice", 30.0, 40.0, DurationUnit::Minutes, None)
            .await
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Recorded);
        assert_eq!(engine.store().record_count("alice"), 1);
    }

    #[tokio::test]
    async fn recorder_reports_write_failure() {
        let store = FlakyStore {
            fail_writes: true,
            ..Default::default()
        };
        let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();
        let result = engine
            .record_completion("alice", 30.0, 40.0, DurationUnit::Minutes, None)
            .await;
        assert!(matches!(result, Err(CoreError::Store(_))));
    }

    #[tokio::test]
    async fn recorder_rejects_blank_user() {
        let engine = CorrectionEngine::new(MemoryHistoryStore::new(), CorrectionConfig::default()).unwrap();
        let result = engine
            .record_completion("  ", 30.0, 40.0, DurationUnit::Minutes, None)
            .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn complete_task_keeps_multiplier_when_write_fails() {
        let store = FlakyStore {
            fail_writes: true,
            ..Default::default()
        };
        seed(&store.inner, "alice", 4, 30.0, 60.0).await;
        let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();

        let report = engine
            .complete_task("alice", 30.0, 60.0, DurationUnit::Minutes, None)
            .await
            .unwrap();

        assert_eq!(report.outcome, RecordOutcome::Recorded);
        assert!(!report.persisted());
        assert!(report.persistence_error.is_some());
        assert_eq!(report.multiplier.multiplier, 2.0);
        assert_eq!(report.multiplier.sample_count, 5);
    }

    #[tokio::test]
    async fn complete_task_persists_usable_record() {
        let engine = CorrectionEngine::new(MemoryHistoryStore::new(), CorrectionConfig::default()).unwrap();
        let report = engine
            .complete_task("bob", 25.0, 30.0, DurationUnit::Minutes, None)
            .await
            .unwrap();
        assert!(report.persisted());
        assert_eq!(engine.store().record_count("bob"), 1);
        assert_eq!(report.multiplier.multiplier, 1.0);
    }

    #[tokio::test]
    async fn concurrent_callers_agree() {
        let store = MemoryHistoryStore::new();
        seed(&store, "alice", 8, 40.0, 50.0).await;
        let engine = Arc::new(CorrectionEngine::new(store, CorrectionConfig::default()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.multiplier_for("alice").await.multiplier })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), 1.25);
        }
    }
}
