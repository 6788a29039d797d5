//! Integration tests for the correction engine over real history stores.

use chrono::{DateTime, Duration, Utc};
use timeblind_core::{
    apply_multiplier, estimate_multiplier, AccuracyReport, CorrectionConfig, CorrectionEngine,
    DurationUnit, HistoricalRecord, HistoryStore, MemoryHistoryStore, MultiplierSource,
    NewTaskEstimate, RecordOutcome, SqliteHistoryStore,
};

fn base_time() -> DateTime<Utc> {
    // Fixed timestamp keeps ordering deterministic across runs
    DateTime::parse_from_rfc3339("2026-02-16T12:00:00+00:00")
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn test_full_correction_workflow_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteHistoryStore::open_at(&dir.path().join("history.db")).unwrap();
    let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();

    // Cold start
    let estimate = engine.multiplier_for("alice").await;
    assert_eq!(estimate.multiplier, 1.0);

    for i in 0..6 {
        let outcome = engine
            .record_completion(
                "alice",
                30.0,
                45.0,
                DurationUnit::Minutes,
                Some(base_time() + Duration::minutes(i * 45)),
            )
            .await
            .unwrap();
        assert_eq!(outcome, RecordOutcome::Recorded);
    }

    // Runaway completion (timer left overnight) is never written
    let outcome = engine
        .record_completion("alice", 30.0, 600.0, DurationUnit::Minutes, Some(base_time() + Duration::hours(12)))
        .await
        .unwrap();
    assert_eq!(outcome, RecordOutcome::SkippedOutlier);
    assert_eq!(engine.store().count_records("alice").unwrap(), 6);

    let estimate = engine.multiplier_for("alice").await;
    assert_eq!(estimate.multiplier, 1.5);
    assert_eq!(estimate.source, MultiplierSource::Personalized);

    let tasks = vec![
        NewTaskEstimate::new("Write tests", 100.0),
        NewTaskEstimate::new("Review PR", 20.0),
    ];
    let (used, corrected) = engine.correct_for_user("alice", tasks).await;
    assert_eq!(used.multiplier, 1.5);
    assert_eq!(corrected[0].corrected_estimate, 150.0);
    assert_eq!(corrected[1].corrected_estimate, 30.0);
}

#[tokio::test]
async fn test_recent_behaviour_outweighs_old_behaviour() {
    let store = MemoryHistoryStore::new();
    // Ten old accurate tasks, then five recent slow ones.
    for i in 0..15 {
        let actual = if i < 10 { 20.0 } else { 40.0 };
        let rec = HistoricalRecord::new(20.0, actual, DurationUnit::Minutes)
            .with_completed_at(base_time() + Duration::hours(i));
        store.append_record("alice", &rec).await.unwrap();
    }
    let engine = CorrectionEngine::new(store, CorrectionConfig::default()).unwrap();

    let estimate = engine.multiplier_for("alice").await;
    // Unweighted ratio would be 25/20 = 1.25
    assert!(estimate.multiplier > 1.5, "got {}", estimate.multiplier);
}

#[tokio::test]
async fn test_history_window_limits_influence() {
    let store = MemoryHistoryStore::new();
    for i in 0..10 {
        let actual = if i < 5 { 80.0 } else { 20.0 };
        let rec = HistoricalRecord::new(20.0, actual, DurationUnit::Minutes)
            .with_completed_at(base_time() + Duration::hours(i));
        store.append_record("alice", &rec).await.unwrap();
    }
    let config = CorrectionConfig::default().with_max_history_window(5);
    let engine = CorrectionEngine::new(store, config).unwrap();

    // Only the five most recent (accurate) tasks are considered.
    assert_eq!(engine.multiplier_for("alice").await.multiplier, 1.0);
}

#[tokio::test]
async fn test_seconds_deployment_accepts_minute_records() {
    let store = MemoryHistoryStore::new();
    for _ in 0..3 {
        let rec = HistoricalRecord::new(10.0, 15.0, DurationUnit::Minutes);
        store.append_record("alice", &rec).await.unwrap();
    }
    for _ in 0..3 {
        let rec = HistoricalRecord::new(600.0, 900.0, DurationUnit::Seconds);
        store.append_record("alice", &rec).await.unwrap();
    }
    let config = CorrectionConfig::default().with_unit(DurationUnit::Seconds);
    let engine = CorrectionEngine::new(store, config).unwrap();

    assert_eq!(engine.multiplier_for("alice").await.multiplier, 1.5);
}

#[test]
fn test_reference_examples() {
    let config = CorrectionConfig::default();
    let records: Vec<_> = (0..6)
        .map(|_| HistoricalRecord::new(30.0, 45.0, DurationUnit::Minutes))
        .collect();
    assert_eq!(estimate_multiplier(&records, &config).multiplier, 1.5);

    let config = config.with_default_multiplier(1.35);
    assert_eq!(estimate_multiplier(&records[..3], &config).multiplier, 1.35);

    assert_eq!(apply_multiplier(100.0, 1.35), 135.0);
    assert_eq!(apply_multiplier(0.0, 1.35), 0.0);
    assert_eq!(apply_multiplier(50.0, 0.0), 50.0);
}

#[test]
fn test_accuracy_report_matches_engine_filtering() {
    let records = vec![
        HistoricalRecord::new(30.0, 45.0, DurationUnit::Minutes),
        HistoricalRecord::new(30.0, 330.0, DurationUnit::Minutes),
        HistoricalRecord::new(30.0, 15.0, DurationUnit::Minutes),
    ];
    let report = AccuracyReport::from_history(&records, &CorrectionConfig::default());
    assert_eq!(report.sample_count, 2);
    assert_eq!(report.skipped_outliers, 1);
    assert_eq!(report.corrective_factor, 1.0);
    assert_eq!(report.bias_description(), "Accurate estimates");
}
