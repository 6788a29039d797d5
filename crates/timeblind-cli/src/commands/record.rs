//! Record completed tasks.

use chrono::{DateTime, Utc};
use clap::Args;
use serde_json::json;
use timeblind_core::DurationUnit;

use crate::context::open_engine;

#[derive(Args)]
pub struct RecordArgs {
    /// User the completion belongs to
    #[arg(long)]
    pub user: String,
    /// Estimated duration
    #[arg(long)]
    pub estimated: f64,
    /// Actual duration
    #[arg(long)]
    pub actual: f64,
    /// Unit of both durations: minutes or seconds
    #[arg(long, default_value = "minutes")]
    pub unit: DurationUnit,
    /// Completion time (RFC 3339); defaults to now
    #[arg(long)]
    pub completed_at: Option<DateTime<Utc>>,
}

pub async fn run(args: RecordArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let report = engine
        .complete_task(&args.user, args.estimated, args.actual, args.unit, args.completed_at)
        .await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "outcome": report.outcome,
            "multiplier": report.multiplier,
        }))?
    );

    match report.persistence_error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
