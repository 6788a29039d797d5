use clap::Subcommand;
use timeblind_core::{AccuracyReport, HistoryStore};

use crate::context::open_engine;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Recent completions, most recent first
    List {
        #[arg(long)]
        user: String,
        /// Maximum records to show (defaults to the configured window)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Estimate accuracy summary
    Report {
        #[arg(long)]
        user: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let window = engine.config().max_history_window;

    match action {
        HistoryAction::List { user, limit } => {
            let records = engine
                .store()
                .fetch_recent_history(&user, limit.unwrap_or(window))
                .await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        HistoryAction::Report { user, json } => {
            let records = engine.store().fetch_recent_history(&user, window).await?;
            let report = AccuracyReport::from_history(&records, engine.config());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render(&user));
            }
        }
    }
    Ok(())
}
