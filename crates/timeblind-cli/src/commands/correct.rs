//! Multiplier lookup and batch correction commands.

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use timeblind_core::{correct_batch, CorrectedTaskEstimate, MultiplierEstimate, NewTaskEstimate};

use crate::context::open_engine;

#[derive(Args)]
pub struct MultiplierArgs {
    /// User whose history to use
    #[arg(long)]
    pub user: String,
}

#[derive(Args)]
pub struct CorrectArgs {
    /// Resolve the multiplier from this user's history
    #[arg(long, conflicts_with = "multiplier", required_unless_present = "multiplier")]
    pub user: Option<String>,
    /// Use a fixed multiplier instead of history
    #[arg(long)]
    pub multiplier: Option<f64>,
    /// JSON file with an array of {"title", "estimate", ...}; stdin if omitted
    #[arg(long)]
    pub input: Option<PathBuf>,
}

#[derive(Serialize)]
struct CorrectionOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    estimate: Option<MultiplierEstimate>,
    tasks: Vec<CorrectedTaskEstimate>,
}

pub async fn run_multiplier(args: MultiplierArgs) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let estimate = engine.multiplier_for(&args.user).await;
    println!("{}", serde_json::to_string_pretty(&estimate)?);
    Ok(())
}

pub async fn run_correct(args: CorrectArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tasks = read_tasks(args.input.as_ref())?;

    let output = match (args.user, args.multiplier) {
        (Some(user), _) => {
            let engine = open_engine()?;
            let (estimate, tasks) = engine.correct_for_user(&user, tasks).await;
            CorrectionOutput {
                estimate: Some(estimate),
                tasks,
            }
        }
        (None, Some(multiplier)) => CorrectionOutput {
            estimate: None,
            tasks: correct_batch(tasks, multiplier),
        },
        (None, None) => return Err("either --user or --multiplier is required".into()),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn read_tasks(input: Option<&PathBuf>) -> Result<Vec<NewTaskEstimate>, Box<dyn std::error::Error>> {
    let content = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(serde_json::from_str(&content)?)
}
