use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod context;

#[derive(Parser)]
#[command(name = "timeblind", version, about = "Personal task-estimate correction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current correction multiplier for a user
    Multiplier(commands::correct::MultiplierArgs),
    /// Correct a batch of task estimates (JSON array from a file or stdin)
    Correct(commands::correct::CorrectArgs),
    /// Record a completed task
    Record(commands::record::RecordArgs),
    /// Completion history
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("timeblind=warn,timeblind_core=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Multiplier(args) => commands::correct::run_multiplier(args).await,
        Commands::Correct(args) => commands::correct::run_correct(args).await,
        Commands::Record(args) => commands::record::run(args).await,
        Commands::History { action } => commands::history::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
