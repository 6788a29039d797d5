mod config;
pub mod database;

pub use config::{Config, StorageConfig};
pub use database::SqliteHistoryStore;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the Timeblind data directory, creating it if needed.
///
/// `TIMEBLIND_HOME` wins when set. Otherwise `~/.config/timeblind/`, or
/// `~/.config/timeblind-dev/` when `TIMEBLIND_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("TIMEBLIND_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TIMEBLIND_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("timeblind-dev")
            } else {
                base_dir.join("timeblind")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
