//! Shared setup for commands that touch history.

use timeblind_core::{Config, CorrectionEngine, SqliteHistoryStore};
use tracing::debug;

/// Load config and open the SQLite-backed engine it points at.
pub fn open_engine() -> Result<CorrectionEngine<SqliteHistoryStore>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db_path = config.database_path()?;
    debug!(path = %db_path.display(), "opening history database");
    let store = SqliteHistoryStore::open_at(&db_path)?;
    Ok(CorrectionEngine::new(store, config.correction)?)
}
