//! SQLite-backed history store.
//!
//! Provides persistent storage for:
//! - Completed-task timing records, per user
//! - Most-recent-first windowed reads for the correction engine

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::warn;

use crate::error::{DatabaseError, Result, StoreError};
use crate::history::{DurationUnit, HistoricalRecord, HistoryStore};

/// SQLite database holding every user's completion history.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path`.
    ///
    /// Creates the schema if it doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database (tests and throwaway sessions).
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::result::Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("history database lock poisoned".to_string()))
    }

    /// Total number of records stored for `user_id`.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn count_records(&self, user_id: &str) -> std::result::Result<u64, StoreError> {
        let conn = self.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM task_history WHERE user_id = ?1",
            params![user_id],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(count)
    }

    fn fetch_blocking(
        &self,
        user_id: &str,
        max_count: usize,
    ) -> std::result::Result<Vec<HistoricalRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, estimated_duration, actual_duration, unit, completed_at
             FROM task_history
             WHERE user_id = ?1
             ORDER BY completed_at DESC, id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(max_count).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, estimated, actual, unit, completed_at) = row?;
            match decode_record(estimated, actual, &unit, &completed_at) {
                Ok(record) => records.push(record),
                Err(message) => warn!(id, user_id, %message, "Skipping undecodable history row"),
            }
        }
        Ok(records)
    }

    fn append_blocking(&self, user_id: &str, record: &HistoricalRecord) -> std::result::Result<(), StoreError> {
        let completed_at = record.completed_at.unwrap_or_else(Utc::now);
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO task_history (user_id, estimated_duration, actual_duration, unit, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user_id,
                record.estimated_duration,
                record.actual_duration,
                record.unit.as_str(),
                completed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        Ok(())
    }
}

fn decode_record(
    estimated: f64,
    actual: f64,
    unit: &str,
    completed_at: &str,
) -> std::result::Result<HistoricalRecord, String> {
    let unit: DurationUnit = unit.parse().map_err(|e: crate::error::ValidationError| e.to_string())?;
    let completed_at = DateTime::parse_from_rfc3339(completed_at)
        .map_err(|e| format!("bad completed_at '{completed_at}': {e}"))?
        .with_timezone(&Utc);
    Ok(HistoricalRecord::new(estimated, actual, unit).with_completed_at(completed_at))
}

fn migrate(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS task_history (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             TEXT NOT NULL,
            estimated_duration  REAL NOT NULL,
            actual_duration     REAL NOT NULL,
            unit                TEXT NOT NULL DEFAULT 'minutes',
            completed_at        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_task_history_user_completed
            ON task_history(user_id, completed_at);",
    )
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn fetch_recent_history(
        &self,
        user_id: &str,
        max_count: usize,
    ) -> std::result::Result<Vec<HistoricalRecord>, StoreError> {
        self.fetch_blocking(user_id, max_count)
    }

    async fn append_record(&self, user_id: &str, record: &HistoricalRecord) -> std::result::Result<(), StoreError> {
        self.append_blocking(user_id, record)
    }
}
