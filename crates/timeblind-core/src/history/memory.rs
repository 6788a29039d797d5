//! Process-local history store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{sort_most_recent_first, HistoricalRecord, HistoryStore};
use crate::error::StoreError;

/// In-memory [`HistoryStore`] keyed by user id.
///
/// Intended for tests and for sessions that have no durable backend. Each
/// instance is independent; inject it where it is needed.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Mutex<HashMap<String, Vec<HistoricalRecord>>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held for `user_id`.
    pub fn record_count(&self, user_id: &str) -> usize {
        self.lock()
            .map(|records| records.get(user_id).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<HistoricalRecord>>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn fetch_recent_history(
        &self,
        user_id: &str,
        max_count: usize,
    ) -> Result<Vec<HistoricalRecord>, StoreError> {
        let records = self.lock()?;
        // Reverse append order, then stable sort by completed_at.
        let mut recent: Vec<HistoricalRecord> = records
            .get(user_id)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default();
        sort_most_recent_first(&mut recent);
        recent.truncate(max_count);
        Ok(recent)
    }

    async fn append_record(&self, user_id: &str, record: &HistoricalRecord) -> Result<(), StoreError> {
        self.lock()?
            .entry(user_id.to_string())
            .or_default()
            .push(record.clone());
        Ok(())
    }
}
