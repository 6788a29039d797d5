use std::sync::Arc;

use async_trait::async_trait;

use super::HistoricalRecord;
use crate::error::StoreError;

/// Durable, per-user collection of completed-task records.
///
/// This is the only I/O seam of the correction engine. Implementations own
/// their timeout and retry policy; the engine treats every read failure as
/// "no personalization available" and reports write failures to its caller.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Up to `max_count` records for `user_id`, most recent first.
    async fn fetch_recent_history(
        &self,
        user_id: &str,
        max_count: usize,
    ) -> Result<Vec<HistoricalRecord>, StoreError>;

    /// Append a completed record for `user_id`.
    async fn append_record(&self, user_id: &str, record: &HistoricalRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: HistoryStore + ?Sized> HistoryStore for Arc<T> {
    async fn fetch_recent_history(
        &self,
        user_id: &str,
        max_count: usize,
    ) -> Result<Vec<HistoricalRecord>, StoreError> {
        (**self).fetch_recent_history(user_id, max_count).await
    }

    async fn append_record(&self, user_id: &str, record: &HistoricalRecord) -> Result<(), StoreError> {
        (**self).append_record(user_id, record).await
    }
}
