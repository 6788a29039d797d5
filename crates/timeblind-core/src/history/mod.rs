//! Completed-task history: records, units, and the store contract the
//! correction engine reads from and appends to.

mod memory;
mod record;
mod store;

pub use memory::MemoryHistoryStore;
pub use record::{sort_most_recent_first, DurationUnit, HistoricalRecord};
pub use store::HistoryStore;
