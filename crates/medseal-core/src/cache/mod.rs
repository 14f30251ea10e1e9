//! Local access history for offline display.
//!
//! This module provides the `HistoryCache`, a bounded, deduplicated,
//! most-recent-first list of `HistoryEntry` snapshots. It is persisted
//! through a `HistoryStorage` slot as a JSON array on every upsert.
//!
//! Storage faults never reach callers: unreadable or corrupt history
//! loads as empty, and failed writes are logged and dropped.

pub mod history;
pub mod storage;

pub use history::{HistoryCache, RecencyPolicy, HISTORY_CAPACITY};
pub use storage::{FileStorage, HistoryStorage, MemoryStorage, HISTORY_SLOT};
