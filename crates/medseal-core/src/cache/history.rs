use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::HistoryStorage;
use crate::models::HistoryEntry;

/// Maximum number of entries kept in history.
pub const HISTORY_CAPACITY: usize = 10;

/// Where a repeat access of an already cached id lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecencyPolicy {
    /// Replace the entry and move it to the front (least-recently-used eviction).
    #[default]
    MoveToFront,
    /// Replace the entry where it stands; only new ids enter at the front.
    InPlace,
}

/// Bounded, deduplicated access history, most recent first.
///
/// Upserts are serialized through a single lock which is also held while
/// persisting, so the capacity and uniqueness invariants hold under
/// concurrent callers and the stored slot always reflects the last upsert.
/// Storage writes run on the blocking thread pool, never on a runtime worker.
pub struct HistoryCache {
    storage: Arc<dyn HistoryStorage>,
    entries: Mutex<Vec<HistoryEntry>>,
    policy: RecencyPolicy,
}

impl HistoryCache {
    /// Load history from storage. Never fails: a missing, unreadable or
    /// corrupt slot starts an empty history.
    pub fn load(storage: Arc<dyn HistoryStorage>) -> Self {
        Self::load_with_policy(storage, RecencyPolicy::default())
    }

    pub fn load_with_policy(storage: Arc<dyn HistoryStorage>, policy: RecencyPolicy) -> Self {
        let entries = match read_entries(storage.as_ref()) {
            Ok(entries) => {
                debug!(count = entries.len(), "Loaded prescription history");
                entries
            }
            Err(e) => {
                warn!(error = %e, "Failed to load prescription history, starting empty");
                Vec::new()
            }
        };

        Self {
            storage,
            entries: Mutex::new(entries),
            policy,
        }
    }

    pub fn policy(&self) -> RecencyPolicy {
        self.policy
    }

    /// Insert or replace `entry` by id, evict down to capacity, then persist.
    pub async fn upsert(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock().await;

        let id = entry.id.clone();
        let evicted = apply_upsert(&mut entries, entry, self.policy);
        for old in &evicted {
            debug!(id = %old.id, "Evicted prescription from history");
        }

        if let Err(e) = write_entries(Arc::clone(&self.storage), &entries).await {
            warn!(id = %id, error = %e, "Failed to persist prescription history");
        }
    }

    /// Snapshot of the history, most recent first.
    pub async fn list(&self) -> Vec<HistoryEntry> {
        self.entries.lock().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<HistoryEntry> {
        self.entries.lock().await.iter().find(|e| e.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

fn read_entries(storage: &dyn HistoryStorage) -> Result<Vec<HistoryEntry>> {
    let Some(contents) = storage.read()? else {
        return Ok(Vec::new());
    };

    let mut entries: Vec<HistoryEntry> =
        serde_json::from_str(&contents).context("Failed to parse prescription history")?;

    // Hand-edited or older slots may break the invariants; keep the first
    // (most recent) occurrence of each id and at most HISTORY_CAPACITY.
    let mut seen = std::collections::HashSet::new();
    entries.retain(|e| seen.insert(e.id.clone()));
    entries.truncate(HISTORY_CAPACITY);
    Ok(entries)
}

async fn write_entries(storage: Arc<dyn HistoryStorage>, entries: &[HistoryEntry]) -> Result<()> {
    let contents = serde_json::to_string(entries)?;
    tokio::task::spawn_blocking(move || storage.write(&contents))
        .await
        .context("History write task failed")?
}

/// Apply one upsert to a most-recent-first list. Returns evicted entries.
fn apply_upsert(
    entries: &mut Vec<HistoryEntry>,
    entry: HistoryEntry,
    policy: RecencyPolicy,
) -> Vec<HistoryEntry> {
    match entries.iter().position(|e| e.id == entry.id) {
        Some(index) => match policy {
            RecencyPolicy::MoveToFront => {
                entries.remove(index);
                entries.insert(0, entry);
            }
            RecencyPolicy::InPlace => entries[index] = entry,
        },
        None => entries.insert(0, entry),
    }

    if entries.len() > HISTORY_CAPACITY {
        entries.split_off(HISTORY_CAPACITY)
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileStorage, MemoryStorage};
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            code: "CODE".to_string(),
            patient_name: "Jane Doe".to_string(),
            created_at: Utc::now(),
            accessed_at: Utc::now(),
            medicines_count: 0,
            doctor_notes: String::new(),
            medicines: Vec::new(),
        }
    }

    fn ids(entries: &[HistoryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    struct FailingStorage;

    impl HistoryStorage for FailingStorage {
        fn read(&self) -> Result<Option<String>> {
            Err(anyhow::anyhow!("disk unavailable"))
        }

        fn write(&self, _contents: &str) -> Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    #[tokio::test]
    async fn test_upsert_new_entries_are_newest_first() {
        let cache = HistoryCache::load(Arc::new(MemoryStorage::new()));
        cache.upsert(entry("a")).await;
        cache.upsert(entry("b")).await;
        cache.upsert(entry("c")).await;

        assert_eq!(ids(&cache.list().await), vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_eleventh_entry_evicts_oldest() {
        let cache = HistoryCache::load(Arc::new(MemoryStorage::new()));
        for i in 1..=11 {
            cache.upsert(entry(&format!("e{}", i))).await;
        }

        let list = cache.list().await;
        assert_eq!(list.len(), HISTORY_CAPACITY);
        assert_eq!(list[0].id, "e11");
        assert!(!list.iter().any(|e| e.id == "e1"));
        assert!(list.iter().any(|e| e.id == "e2"));
    }

    #[tokio::test]
    async fn test_repeat_upsert_moves_to_front() {
        let cache = HistoryCache::load(Arc::new(MemoryStorage::new()));
        cache.upsert(entry("a")).await;
        cache.upsert(entry("b")).await;

        let mut updated = entry("a");
        updated.medicines_count = 3;
        cache.upsert(updated).await;

        let list = cache.list().await;
        assert_eq!(ids(&list), vec!["a", "b"]);
        assert_eq!(list[0].medicines_count, 3);
    }

    #[tokio::test]
    async fn test_freshened_entry_survives_eviction() {
        let cache = HistoryCache::load(Arc::new(MemoryStorage::new()));
        for i in 1..=10 {
            cache.upsert(entry(&format!("e{}", i))).await;
        }
        // e1 is the oldest until it is accessed again
        cache.upsert(entry("e1")).await;
        cache.upsert(entry("e11")).await;

        let list = cache.list().await;
        assert_eq!(list.len(), HISTORY_CAPACITY);
        assert!(list.iter().any(|e| e.id == "e1"));
        assert!(!list.iter().any(|e| e.id == "e2"));
    }

    #[tokio::test]
    async fn test_in_place_policy_keeps_position() {
        let cache = HistoryCache::load_with_policy(Arc::new(MemoryStorage::new()), RecencyPolicy::InPlace);
        cache.upsert(entry("a")).await;
        cache.upsert(entry("b")).await;

        let mut updated = entry("a");
        updated.doctor_notes = "revised".to_string();
        cache.upsert(updated).await;

        let list = cache.list().await;
        assert_eq!(ids(&list), vec!["b", "a"]);
        assert_eq!(list[1].doctor_notes, "revised");
        assert_eq!(cache.policy(), RecencyPolicy::InPlace);
    }

    #[tokio::test]
    async fn test_upsert_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let storage: Arc<dyn HistoryStorage> = Arc::new(FileStorage::new(dir.path().to_path_buf()).unwrap());

        let cache = HistoryCache::load(Arc::clone(&storage));
        cache.upsert(entry("a")).await;
        cache.upsert(entry("b")).await;

        let reloaded = HistoryCache::load(storage);
        assert_eq!(ids(&reloaded.list().await), vec!["b", "a"]);
        assert_eq!(reloaded.get("a").await.map(|e| e.id), Some("a".to_string()));
        assert!(reloaded.get("zzz").await.is_none());
    }

    /// Records which thread performed each write.
    #[derive(Default)]
    struct ThreadRecordingStorage {
        writers: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl HistoryStorage for ThreadRecordingStorage {
        fn read(&self) -> Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _contents: &str) -> Result<()> {
            self.writers.lock().unwrap().push(std::thread::current().id());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_storage_write_runs_off_the_runtime_thread() {
        let storage = Arc::new(ThreadRecordingStorage::default());
        let cache = HistoryCache::load(storage.clone());

        cache.upsert(entry("a")).await;
        cache.upsert(entry("b")).await;

        // The default test runtime is single-threaded, so this is its only worker
        let runtime_thread = std::thread::current().id();
        let writers = storage.writers.lock().unwrap().clone();
        assert_eq!(writers.len(), 2);
        assert!(writers.iter().all(|t| *t != runtime_thread));
    }

    #[tokio::test]
    async fn test_corrupt_storage_loads_empty() {
        let cache = HistoryCache::load(Arc::new(MemoryStorage::with_contents("{not json")));
        assert!(cache.is_empty().await);

        // Still usable afterwards
        cache.upsert(entry("a")).await;
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_storage_failures_are_absorbed() {
        let cache = HistoryCache::load(Arc::new(FailingStorage));
        assert!(cache.is_empty().await);

        cache.upsert(entry("a")).await;
        assert_eq!(ids(&cache.list().await), vec!["a"]);
    }

    #[tokio::test]
    async fn test_load_repairs_duplicates_and_overflow() {
        let mut stored: Vec<HistoryEntry> = (0..12).map(|i| entry(&format!("e{}", i))).collect();
        stored.insert(1, entry("e0"));
        let json = serde_json::to_string(&stored).unwrap();

        let cache = HistoryCache::load(Arc::new(MemoryStorage::with_contents(json)));
        let list = cache.list().await;
        assert_eq!(list.len(), HISTORY_CAPACITY);
        assert_eq!(list.iter().filter(|e| e.id == "e0").count(), 1);
        assert_eq!(list[0].id, "e0");
        assert_eq!(list[1].id, "e1");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_keep_invariants() {
        let cache = Arc::new(HistoryCache::load(Arc::new(MemoryStorage::new())));

        let handles: Vec<_> = (0..40)
            .map(|i| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.upsert(entry(&format!("e{}", i % 15))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let list = cache.list().await;
        assert_eq!(list.len(), HISTORY_CAPACITY);
        let mut unique = ids(&list);
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_apply_upsert_returns_evicted() {
        let mut entries: Vec<HistoryEntry> = (0..HISTORY_CAPACITY).map(|i| entry(&i.to_string())).collect();
        let evicted = apply_upsert(&mut entries, entry("new"), RecencyPolicy::MoveToFront);

        assert_eq!(ids(&evicted), vec!["9"]);
        assert_eq!(entries.len(), HISTORY_CAPACITY);
        assert_eq!(entries[0].id, "new");
    }
}
