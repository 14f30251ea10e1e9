use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Name of the slot holding the serialized history.
pub const HISTORY_SLOT: &str = "prescription_history";

/// A single named slot of durable storage.
pub trait HistoryStorage: Send + Sync {
    /// Current slot contents, `None` if nothing was ever written.
    fn read(&self) -> Result<Option<String>>;

    fn write(&self, contents: &str) -> Result<()>;
}

/// Stores the slot as `<dir>/<slot>.json`.
pub struct FileStorage {
    cache_dir: PathBuf,
    slot: String,
}

impl FileStorage {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        Self::with_slot(cache_dir, HISTORY_SLOT)
    }

    pub fn with_slot(cache_dir: PathBuf, slot: &str) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir,
            slot: slot.to_string(),
        })
    }

    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(format!("{}.json", self.slot))
    }
}

impl HistoryStorage for FileStorage {
    fn read(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", self.slot))?;
        Ok(Some(contents))
    }

    /// Writes a sibling temp file and renames it over the slot, so a crash
    /// mid-write leaves the previous contents intact.
    fn write(&self, contents: &str) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)
            .with_context(|| format!("Failed to create temp file for: {}", self.slot))?;
        tmp.write_all(contents.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .with_context(|| format!("Failed to write cache file: {}", self.slot))?;
        tmp.persist(self.path())
            .with_context(|| format!("Failed to replace cache file: {}", self.slot))?;
        Ok(())
    }
}

/// In-process slot, for hosts without a writable disk.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing contents, e.g. a previously exported slot.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }
}

impl HistoryStorage for MemoryStorage {
    fn read(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(slot.clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}
