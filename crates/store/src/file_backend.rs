//! File-based store, one JSON document per store.
//!
//! The whole key space is a single JSON object, e.g. `tree.json` holds
//! `{"tree": {"id": ..., "children": [...]}}` and `layers.json` holds one
//! entry per layer id. Human-inspectable and dependency-free.
//!
//! Storage location: `~/.strata/data/<file>.json`

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::store::IndexStore;
use tracing::{debug, warn};

/// A file-backed store keeping all entries in one JSON object.
///
/// Entries are loaded into memory on creation and flushed to disk on every
/// mutation (set, delete, clear). This gives fast reads with durable writes.
/// Flushes write a sibling temp file and rename it over the target, so a
/// crash mid-write never leaves a truncated document behind. A mutation whose
/// flush fails is undone in memory before the error is returned.
pub struct FileStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, serde_json::Value>>>,
}

impl FileStore {
    /// Open a file store at the given path.
    ///
    /// If the file exists, entries are loaded from it.
    /// If the file does not exist, starts empty (file created on first write).
    pub fn new(path: PathBuf) -> Self {
        let entries = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = entries.len(), "File store loaded");
        Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load entries from a JSON object file.
    fn load_from_disk(path: &Path) -> BTreeMap<String, serde_json::Value> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(), // File doesn't exist yet, start empty
        };

        if content.trim().is_empty() {
            return BTreeMap::new();
        }

        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable store file");
                BTreeMap::new()
            }
        }
    }

    /// Flush all entries to disk.
    fn flush(&self, entries: &BTreeMap<String, serde_json::Value>) -> Result<(), StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Storage(format!("Failed to create store directory: {e}"))
                })?;
            }
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize store: {e}")))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &content)
            .map_err(|e| StoreError::Storage(format!("Failed to write store file: {e}")))?;
        std::fs::rename(&tmp_path, &self.path)
            .map_err(|e| StoreError::Storage(format!("Failed to replace store file: {e}")))?;

        Ok(())
    }
}

impl IndexStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.flush(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write();
        let Some(removed) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.flush(&entries) {
            entries.insert(key.to_string(), removed);
            return Err(e);
        }
        Ok(true)
    }

    fn entries(&self) -> Result<Vec<(String, serde_json::Value)>, StoreError> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.read().len())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        let previous = std::mem::take(&mut *entries);
        if let Err(e) = self.flush(&entries) {
            *entries = previous;
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn set_and_get_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");

        let store = FileStore::new(path.clone());
        store.set("tree", json!({"id": "root", "children": []})).unwrap();

        // Verify file was written
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"tree\""));

        // Reopen, should find the entry
        let reopened = FileStore::new(path);
        let value = reopened.get("tree").unwrap().unwrap();
        assert_eq!(value["id"], "root");
    }

    #[test]
    fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data").join("layers.json");

        let store = FileStore::new(path.clone());
        store.set("abc", json!({"name": "alpha"})).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn delete_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.json");

        let store = FileStore::new(path.clone());
        store.set("abc", json!({"name": "alpha"})).unwrap();
        assert!(store.delete("abc").unwrap());

        // Reopen, should be gone
        let reopened = FileStore::new(path);
        assert!(reopened.get("abc").unwrap().is_none());
        assert_eq!(reopened.len().unwrap(), 0);
    }

    #[test]
    fn clear_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.json");

        let store = FileStore::new(path.clone());
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        store.clear().unwrap();

        let reopened = FileStore::new(path);
        assert!(reopened.is_empty().unwrap());
    }

    #[test]
    fn failed_flush_rolls_back_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layers.json");
        let store = FileStore::new(path.clone());
        store.set("kept", json!(1)).unwrap();

        // A directory squatting on the temp path makes every flush fail.
        let blocker = path.with_extension("json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        assert!(store.set("orphan", json!(2)).is_err());
        assert!(store.get("orphan").unwrap().is_none());
        assert!(store.set("kept", json!(3)).is_err());
        assert_eq!(store.get("kept").unwrap(), Some(json!(1)));
        assert!(store.delete("kept").is_err());
        assert!(store.has("kept").unwrap());
        assert!(store.clear().is_err());
        assert_eq!(store.len().unwrap(), 1);

        // The next successful flush must not carry the failed write.
        std::fs::remove_dir(&blocker).unwrap();
        store.set("later", json!(4)).unwrap();
        let reopened = FileStore::new(path);
        assert!(reopened.get("orphan").unwrap().is_none());
        assert_eq!(reopened.get("kept").unwrap(), Some(json!(1)));
        assert_eq!(reopened.len().unwrap(), 2);
    }

    #[test]
    fn handles_missing_file_gracefully() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("nonexistent.json"));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn handles_corrupted_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "this is not json").unwrap();

        let store = FileStore::new(tmp.path().to_path_buf());
        assert!(store.is_empty().unwrap());

        // The store is still writable afterwards
        store.set("k", json!("v")).unwrap();
        assert!(store.has("k").unwrap());
    }
}
