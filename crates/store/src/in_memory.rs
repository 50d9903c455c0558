//! In-memory backend, useful for testing and ephemeral sessions.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use strata_core::error::StoreError;
use strata_core::store::IndexStore;

/// An in-memory store that keeps values in a HashMap.
/// Useful for testing and sessions where persistence isn't needed.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for InMemoryStore {
    fn name(&self) -> &str { "memory" }

    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(key).is_some())
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
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_and_get() {
        let store = InMemoryStore::new();
        store.set("tree", json!({"id": "root", "children": []})).unwrap();

        let value = store.get("tree").unwrap();
        assert_eq!(value.unwrap()["id"], "root");
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn clones_share_entries() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.set("k", json!(1)).unwrap();
        assert!(other.has("k").unwrap());
    }

    #[test]
    fn delete_entry() {
        let store = InMemoryStore::new();
        store.set("k", json!("v")).unwrap();
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn clear_all() {
        let store = InMemoryStore::new();
        store.set("a", json!(1)).unwrap();
        store.set("b", json!(2)).unwrap();
        assert_eq!(store.entries().unwrap().len(), 2);

        store.clear().unwrap();
        assert_eq!(store.len().unwrap(), 0);
    }
}
