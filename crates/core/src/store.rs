//! IndexStore trait: the key/value persistence seam.
//!
//! The context tree persists its whole graph under one key; the layer
//! registry persists each non-built-in layer under its id. Both only need
//! get/set over JSON values, so any map-like backend works.
//!
//! All calls are synchronous. Implementations use interior mutability so a
//! store can be shared as `Arc<dyn IndexStore>`.

use crate::error::StoreError;

/// The core IndexStore trait.
///
/// Implementations: JSON file, in-memory (for testing), none (no-op).
pub trait IndexStore: Send + Sync {
    /// The backend name (e.g., "file", "memory", "none").
    fn name(&self) -> &str;

    /// Read the value under `key`.
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError>;

    /// Remove `key`. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Every stored entry, in no particular order.
    fn entries(&self) -> Result<Vec<(String, serde_json::Value)>, StoreError>;

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries()?.len())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry.
    fn clear(&self) -> Result<(), StoreError>;
}
