//! No-op store. Disables persistence entirely.

use strata_core::error::StoreError;
use strata_core::store::IndexStore;

/// A no-op store that keeps nothing. Trees backed by it start root-only on
/// every run.
pub struct NoopStore;

impl IndexStore for NoopStore {
    fn name(&self) -> &str { "none" }

    fn get(&self, _key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: serde_json::Value) -> Result<(), StoreError> {
        Ok(())
    }

    fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn entries(&self) -> Result<Vec<(String, serde_json::Value)>, StoreError> {
        Ok(Vec::new())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
