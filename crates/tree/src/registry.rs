//! Layer registry: the catalog of every layer, indexed by id and by name.
//!
//! The registry is the only authority on layer identity and name
//! uniqueness. Built-in layers are seeded in memory on every construction;
//! every other layer is persisted in the backing store under its id. The
//! name index is never persisted: it is rebuilt from the id-keyed entries.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use strata_core::{
    validate_layer_name, IndexStore, Layer, LayerError, LayerId, LayerPatch, LayerSpec, Result,
};
use tracing::{debug, info, warn};

use crate::builtin::{builtin_layers, ROOT_LAYER_NAME};

/// Both lookup maps in one place. Every mutation goes through a method that
/// updates the two maps together, so a name can never point at a missing
/// layer and a layer can never be reachable under two names.
#[derive(Debug, Default)]
struct LayerIndex {
    by_id: HashMap<LayerId, Layer>,
    by_name: HashMap<String, LayerId>,
}

impl LayerIndex {
    fn get(&self, id: &str) -> Option<&Layer> {
        self.by_id.get(id)
    }

    fn get_by_name(&self, name: &str) -> Option<&Layer> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    // Name changes must go through `rename`.
    fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.by_id.get_mut(id)
    }

    fn insert(&mut self, layer: Layer) -> std::result::Result<(), LayerError> {
        if self.by_name.contains_key(&layer.name) {
            return Err(LayerError::Conflict(layer.name));
        }
        if self.by_id.contains_key(&layer.id) {
            return Err(LayerError::Conflict(layer.id.to_string()));
        }
        self.by_name.insert(layer.name.clone(), layer.id.clone());
        self.by_id.insert(layer.id.clone(), layer);
        Ok(())
    }

    fn rename(&mut self, id: &str, new_name: &str) -> std::result::Result<(), LayerError> {
        if self.by_name.contains_key(new_name) {
            return Err(LayerError::Conflict(new_name.to_string()));
        }
        let layer = self
            .by_id
            .get_mut(id)
            .ok_or_else(|| LayerError::NotFound(id.to_string()))?;
        let old_name = std::mem::replace(&mut layer.name, new_name.to_string());
        layer.touch();
        self.by_name.remove(&old_name);
        self.by_name.insert(new_name.to_string(), layer.id.clone());
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Option<Layer> {
        let layer = self.by_id.remove(id)?;
        self.by_name.remove(&layer.name);
        Some(layer)
    }

    fn len(&self) -> usize {
        self.by_id.len()
    }

    fn values(&self) -> impl Iterator<Item = &Layer> {
        self.by_id.values()
    }
}

/// The layer catalog.
pub struct LayerRegistry {
    store: Arc<dyn IndexStore>,
    index: LayerIndex,
    builtin_ids: HashSet<LayerId>,
    builtin_names: HashSet<String>,
}

impl LayerRegistry {
    /// Open a registry over `store`, seeding the default built-ins.
    pub fn new(store: Arc<dyn IndexStore>) -> Result<Self> {
        Self::with_builtins(store, builtin_layers())
    }

    /// Open a registry over `store` with a custom built-in table.
    pub fn with_builtins(store: Arc<dyn IndexStore>, builtins: Vec<LayerSpec>) -> Result<Self> {
        let mut registry = Self {
            store,
            index: LayerIndex::default(),
            builtin_ids: HashSet::new(),
            builtin_names: HashSet::new(),
        };
        registry.seed_builtins(builtins)?;
        registry.load_persisted()?;
        info!(
            backend = registry.store.name(),
            count = registry.len(),
            "Layer registry initialized"
        );
        Ok(registry)
    }

    fn seed_builtins(&mut self, builtins: Vec<LayerSpec>) -> Result<()> {
        for spec in builtins {
            let layer = Layer::from_spec(spec);
            self.builtin_ids.insert(layer.id.clone());
            self.builtin_names.insert(layer.name.clone());
            debug!(id = %layer.id, name = %layer.name, "Seeding built-in layer");
            self.index.insert(layer)?;
        }
        Ok(())
    }

    fn load_persisted(&mut self) -> Result<()> {
        for (key, value) in self.store.entries()? {
            let layer: Layer = match serde_json::from_value(value) {
                Ok(layer) => layer,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping corrupted layer entry");
                    continue;
                }
            };
            if self.builtin_ids.contains(&layer.id) || self.builtin_names.contains(&layer.name) {
                debug!(id = %layer.id, "Ignoring persisted copy of a built-in layer");
                continue;
            }
            let (id, name) = (layer.id.clone(), layer.name.clone());
            if let Err(e) = self.index.insert(layer) {
                warn!(id = %id, name = %name, error = %e, "Skipping colliding layer entry");
            }
        }
        Ok(())
    }

    fn persist(&self, layer: &Layer) -> Result<()> {
        if self.is_internal_id(layer.id.as_str()) {
            return Ok(());
        }
        self.store.set(layer.id.as_str(), serde_json::to_value(layer)?)?;
        Ok(())
    }

    /// Register a new layer. Fails with `Conflict` if the name is taken.
    pub fn create_layer(&mut self, spec: LayerSpec) -> Result<Layer> {
        debug!(name = %spec.name, "Creating layer");
        if self.has_layer_name(&spec.name) {
            return Err(LayerError::Conflict(spec.name).into());
        }
        validate_layer_name(&spec.name)?;
        if spec.layer_type.is_some_and(|t| t.is_reserved()) {
            return Err(LayerError::Reserved(spec.name).into());
        }

        let layer = Layer::from_spec(spec);
        self.index.insert(layer.clone())?;
        if let Err(e) = self.persist(&layer) {
            self.index.remove(layer.id.as_str());
            return Err(e);
        }
        info!(id = %layer.id, name = %layer.name, "Layer created");
        Ok(layer)
    }

    pub fn get_layer_by_id(&self, id: &str) -> Option<&Layer> {
        self.index.get(id)
    }

    pub fn get_layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.index.get_by_name(name)
    }

    pub fn has_layer_id(&self, id: &str) -> bool {
        self.index.get(id).is_some()
    }

    pub fn has_layer_name(&self, name: &str) -> bool {
        self.index.by_name.contains_key(name)
    }

    pub fn name_to_id(&self, name: &str) -> Option<&LayerId> {
        self.index.by_name.get(name)
    }

    pub fn id_to_name(&self, id: &str) -> Option<&str> {
        self.index.get(id).map(|l| l.name.as_str())
    }

    /// The root layer, if the built-in table had one.
    pub fn root_layer(&self) -> Option<&Layer> {
        self.get_layer_by_name(ROOT_LAYER_NAME)
    }

    /// All layers, sorted by name.
    pub fn list(&self) -> Vec<&Layer> {
        let mut layers: Vec<&Layer> = self.index.values().collect();
        layers.sort_by(|a, b| a.name.cmp(&b.name));
        layers
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.len() == 0
    }

    /// Whether `name_or_id` names a built-in layer.
    pub fn is_internal(&self, name_or_id: &str) -> bool {
        self.is_internal_name(name_or_id) || self.is_internal_id(name_or_id)
    }

    pub fn is_internal_name(&self, name: &str) -> bool {
        self.builtin_names.contains(name)
    }

    pub fn is_internal_id(&self, id: &str) -> bool {
        self.builtin_ids.contains(id)
    }

    fn unlocked_id(&self, name: &str) -> Result<LayerId> {
        let layer = self
            .get_layer_by_name(name)
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        if layer.locked {
            return Err(LayerError::Locked(name.to_string()).into());
        }
        Ok(layer.id.clone())
    }

    /// Merge `patch` into the layer named `name`.
    pub fn update_layer(&mut self, name: &str, patch: LayerPatch) -> Result<Layer> {
        let id = self.unlocked_id(name)?;
        if patch.layer_type.is_some_and(|t| t.is_reserved()) || self.is_internal_id(id.as_str()) {
            return Err(LayerError::Reserved(name.to_string()).into());
        }

        let previous = self.index.get(id.as_str()).cloned();
        let layer = self
            .index
            .get_mut(id.as_str())
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        layer.apply(patch);
        let updated = layer.clone();

        if let Err(e) = self.persist(&updated) {
            if let (Some(prev), Some(slot)) = (previous, self.index.get_mut(id.as_str())) {
                *slot = prev;
            }
            return Err(e);
        }
        debug!(id = %id, name, "Layer updated");
        Ok(updated)
    }

    /// Rename a layer. Both indices change together.
    pub fn rename_layer(&mut self, name: &str, new_name: &str) -> Result<Layer> {
        let id = self.unlocked_id(name)?;
        if self.is_internal_id(id.as_str()) {
            return Err(LayerError::Reserved(name.to_string()).into());
        }
        if name == new_name {
            return self
                .index
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| LayerError::NotFound(name.to_string()).into());
        }
        validate_layer_name(new_name)?;

        self.index.rename(id.as_str(), new_name)?;
        let renamed = self
            .index
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| LayerError::NotFound(new_name.to_string()))?;

        if let Err(e) = self.persist(&renamed) {
            // Swap back so memory matches the store.
            if let Err(restore) = self.index.rename(id.as_str(), name) {
                warn!(
                    id = %id,
                    name = name,
                    error = %restore,
                    "Failed to restore layer name after store error"
                );
            }
            return Err(e);
        }
        info!(id = %id, from = name, to = new_name, "Layer renamed");
        Ok(renamed)
    }

    /// Add `by` as a lock holder on the layer named `name`.
    pub fn lock_layer(&mut self, name: &str, by: &str) -> Result<Layer> {
        let id = self
            .name_to_id(name)
            .cloned()
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        if self.is_internal_id(id.as_str()) {
            return Err(LayerError::Reserved(name.to_string()).into());
        }
        self.change_lock(&id, |layer| layer.lock(by))
    }

    /// Release `by`'s lock on the layer named `name`.
    pub fn unlock_layer(&mut self, name: &str, by: &str) -> Result<Layer> {
        let id = self
            .name_to_id(name)
            .cloned()
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        if self.is_internal_id(id.as_str()) {
            return Err(LayerError::Reserved(name.to_string()).into());
        }
        self.change_lock(&id, |layer| {
            layer.unlock(by);
        })
    }

    fn change_lock(&mut self, id: &LayerId, f: impl FnOnce(&mut Layer)) -> Result<Layer> {
        let layer = self
            .index
            .get_mut(id.as_str())
            .ok_or_else(|| LayerError::NotFound(id.to_string()))?;
        let previous = layer.clone();
        f(layer);
        let changed = layer.clone();
        if let Err(e) = self.persist(&changed) {
            if let Some(slot) = self.index.get_mut(id.as_str()) {
                *slot = previous;
            }
            return Err(e);
        }
        debug!(id = %id, locked = changed.locked, "Layer lock changed");
        Ok(changed)
    }

    pub fn remove_layer(&mut self, layer: &Layer) -> Result<Layer> {
        self.remove_layer_by_id(layer.id.as_str())
    }

    pub fn remove_layer_by_name(&mut self, name: &str) -> Result<Layer> {
        let id = self
            .name_to_id(name)
            .cloned()
            .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
        self.remove_layer_by_id(id.as_str())
    }

    /// Remove a layer from both indices and from the store.
    pub fn remove_layer_by_id(&mut self, id: &str) -> Result<Layer> {
        let layer = self
            .index
            .get(id)
            .ok_or_else(|| LayerError::NotFound(id.to_string()))?;
        if layer.locked {
            return Err(LayerError::Locked(layer.name.clone()).into());
        }
        if self.is_internal_id(id) {
            return Err(LayerError::Reserved(layer.name.clone()).into());
        }

        self.store.delete(id)?;
        let removed = self
            .index
            .remove(id)
            .ok_or_else(|| LayerError::NotFound(id.to_string()))?;
        info!(id = %removed.id, name = %removed.name, "Layer removed");
        Ok(removed)
    }
}

impl std::fmt::Debug for LayerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerRegistry")
            .field("backend", &self.store.name())
            .field("layers", &self.index.len())
            .field("builtins", &self.builtin_ids.len())
            .finish()
    }
}
