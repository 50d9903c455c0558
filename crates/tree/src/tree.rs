//! Context tree: the path-addressable façade over the layer registry.
//!
//! Paths are resolved segment by segment into layer ids through the
//! registry, then walked through the `TreeNode` graph. Every public
//! mutation validates up front, changes the in-memory graph, and ends with
//! exactly one `save()`.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use strata_core::path::{self, ROOT_PATH};
use strata_core::{
    validate_layer_name, Error, IndexStore, Layer, LayerError, LayerId, LayerPatch, LayerSpec,
    LayerType, Result, TreeError,
};
use tracing::{debug, info, warn};

use crate::node::TreeNode;
use crate::registry::LayerRegistry;
use crate::shape::{IndexNode, JsonTreeNode};

/// Store key holding the persisted tree.
pub const TREE_KEY: &str = "tree";

/// Which paths `paths_with` lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathListing {
    /// Paths ending at nodes without children.
    #[default]
    Leaves,
    /// Every node path, the root included.
    All,
}

pub struct ContextTree {
    root: TreeNode,
    layers: LayerRegistry,
    store: Arc<dyn IndexStore>,
    default_layer_type: LayerType,
}

impl ContextTree {
    /// Open a tree persisted in `tree_store`, with its layers in `layer_store`.
    pub fn new(tree_store: Arc<dyn IndexStore>, layer_store: Arc<dyn IndexStore>) -> Result<Self> {
        let layers = LayerRegistry::new(layer_store)?;
        Self::with_registry(tree_store, layers)
    }

    /// Open a tree over an existing registry. The registry must hold a root
    /// layer; anything persisted under [`TREE_KEY`] is loaded.
    pub fn with_registry(store: Arc<dyn IndexStore>, layers: LayerRegistry) -> Result<Self> {
        let root_id = layers.root_layer().ok_or(TreeError::MissingRoot)?.id.clone();
        let mut tree = Self {
            root: TreeNode::new(root_id),
            layers,
            store,
            default_layer_type: LayerType::default(),
        };
        if tree.load()? {
            info!(nodes = tree.node_count(), "Context tree loaded");
        } else {
            debug!("No persisted tree, starting from root");
        }
        Ok(tree)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn default_layer_type(&self) -> LayerType {
        self.default_layer_type
    }

    /// Type given to layers created from path segments.
    pub fn set_default_layer_type(&mut self, layer_type: LayerType) -> Result<()> {
        if layer_type.is_reserved() {
            return Err(LayerError::Reserved(layer_type.to_string()).into());
        }
        self.default_layer_type = layer_type;
        Ok(())
    }

    // ── Path resolution ────────────────────────────────────────────────

    fn check_segments(&self, path: &str, segments: &[&str]) -> Result<()> {
        if let Some(seg) = segments.iter().find(|s| self.layers.is_internal_name(s)) {
            return Err(TreeError::ReservedSegment {
                segment: seg.to_string(),
                path: path.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Resolve every segment to an existing layer id.
    fn resolve_ids(&self, path: &str) -> Result<Vec<LayerId>> {
        let segments = path::segments(path);
        self.check_segments(path, &segments)?;
        segments
            .iter()
            .map(|seg| {
                self.layers.name_to_id(seg).cloned().ok_or_else(|| {
                    Error::from(TreeError::LayerNotFound {
                        segment: seg.to_string(),
                        path: path.to_string(),
                    })
                })
            })
            .collect()
    }

    /// Resolve every segment, creating missing layers when `auto_create` is
    /// set. Nothing is created unless every segment can be resolved.
    fn ensure_layers(&mut self, path: &str, auto_create: bool) -> Result<Vec<LayerId>> {
        let segments = path::segments(path);
        self.check_segments(path, &segments)?;

        let missing: Vec<&str> = segments
            .iter()
            .copied()
            .filter(|seg| !self.layers.has_layer_name(seg))
            .collect();
        if let Some(seg) = missing.first() {
            if !auto_create {
                return Err(TreeError::LayerNotFound {
                    segment: seg.to_string(),
                    path: path.to_string(),
                }
                .into());
            }
            for seg in &missing {
                validate_layer_name(seg)?;
            }
        }

        let mut ids = Vec::with_capacity(segments.len());
        for seg in segments {
            let id = match self.layers.name_to_id(seg) {
                Some(id) => id.clone(),
                None => {
                    let spec = LayerSpec::named(seg).with_type(self.default_layer_type);
                    self.layers.create_layer(spec)?.id
                }
            };
            ids.push(id);
        }
        Ok(ids)
    }

    /// Check that every layer in a node payload is known and not internal.
    fn check_payload(&self, node: &TreeNode, path: &str) -> Result<()> {
        let id = node.id().as_str();
        if self.layers.is_internal_id(id) {
            return Err(TreeError::ReservedSegment {
                segment: id.to_string(),
                path: path.to_string(),
            }
            .into());
        }
        if !self.layers.has_layer_id(id) {
            return Err(TreeError::LayerNotFound {
                segment: id.to_string(),
                path: path.to_string(),
            }
            .into());
        }
        node.children()
            .iter()
            .try_for_each(|child| self.check_payload(child, path))
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// The node at `path`, or `None` if any segment does not resolve.
    pub fn get_node(&self, path: &str) -> Option<&TreeNode> {
        let mut node = &self.root;
        for seg in path::segments(path) {
            if self.layers.is_internal_name(seg) {
                return None;
            }
            let id = self.layers.name_to_id(seg)?;
            node = node.get_child(id.as_str())?;
        }
        Some(node)
    }

    pub fn path_exists(&self, path: &str) -> bool {
        self.get_node(path).is_some()
    }

    /// Layer ids named by `path`, in order. Fails if a segment has no layer.
    pub fn path_to_id_array(&self, path: &str) -> Result<Vec<LayerId>> {
        self.resolve_ids(path)
    }

    /// Leaf paths under the root, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.paths_with(PathListing::Leaves)
    }

    pub fn paths_with(&self, listing: PathListing) -> Vec<String> {
        let mut out = BTreeSet::new();
        let mut prefix = Vec::new();
        self.collect_paths(&self.root, &mut prefix, listing, &mut out);
        out.into_iter().collect()
    }

    fn collect_paths<'a>(
        &'a self,
        node: &'a TreeNode,
        prefix: &mut Vec<&'a str>,
        listing: PathListing,
        out: &mut BTreeSet<String>,
    ) {
        if listing == PathListing::All || !node.has_children() {
            out.insert(path::join(prefix.as_slice()));
        }
        for child in node.children() {
            let name = self
                .layers
                .id_to_name(child.id().as_str())
                .unwrap_or(child.id().as_str());
            prefix.push(name);
            self.collect_paths(child, prefix, listing, out);
            prefix.pop();
        }
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Walk `path`, creating missing nodes (and, with `auto_create`, missing
    /// layers). An optional `node` is attached under the final node unless
    /// a child for the same layer is already there. Returns the ids walked.
    pub fn insert_path(
        &mut self,
        path: &str,
        node: Option<TreeNode>,
        auto_create: bool,
    ) -> Result<Vec<LayerId>> {
        debug!(path, auto_create, "Inserting path");
        if let Some(node) = &node {
            self.check_payload(node, path)?;
        }
        let ids = self.ensure_layers(path, auto_create)?;

        let target = self.root.ensure_descendant(&ids);
        if let Some(node) = node {
            if !target.has_child(node.id().as_str()) {
                target.add_child(node);
            }
        }

        self.save()?;
        Ok(ids)
    }

    /// Resolve `path` to an existing, non-root node. Returns its id chain.
    fn existing_node_ids(&self, path: &str) -> Result<Vec<LayerId>> {
        if path::is_root(path) {
            return Err(TreeError::RootImmutable(ROOT_PATH.to_string()).into());
        }
        let ids = self.resolve_ids(path)?;
        if self.root.descendant(&ids).is_none() {
            return Err(TreeError::PathNotFound(path::normalize(path)).into());
        }
        Ok(ids)
    }

    /// Detach the node at `ids` from its parent.
    fn detach(&mut self, ids: &[LayerId], path: &str) -> Result<(Vec<LayerId>, TreeNode)> {
        let Some((last, parent_ids)) = ids.split_last() else {
            return Err(TreeError::RootImmutable(ROOT_PATH.to_string()).into());
        };
        let node = self
            .root
            .descendant_mut(parent_ids)
            .and_then(|parent| parent.remove_child(last.as_str()))
            .ok_or_else(|| TreeError::PathNotFound(path::normalize(path)))?;
        Ok((parent_ids.to_vec(), node))
    }

    /// Move the layer at `from` under the node at `to`.
    ///
    /// Non-recursive moves relocate only the layer: the moved node's
    /// children stay behind, re-parented to its former parent. Recursive
    /// moves carry the whole subtree and refuse destinations that pass
    /// through the moved layer.
    pub fn move_path(&mut self, from: &str, to: &str, recursive: bool) -> Result<()> {
        debug!(from, to, recursive, "Moving path");
        let from_ids = self.existing_node_ids(from)?;

        let to_segments = path::segments(to);
        self.check_segments(to, &to_segments)?;
        if recursive {
            let moved_name = path::basename(from).unwrap_or_default();
            if to_segments.contains(&moved_name) {
                return Err(TreeError::InvalidCycle {
                    from: path::normalize(from),
                    to: path::normalize(to),
                    layer: moved_name.to_string(),
                }
                .into());
            }
        }
        let to_ids = self.ensure_layers(to, true)?;
        let (parent_ids, mut node) = self.detach(&from_ids, from)?;

        if recursive {
            self.root.ensure_descendant(&to_ids).merge_child(node);
        } else {
            let moved = node.id().clone();
            let parent = self.root.ensure_descendant(&parent_ids);
            for child in node.take_children() {
                parent.merge_child(child);
            }

            // A destination below the moved node now sits one level up.
            let dest_ids = if to_ids.starts_with(&from_ids) {
                let mut ids = parent_ids.clone();
                ids.extend_from_slice(&to_ids[from_ids.len()..]);
                ids
            } else {
                to_ids
            };
            let dest = self.root.ensure_descendant(&dest_ids);
            if !dest.has_child(moved.as_str()) {
                dest.add_child(TreeNode::new(moved));
            }
        }

        self.save()
    }

    /// Copy the layer at `from` under the node at `to`. Recursive copies
    /// clone the whole subtree; otherwise a childless node is attached.
    pub fn copy_path(&mut self, from: &str, to: &str, recursive: bool) -> Result<()> {
        debug!(from, to, recursive, "Copying path");
        let from_ids = self.existing_node_ids(from)?;
        let to_segments = path::segments(to);
        self.check_segments(to, &to_segments)?;

        let copy = match self.root.descendant(&from_ids) {
            Some(node) if recursive => node.clone(),
            Some(node) => TreeNode::new(node.id().clone()),
            None => return Err(TreeError::PathNotFound(path::normalize(from)).into()),
        };

        let to_ids = self.ensure_layers(to, true)?;
        self.root.ensure_descendant(&to_ids).merge_child(copy);
        self.save()
    }

    /// Remove the node at `path`. Without `recursive`, its children are
    /// re-parented to its parent first.
    pub fn remove_path(&mut self, path: &str, recursive: bool) -> Result<()> {
        debug!(path, recursive, "Removing path");
        let ids = self.existing_node_ids(path)?;
        let (parent_ids, mut node) = self.detach(&ids, path)?;

        if !recursive {
            let parent = self.root.ensure_descendant(&parent_ids);
            for child in node.take_children() {
                parent.merge_child(child);
            }
        }
        self.save()
    }

    /// Drop every node under the root. Layers are kept.
    pub fn clear(&mut self) -> Result<()> {
        let removed = self.root.take_children();
        info!(branches = removed.len(), "Context tree cleared");
        self.save()
    }

    // ── Persistence ────────────────────────────────────────────────────

    pub fn save(&self) -> Result<()> {
        let value = serde_json::to_value(self.json_index_tree())?;
        self.store.set(TREE_KEY, value)?;
        Ok(())
    }

    /// Rebuild the graph from the store. Returns false when nothing was
    /// persisted, in which case the tree is left as it is.
    pub fn load(&mut self) -> Result<bool> {
        let Some(value) = self.store.get(TREE_KEY)? else {
            return Ok(false);
        };
        let index: IndexNode = serde_json::from_value(value)
            .map_err(|e| TreeError::CorruptIndex(e.to_string()))?;
        self.import_index(index);
        Ok(true)
    }

    /// Replace the graph with the one described by `index`.
    pub fn import_index(&mut self, index: IndexNode) {
        let root_id = self.root.id().clone();
        if index.id != root_id {
            warn!(expected = %root_id, found = %index.id, "Persisted root id differs, re-rooting");
        }
        let mut root = TreeNode::new(root_id);
        for record in index.children {
            if let Some(child) = self.build_node(record) {
                root.merge_child(child);
            }
        }
        self.root = root;
    }

    fn build_node(&mut self, record: IndexNode) -> Option<TreeNode> {
        let id = self.resolve_record(&record)?;
        let mut node = TreeNode::new(id);
        for child in record.children {
            if let Some(child) = self.build_node(child) {
                node.merge_child(child);
            }
        }
        Some(node)
    }

    /// Find the layer behind a persisted record, recreating it from the
    /// record's name when the id is unknown.
    fn resolve_record(&mut self, record: &IndexNode) -> Option<LayerId> {
        if self.layers.is_internal_id(record.id.as_str()) {
            warn!(id = %record.id, "Dropping built-in layer found below the root");
            return None;
        }
        if self.layers.has_layer_id(record.id.as_str()) {
            return Some(record.id.clone());
        }

        let Some(name) = record.name.as_deref() else {
            warn!(id = %record.id, "Dropping node for unknown layer");
            return None;
        };
        if self.layers.is_internal_name(name) {
            warn!(id = %record.id, name, "Dropping node named after a built-in layer");
            return None;
        }
        if let Some(id) = self.layers.name_to_id(name) {
            return Some(id.clone());
        }

        let spec = LayerSpec::named(name)
            .with_id(record.id.clone())
            .with_type(self.default_layer_type);
        match self.layers.create_layer(spec) {
            Ok(layer) => {
                info!(id = %layer.id, name, "Recreated layer from tree index");
                Some(layer.id)
            }
            Err(e) => {
                warn!(id = %record.id, name, error = %e, "Dropping node for unknown layer");
                None
            }
        }
    }

    /// The persisted shape: ids and names only.
    pub fn json_index_tree(&self) -> IndexNode {
        self.index_node(&self.root)
    }

    fn index_node(&self, node: &TreeNode) -> IndexNode {
        IndexNode {
            id: node.id().clone(),
            name: self.layers.id_to_name(node.id().as_str()).map(str::to_string),
            children: node.children().iter().map(|c| self.index_node(c)).collect(),
        }
    }

    /// The denormalized shape with layer metadata at every node.
    pub fn json_tree(&self) -> Result<JsonTreeNode> {
        self.json_node(&self.root)
            .ok_or_else(|| TreeError::MissingRoot.into())
    }

    fn json_node(&self, node: &TreeNode) -> Option<JsonTreeNode> {
        let layer = self.layers.get_layer_by_id(node.id().as_str())?;
        let children = node
            .children()
            .iter()
            .filter_map(|c| self.json_node(c))
            .collect();
        Some(JsonTreeNode::from_layer(layer, children))
    }

    // ── Layer façade ───────────────────────────────────────────────────

    pub fn create_layer(&mut self, spec: LayerSpec) -> Result<Layer> {
        self.layers.create_layer(spec)
    }

    pub fn update_layer(&mut self, name: &str, patch: LayerPatch) -> Result<Layer> {
        self.layers.update_layer(name, patch)
    }

    /// Rename a layer. Every path through it changes with it.
    pub fn rename_layer(&mut self, name: &str, new_name: &str) -> Result<Layer> {
        let layer = self.layers.rename_layer(name, new_name)?;
        self.save()?;
        Ok(layer)
    }

    pub fn lock_layer(&mut self, name: &str, by: &str) -> Result<Layer> {
        self.layers.lock_layer(name, by)
    }

    pub fn unlock_layer(&mut self, name: &str, by: &str) -> Result<Layer> {
        self.layers.unlock_layer(name, by)
    }

    /// Delete a layer along with every node referencing it. Children of
    /// those nodes move up one level.
    pub fn delete_layer(&mut self, name: &str) -> Result<Layer> {
        let layer = self.layers.remove_layer_by_name(name)?;
        let pruned = self.root.prune_layer(layer.id.as_str());
        info!(name, nodes = pruned, "Layer deleted from tree");
        self.save()?;
        Ok(layer)
    }
}

impl Serialize for ContextTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.json_tree()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl std::fmt::Debug for ContextTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextTree")
            .field("backend", &self.store.name())
            .field("nodes", &self.node_count())
            .field("layers", &self.layers)
            .finish()
    }
}
