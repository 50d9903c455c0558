//! Layer domain types.
//!
//! A layer is a named, uniquely identified node-kind. Its identity (`id`)
//! never changes; its metadata (label, color, lock state, ...) can. The same
//! layer may appear at any number of positions in a context tree.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LayerError;

/// Maximum length of a layer name, in bytes.
pub const MAX_LAYER_NAME_LEN: usize = 255;

/// Lock holder recorded on built-in layers.
pub const SYSTEM_LOCK_HOLDER: &str = "system";

/// Unique identifier for a layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for LayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for LayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Lets id-keyed maps be queried with a plain `&str`.
impl std::borrow::Borrow<str> for LayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Category tag of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// The root of every tree. Reserved.
    Universe,
    /// Other built-in layers. Reserved.
    System,
    /// Default layer type, carries context.
    #[default]
    Context,
    /// Label only, no associated data.
    Label,
    /// Dashboard / UI layout holder.
    Canvas,
    /// A separately exportable workspace.
    Workspace,
}

impl LayerType {
    /// Reserved types belong to built-in layers only.
    pub fn is_reserved(self) -> bool {
        matches!(self, LayerType::Universe | LayerType::System)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayerType::Universe => "universe",
            LayerType::System => "system",
            LayerType::Context => "context",
            LayerType::Label => "label",
            LayerType::Canvas => "canvas",
            LayerType::Workspace => "workspace",
        }
    }
}

impl std::fmt::Display for LayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "universe" => Ok(LayerType::Universe),
            "system" => Ok(LayerType::System),
            "context" => Ok(LayerType::Context),
            "label" => Ok(LayerType::Label),
            "canvas" => Ok(LayerType::Canvas),
            "workspace" => Ok(LayerType::Workspace),
            other => Err(format!("unknown layer type: {other}")),
        }
    }
}

/// A layer as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,

    #[serde(rename = "type", default)]
    pub layer_type: LayerType,

    pub name: String,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub locked: bool,

    /// Who holds a lock on this layer.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub locked_by: BTreeSet<String>,

    /// Free-form metadata, always a JSON object.
    #[serde(default = "empty_object")]
    pub metadata: serde_json::Value,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Layer {
    /// Build a layer from a creation spec. The id is allocated when absent.
    pub fn from_spec(spec: LayerSpec) -> Self {
        let now = Utc::now();
        let label = spec.label.unwrap_or_else(|| spec.name.clone());
        let mut locked_by = BTreeSet::new();
        if spec.locked {
            locked_by.insert(SYSTEM_LOCK_HOLDER.to_string());
        }
        Self {
            id: spec.id.unwrap_or_default(),
            layer_type: spec.layer_type.unwrap_or_default(),
            name: spec.name,
            label,
            description: spec.description.unwrap_or_default(),
            color: spec.color,
            locked: spec.locked,
            locked_by,
            metadata: spec.metadata.unwrap_or_else(empty_object),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a patch into this layer. Callers check the lock first.
    pub fn apply(&mut self, patch: LayerPatch) {
        if let Some(label) = patch.label {
            self.label = label;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
        if let Some(layer_type) = patch.layer_type {
            self.layer_type = layer_type;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
        self.touch();
    }

    /// Record a lock holder.
    pub fn lock(&mut self, by: &str) {
        self.locked_by.insert(by.to_string());
        self.locked = true;
        self.touch();
    }

    /// Release a lock holder. Returns true when the layer is unlocked afterwards.
    pub fn unlock(&mut self, by: &str) -> bool {
        self.locked_by.remove(by);
        if self.locked_by.is_empty() {
            self.locked = false;
        }
        self.touch();
        !self.locked
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input for creating a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LayerId>,

    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<LayerType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default)]
    pub locked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl LayerSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: LayerId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_type(mut self, layer_type: LayerType) -> Self {
        self.layer_type = Some(layer_type);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

/// Partial update of a layer's metadata. Renaming and locking are separate
/// operations, so a patch never touches `name`, `locked` or `locked_by`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub layer_type: Option<LayerType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl LayerPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Check that `name` can be used as a layer name (and thus a path segment).
pub fn validate_layer_name(name: &str) -> Result<(), LayerError> {
    let invalid = |reason: &str| LayerError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name.len() > MAX_LAYER_NAME_LEN {
        return Err(invalid("name is too long"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name must not contain path separators"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("name must not contain control characters"));
    }
    Ok(())
}
