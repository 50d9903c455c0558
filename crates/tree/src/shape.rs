//! Serialized shapes of a context tree.
//!
//! `IndexNode` is the persisted form: ids only, plus the name as a
//! fallback for records whose id is gone from the registry. `JsonTreeNode`
//! is the rich, display-oriented form with layer metadata resolved.

use serde::{Deserialize, Serialize};
use strata_core::{Layer, LayerId, LayerType};

/// Persisted tree record.
///
/// The base shape is `{id, children}`. `name` extends it: it holds the layer
/// name at save time so a record whose id is missing from the registry can
/// still be recovered by recreating the layer under that name. Readers that
/// only know `{id, children}` can ignore it, and records without it load
/// with `name: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexNode {
    pub id: LayerId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub children: Vec<IndexNode>,
}

/// Tree node with its layer's metadata inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonTreeNode {
    pub id: LayerId,

    #[serde(rename = "type")]
    pub layer_type: LayerType,

    pub name: String,
    pub label: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    pub locked: bool,

    #[serde(default)]
    pub children: Vec<JsonTreeNode>,
}

impl JsonTreeNode {
    pub(crate) fn from_layer(layer: &Layer, children: Vec<JsonTreeNode>) -> Self {
        Self {
            id: layer.id.clone(),
            layer_type: layer.layer_type,
            name: layer.name.clone(),
            label: layer.label.clone(),
            description: layer.description.clone(),
            color: layer.color.clone(),
            locked: layer.locked,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_node_tolerates_missing_fields() {
        let node: IndexNode = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(node.id.as_str(), "abc");
        assert!(node.name.is_none());
        assert!(node.children.is_empty());

        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("name").is_none());
    }

    #[test]
    fn name_is_the_only_field_beyond_id_and_children() {
        let node = IndexNode {
            id: LayerId::from("a"),
            name: Some("alpha".into()),
            children: vec![IndexNode {
                id: LayerId::from("b"),
                name: None,
                children: Vec::new(),
            }],
        };
        let json = serde_json::to_value(&node).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["children", "id", "name"]);
        assert_eq!(json["children"][0], serde_json::json!({"id": "b", "children": []}));
    }
}
