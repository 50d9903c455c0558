//! Layer registry and context tree for strata.
//!
//! A [`ContextTree`] maps slash-delimited paths onto chains of shared,
//! uniquely named layers held in a [`LayerRegistry`].

pub mod builtin;
pub mod node;
pub mod registry;
pub mod shape;
pub mod tree;

pub use builtin::{ROOT_LAYER_ID, ROOT_LAYER_NAME};
pub use node::TreeNode;
pub use registry::LayerRegistry;
pub use shape::{IndexNode, JsonTreeNode};
pub use tree::{ContextTree, PathListing, TREE_KEY};
