//! # strata core
//!
//! Domain types, traits, and error definitions for strata layer trees.
//! This crate does no I/O. It defines the domain model that the store,
//! tree and cli crates implement against.
//!
//! ## Design Philosophy
//!
//! Persistence is a trait here ([`IndexStore`]); backends live in
//! `strata-store`. The registry and tree live in `strata-tree` and only see
//! the trait, so tests run against an in-memory map and the CLI against a
//! JSON file without either knowing.

pub mod error;
pub mod layer;
pub mod path;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, LayerError, Result, StoreError, TreeError};
pub use layer::{validate_layer_name, Layer, LayerId, LayerPatch, LayerSpec, LayerType};
pub use store::IndexStore;
