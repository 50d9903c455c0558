//! Built-in layers seeded into every registry.

use strata_core::{LayerId, LayerSpec, LayerType};

/// Fixed id of the root layer. Stable across restarts so persisted trees
/// always find their root.
pub const ROOT_LAYER_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Name of the root layer; also the root path.
pub const ROOT_LAYER_NAME: &str = "/";

/// The default built-in table.
pub fn builtin_layers() -> Vec<LayerSpec> {
    vec![root_layer_spec()]
}

pub fn root_layer_spec() -> LayerSpec {
    LayerSpec::named(ROOT_LAYER_NAME)
        .with_id(LayerId::from(ROOT_LAYER_ID))
        .with_type(LayerType::Universe)
        .with_label("Universe")
        .with_description("Root of the context tree")
        .with_color("#ffffff")
        .locked()
}
