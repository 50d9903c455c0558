//! `strata layer`: layer management commands.

use strata_config::AppConfig;
use strata_core::{LayerError, LayerPatch, LayerSpec, LayerType, Result};

use super::open_tree;

/// Lock holder used when `--by` is not given.
pub const DEFAULT_HOLDER: &str = "cli";

pub fn spec(
    name: String,
    layer_type: Option<LayerType>,
    label: Option<String>,
    description: Option<String>,
    color: Option<String>,
    locked: bool,
) -> LayerSpec {
    LayerSpec {
        id: None,
        name,
        layer_type,
        label,
        description,
        color,
        locked,
        metadata: None,
    }
}

pub fn patch(
    layer_type: Option<LayerType>,
    label: Option<String>,
    description: Option<String>,
    color: Option<String>,
) -> LayerPatch {
    LayerPatch {
        label,
        description,
        color,
        layer_type,
        ..LayerPatch::default()
    }
}

pub fn list(config: &AppConfig) -> Result<()> {
    let tree = open_tree(config)?;
    let layers = tree.layers();

    println!("🗂  Layers ({})", layers.len());
    println!("==============");
    for layer in layers.list() {
        let marker = if layer.locked { "🔒" } else { "  " };
        println!(
            "  {marker} {:<24} {:<10} {}",
            layer.name, layer.layer_type, layer.id
        );
    }
    Ok(())
}

pub fn show(config: &AppConfig, name: &str) -> Result<()> {
    let tree = open_tree(config)?;
    let layer = tree
        .layers()
        .get_layer_by_name(name)
        .ok_or_else(|| LayerError::NotFound(name.to_string()))?;
    println!("{}", serde_json::to_string_pretty(layer)?);
    Ok(())
}

pub fn create(config: &AppConfig, spec: LayerSpec) -> Result<()> {
    let mut tree = open_tree(config)?;
    let layer = tree.create_layer(spec)?;
    println!("✅ Created layer {} ({})", layer.name, layer.id);
    Ok(())
}

pub fn update(config: &AppConfig, name: &str, patch: LayerPatch) -> Result<()> {
    if patch.is_empty() {
        println!("Nothing to update.");
        return Ok(());
    }
    let mut tree = open_tree(config)?;
    let layer = tree.update_layer(name, patch)?;
    println!("✅ Updated layer {}", layer.name);
    Ok(())
}

pub fn rename(config: &AppConfig, name: &str, new_name: &str) -> Result<()> {
    let mut tree = open_tree(config)?;
    tree.rename_layer(name, new_name)?;
    println!("✅ Renamed layer {name} → {new_name}");
    Ok(())
}

pub fn lock(config: &AppConfig, name: &str, by: &str) -> Result<()> {
    let mut tree = open_tree(config)?;
    tree.lock_layer(name, by)?;
    println!("🔒 Locked layer {name} for {by}");
    Ok(())
}

pub fn unlock(config: &AppConfig, name: &str, by: &str) -> Result<()> {
    let mut tree = open_tree(config)?;
    let layer = tree.unlock_layer(name, by)?;
    if layer.locked {
        let holders: Vec<&str> = layer.locked_by.iter().map(String::as_str).collect();
        println!("🔒 Layer {name} is still locked by {}", holders.join(", "));
    } else {
        println!("🔓 Unlocked layer {name}");
    }
    Ok(())
}

pub fn delete(config: &AppConfig, name: &str) -> Result<()> {
    let mut tree = open_tree(config)?;
    let layer = tree.delete_layer(name)?;
    println!("🗑  Deleted layer {} ({})", layer.name, layer.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::ErrorKind;

    fn config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            data_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn layer_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        create(
            &config,
            spec("docs".into(), Some(LayerType::Canvas), None, None, None, false),
        )
        .unwrap();
        update(
            &config,
            "docs",
            patch(None, Some("Docs".into()), None, Some("#123456".into())),
        )
        .unwrap();
        rename(&config, "docs", "manuals").unwrap();

        let tree = open_tree(&config).unwrap();
        let layer = tree.layers().get_layer_by_name("manuals").unwrap();
        assert_eq!(layer.label, "Docs");
        assert_eq!(layer.layer_type, LayerType::Canvas);
        assert_eq!(layer.color.as_deref(), Some("#123456"));
        drop(tree);

        delete(&config, "manuals").unwrap();
        let err = show(&config, "manuals").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn lock_blocks_delete_until_unlocked() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        create(&config, LayerSpec::named("keep")).unwrap();

        lock(&config, "keep", DEFAULT_HOLDER).unwrap();
        let err = delete(&config, "keep").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Locked);

        unlock(&config, "keep", DEFAULT_HOLDER).unwrap();
        delete(&config, "keep").unwrap();
    }
}
