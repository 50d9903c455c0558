pub mod init;
pub mod layer;
pub mod tree;

use std::path::Path;
use std::sync::Arc;

use strata_config::{AppConfig, ConfigError};
use strata_core::IndexStore;
use strata_store::{FileStore, InMemoryStore, NoopStore};
use strata_tree::ContextTree;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Load the config from `path`, or from `~/.strata/config.toml`.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}

/// Open the context tree on the configured backend.
pub fn open_tree(config: &AppConfig) -> strata_core::Result<ContextTree> {
    let (tree_store, layer_store): (Arc<dyn IndexStore>, Arc<dyn IndexStore>) =
        match config.store.backend.as_str() {
            "memory" => (
                Arc::new(InMemoryStore::new()),
                Arc::new(InMemoryStore::new()),
            ),
            "none" => (Arc::new(NoopStore), Arc::new(NoopStore)),
            _ => (
                Arc::new(FileStore::new(config.tree_path())),
                Arc::new(FileStore::new(config.layers_path())),
            ),
        };

    let mut tree = ContextTree::new(tree_store, layer_store)?;
    tree.set_default_layer_type(config.tree.default_layer_type)?;
    Ok(tree)
}

/// Turn expected outcomes (not found, name taken) into a printed notice.
/// Anything else is a real failure.
pub fn report(result: strata_core::Result<()>) -> CmdResult {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_expected() => {
            eprintln!("⚠️  {e}");
            Ok(())
        }
        Err(e) => Err(format!("[{}] {e}", e.error_code()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{Error, LayerError, LayerType};

    fn file_config(dir: &Path) -> AppConfig {
        AppConfig {
            data_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn file_backend_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = file_config(dir.path());

        let mut tree = open_tree(&config).unwrap();
        tree.insert_path("/a/b", None, true).unwrap();
        drop(tree);

        assert!(config.tree_path().exists());
        let tree = open_tree(&config).unwrap();
        assert!(tree.path_exists("/a/b"));
    }

    #[test]
    fn memory_backend_starts_empty_each_time() {
        let mut config = AppConfig::default();
        config.store.backend = "memory".into();

        let mut tree = open_tree(&config).unwrap();
        tree.insert_path("/a", None, true).unwrap();
        let tree = open_tree(&config).unwrap();
        assert_eq!(tree.paths(), vec!["/"]);
    }

    #[test]
    fn default_layer_type_applies() {
        let mut config = AppConfig::default();
        config.store.backend = "none".into();
        config.tree.default_layer_type = LayerType::Label;

        let mut tree = open_tree(&config).unwrap();
        tree.insert_path("/tag", None, true).unwrap();
        assert_eq!(
            tree.layers().get_layer_by_name("tag").unwrap().layer_type,
            LayerType::Label
        );
    }

    #[test]
    fn expected_errors_are_not_failures() {
        let conflict = Error::from(LayerError::Conflict("docs".into()));
        assert!(report(Err(conflict)).is_ok());

        let locked = Error::from(LayerError::Locked("docs".into()));
        let err = report(Err(locked)).unwrap_err();
        assert!(err.to_string().contains("LAYER_LOCKED"));
    }

    #[test]
    fn explicit_config_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[store]\nbackend = \"none\"\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.store.backend, "none");
    }
}
