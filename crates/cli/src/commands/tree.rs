//! Tree commands: `status`, `tree`, `paths`, `insert`, `move`, `copy`,
//! `remove`, `clear`.

use strata_config::AppConfig;
use strata_core::Result;
use strata_tree::{ContextTree, PathListing};

use super::open_tree;

pub fn status(config: &AppConfig) -> Result<()> {
    let tree = open_tree(config)?;

    println!("🗂  strata Status");
    println!("================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Data dir:     {}", config.data_dir().display());
    println!("  Store:        {}", config.store.backend);
    println!("  Auto-create:  {}", if config.tree.auto_create_layers { "enabled" } else { "disabled" });
    println!("  Layer type:   {}", config.tree.default_layer_type);
    println!("  Nodes:        {}", tree.node_count());
    println!("  Layers:       {}", tree.layers().len());
    println!("  Leaf paths:   {}", tree.paths().len());

    Ok(())
}

pub fn show(config: &AppConfig) -> Result<()> {
    let tree = open_tree(config)?;
    println!("{}", serde_json::to_string_pretty(&tree.json_tree()?)?);
    Ok(())
}

pub fn paths(config: &AppConfig, all: bool) -> Result<()> {
    let tree = open_tree(config)?;
    let listing = if all { PathListing::All } else { PathListing::Leaves };
    for path in tree.paths_with(listing) {
        println!("{path}");
    }
    Ok(())
}

pub fn insert(config: &AppConfig, path: &str, no_create: bool) -> Result<()> {
    let mut tree = open_tree(config)?;
    let auto_create = config.tree.auto_create_layers && !no_create;
    let ids = tree.insert_path(path, None, auto_create)?;
    println!("✅ Inserted {} ({} layers)", display(path), ids.len());
    Ok(())
}

pub fn move_path(config: &AppConfig, from: &str, to: &str, recursive: bool) -> Result<()> {
    let mut tree = open_tree(config)?;
    tree.move_path(from, to, recursive)?;
    println!("✅ Moved {} under {}", display(from), display(to));
    print_leaves(&tree);
    Ok(())
}

pub fn copy_path(config: &AppConfig, from: &str, to: &str, recursive: bool) -> Result<()> {
    let mut tree = open_tree(config)?;
    tree.copy_path(from, to, recursive)?;
    println!("✅ Copied {} under {}", display(from), display(to));
    Ok(())
}

pub fn remove(config: &AppConfig, path: &str, recursive: bool) -> Result<()> {
    let mut tree = open_tree(config)?;
    tree.remove_path(path, recursive)?;
    println!("🗑  Removed {}", display(path));
    Ok(())
}

pub fn clear(config: &AppConfig, confirm: bool) -> Result<()> {
    if !confirm {
        println!("⚠️  This removes every path. Re-run with --confirm to proceed.");
        return Ok(());
    }
    let mut tree = open_tree(config)?;
    tree.clear()?;
    println!("🗑  Tree cleared ({} layers kept)", tree.layers().len());
    Ok(())
}

fn display(path: &str) -> String {
    strata_core::path::normalize(path)
}

fn print_leaves(tree: &ContextTree) {
    for path in tree.paths() {
        println!("   {path}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path) -> AppConfig {
        AppConfig {
            data_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        }
    }

    #[test]
    fn commands_share_one_persisted_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());

        insert(&config, "/a/b/c", false).unwrap();
        move_path(&config, "/a/b", "/x", false).unwrap();
        copy_path(&config, "/x/b", "/y", false).unwrap();
        remove(&config, "/a", false).unwrap();

        let tree = open_tree(&config).unwrap();
        assert_eq!(tree.paths(), vec!["/c", "/x/b", "/y/b"]);
    }

    #[test]
    fn no_create_respects_config_and_flag() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());

        let err = insert(&config, "/a", true).unwrap_err();
        assert!(err.is_expected());

        config.tree.auto_create_layers = false;
        assert!(insert(&config, "/a", false).is_err());
    }

    #[test]
    fn clear_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        insert(&config, "/a", false).unwrap();

        clear(&config, false).unwrap();
        assert!(open_tree(&config).unwrap().path_exists("/a"));

        clear(&config, true).unwrap();
        assert!(!open_tree(&config).unwrap().path_exists("/a"));
    }
}
