//! `strata init`: first-time setup.

use std::path::Path;

use strata_config::AppConfig;

use super::CmdResult;

pub fn run(config: &AppConfig, config_path: Option<&Path>) -> CmdResult {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let data_dir = config.data_dir();

    println!("🗂  strata — First-Time Setup");
    println!("============================\n");

    if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
            println!("✅ Created config directory: {}", dir.display());
        }
    }

    if config.store.backend == "file" {
        if data_dir.exists() {
            println!("  Data directory exists: {}", data_dir.display());
        } else {
            std::fs::create_dir_all(&data_dir)?;
            println!("✅ Created data directory: {}", data_dir.display());
        }
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   strata insert /projects/alpha");
        println!("   strata paths");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_config_and_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("conf").join("config.toml");
        let config = AppConfig {
            data_dir: Some(dir.path().join("data")),
            ..AppConfig::default()
        };

        run(&config, Some(&config_path)).unwrap();
        assert!(config_path.exists());
        assert!(dir.path().join("data").is_dir());

        let written = AppConfig::load_from(&config_path).unwrap();
        assert_eq!(written.store.backend, "file");

        // A second run leaves the file alone.
        std::fs::write(&config_path, "[log]\nlevel = \"warn\"\n").unwrap();
        run(&config, Some(&config_path)).unwrap();
        assert_eq!(AppConfig::load_from(&config_path).unwrap().log.level, "warn");
    }
}
