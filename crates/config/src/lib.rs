//! Configuration loading, validation, and management for strata.
//!
//! Loads configuration from `~/.strata/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_core::LayerType;

/// The root configuration structure.
///
/// Maps directly to `~/.strata/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where store files live (default: `~/.strata/data`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Backing store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Context tree behavior
    #[serde(default)]
    pub tree: TreeConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Known store backends.
pub const STORE_BACKENDS: &[&str] = &["file", "memory", "none"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// File name of the tree index, relative to `data_dir`
    #[serde(default = "default_tree_file")]
    pub tree_file: String,

    /// File name of the layer index, relative to `data_dir`
    #[serde(default = "default_layers_file")]
    pub layers_file: String,
}

fn default_store_backend() -> String {
    "file".into()
}
fn default_tree_file() -> String {
    "tree.json".into()
}
fn default_layers_file() -> String {
    "layers.json".into()
}
fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            tree_file: default_tree_file(),
            layers_file: default_layers_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Create missing layers when inserting paths
    #[serde(default = "default_true")]
    pub auto_create_layers: bool,

    /// Type given to layers created from path segments
    #[serde(default)]
    pub default_layer_type: LayerType,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            auto_create_layers: true,
            default_layer_type: LayerType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.strata/config.toml).
    ///
    /// Environment variables override the file:
    /// - `STRATA_DATA_DIR`
    /// - `STRATA_STORE_BACKEND`
    /// - `STRATA_LOG`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path`, then apply environment overrides and re-validate.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(dir) = std::env::var("STRATA_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Ok(backend) = std::env::var("STRATA_STORE_BACKEND") {
            config.store.backend = backend;
        }

        if let Ok(level) = std::env::var("STRATA_LOG") {
            config.log.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".strata")
    }

    /// Directory holding store files.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("data"))
    }

    /// Full path of the tree index file.
    pub fn tree_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.tree_file)
    }

    /// Full path of the layer index file.
    pub fn layers_path(&self) -> PathBuf {
        self.data_dir().join(&self.store.layers_file)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "store.backend must be one of {}, got \"{}\"",
                STORE_BACKENDS.join(", "),
                self.store.backend
            )));
        }

        for (field, value) in [
            ("store.tree_file", &self.store.tree_file),
            ("store.layers_file", &self.store.layers_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must not be empty"
                )));
            }
            if value.contains('/') || value.contains('\\') {
                return Err(ConfigError::ValidationError(format!(
                    "{field} must be a file name, not a path"
                )));
            }
        }

        if self.store.tree_file == self.store.layers_file {
            return Err(ConfigError::ValidationError(
                "store.tree_file and store.layers_file must differ".into(),
            ));
        }

        if self.tree.default_layer_type.is_reserved() {
            return Err(ConfigError::ValidationError(format!(
                "tree.default_layer_type can not be the reserved type \"{}\"",
                self.tree.default_layer_type
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for strata_core::Error {
    fn from(e: ConfigError) -> Self {
        strata_core::Error::Config {
            message: e.to_string(),
        }
    }
}
