//! strata CLI entry point.
//!
//! Commands:
//! - `init`: Create config and data directories
//! - `status`: Show configuration and tree size
//! - `tree`: Print the tree with layer metadata
//! - `paths`: List leaf (or all) paths
//! - `insert` / `move` / `copy` / `remove` / `clear`: Edit the tree
//! - `layer`: Manage layers

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strata_core::LayerType;

mod commands;

#[derive(Parser)]
#[command(
    name = "strata",
    about = "strata — layered, path-addressable context trees",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.strata/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and data directories
    Init,

    /// Show configuration and tree size
    Status,

    /// Print the tree as JSON, with layer metadata
    Tree,

    /// List leaf paths
    Paths {
        /// Include intermediate paths
        #[arg(short, long)]
        all: bool,
    },

    /// Insert a path, creating missing layers
    Insert {
        path: String,

        /// Fail instead of creating missing layers
        #[arg(long)]
        no_create: bool,
    },

    /// Move the layer at FROM under TO
    Move {
        from: String,
        to: String,

        /// Carry the whole subtree (default leaves children behind)
        #[arg(short, long)]
        recursive: bool,
    },

    /// Copy the layer at FROM under TO
    Copy {
        from: String,
        to: String,

        /// Copy the whole subtree
        #[arg(short, long)]
        recursive: bool,
    },

    /// Remove a path
    Remove {
        path: String,

        /// Remove the whole subtree (default lifts children one level)
        #[arg(short, long)]
        recursive: bool,
    },

    /// Remove every path below the root
    Clear {
        /// Required, clearing can not be undone
        #[arg(long)]
        confirm: bool,
    },

    /// Manage layers
    #[command(subcommand)]
    Layer(LayerCommand),
}

#[derive(Subcommand)]
enum LayerCommand {
    /// List all layers
    List,

    /// Show one layer as JSON
    Show { name: String },

    /// Create a layer
    Create {
        name: String,

        #[arg(short = 't', long = "type")]
        layer_type: Option<LayerType>,

        #[arg(long)]
        label: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        /// Create the layer locked
        #[arg(long)]
        locked: bool,
    },

    /// Update layer metadata
    Update {
        name: String,

        #[arg(short = 't', long = "type")]
        layer_type: Option<LayerType>,

        #[arg(long)]
        label: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    /// Rename a layer
    Rename { name: String, new_name: String },

    /// Lock a layer
    Lock {
        name: String,

        /// Lock holder
        #[arg(long, default_value = commands::layer::DEFAULT_HOLDER)]
        by: String,
    },

    /// Release a lock on a layer
    Unlock {
        name: String,

        /// Lock holder
        #[arg(long, default_value = commands::layer::DEFAULT_HOLDER)]
        by: String,
    },

    /// Delete a layer and every path through it
    Delete { name: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Init => return commands::init::run(&config, cli.config.as_deref()),
        Commands::Status => commands::tree::status(&config),
        Commands::Tree => commands::tree::show(&config),
        Commands::Paths { all } => commands::tree::paths(&config, all),
        Commands::Insert { path, no_create } => commands::tree::insert(&config, &path, no_create),
        Commands::Move {
            from,
            to,
            recursive,
        } => commands::tree::move_path(&config, &from, &to, recursive),
        Commands::Copy {
            from,
            to,
            recursive,
        } => commands::tree::copy_path(&config, &from, &to, recursive),
        Commands::Remove { path, recursive } => commands::tree::remove(&config, &path, recursive),
        Commands::Clear { confirm } => commands::tree::clear(&config, confirm),
        Commands::Layer(cmd) => match cmd {
            LayerCommand::List => commands::layer::list(&config),
            LayerCommand::Show { name } => commands::layer::show(&config, &name),
            LayerCommand::Create {
                name,
                layer_type,
                label,
                description,
                color,
                locked,
            } => commands::layer::create(
                &config,
                commands::layer::spec(name, layer_type, label, description, color, locked),
            ),
            LayerCommand::Update {
                name,
                layer_type,
                label,
                description,
                color,
            } => commands::layer::update(
                &config,
                &name,
                commands::layer::patch(layer_type, label, description, color),
            ),
            LayerCommand::Rename { name, new_name } => {
                commands::layer::rename(&config, &name, &new_name)
            }
            LayerCommand::Lock { name, by } => commands::layer::lock(&config, &name, &by),
            LayerCommand::Unlock { name, by } => commands::layer::unlock(&config, &name, &by),
            LayerCommand::Delete { name } => commands::layer::delete(&config, &name),
        },
    };

    commands::report(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_insert_flags() {
        let cli = Cli::try_parse_from(["strata", "insert", "/a/b", "--no-create"]).unwrap();
        match cli.command {
            Commands::Insert { path, no_create } => {
                assert_eq!(path, "/a/b");
                assert!(no_create);
            }
            _ => panic!("expected insert"),
        }
    }

    #[test]
    fn parses_recursive_move() {
        let cli = Cli::try_parse_from(["strata", "move", "/a/b", "/x", "-r"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Move { recursive: true, .. }
        ));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["strata", "paths", "--all", "-v", "--config", "/tmp/c.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Paths { all: true }));
    }

    #[test]
    fn parses_layer_type() {
        let cli = Cli::try_parse_from(["strata", "layer", "create", "docs", "--type", "canvas"])
            .unwrap();
        match cli.command {
            Commands::Layer(LayerCommand::Create {
                name, layer_type, ..
            }) => {
                assert_eq!(name, "docs");
                assert_eq!(layer_type, Some(LayerType::Canvas));
            }
            _ => panic!("expected layer create"),
        }
        assert!(Cli::try_parse_from(["strata", "layer", "create", "x", "-t", "folder"]).is_err());
    }

    #[test]
    fn lock_holder_defaults() {
        let cli = Cli::try_parse_from(["strata", "layer", "lock", "docs"]).unwrap();
        match cli.command {
            Commands::Layer(LayerCommand::Lock { by, .. }) => {
                assert_eq!(by, commands::layer::DEFAULT_HOLDER)
            }
            _ => panic!("expected layer lock"),
        }
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["strata"]).is_err());
    }
}
