//! Lattice server entry point.
//!
//! Usage: `lattice [CONFIG]`. Relative data paths in the config are resolved
//! against the config file's directory.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lattice_server::{CraftingContext, ServerConfig, CONFIG_FILE};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lattice=info".parse()?))
        .init();

    info!("Lattice starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let mut config = ServerConfig::load_from(&config_path);
    config.validate();
    config.resolve_paths(config_path.parent().unwrap_or_else(|| Path::new(".")));

    let context = CraftingContext::load(&config).context("failed to load crafting data")?;
    let book = context.recipe_book();
    info!(
        "Crafting ready: {} recipes, {} recipe book bytes, {}x{} player grid, {}x{} table grid",
        context.recipes().len(),
        book.iter().map(Vec::len).sum::<usize>(),
        config.player_grid_size,
        config.player_grid_size,
        config.table_grid_size,
        config.table_grid_size,
    );

    info!("Lattice shutdown complete");
    Ok(())
}
