//! Server configuration.
//!
//! Points the server at its data documents and sizes the crafting grids.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "lattice.toml";

/// Largest crafting grid side the server will build.
pub const MAX_GRID_SIZE: u8 = 5;

/// Server configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    // === Data Files ===
    /// Item catalog document (name -> numeric ID)
    pub items_path: PathBuf,
    /// Tag catalog document (tag -> member items)
    pub tags_path: PathBuf,
    /// Recipe document
    pub recipes_path: PathBuf,

    // === Crafting ===
    /// Side of the inventory crafting grid
    pub player_grid_size: u8,
    /// Side of the crafting table grid
    pub table_grid_size: u8,
    /// Refuse to start when any recipe entry is rejected
    pub strict_recipes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            items_path: PathBuf::from("data/items.json"),
            tags_path: PathBuf::from("data/tags.json"),
            recipes_path: PathBuf::from("data/recipes.json"),

            player_grid_size: 2,
            table_grid_size: 3,
            strict_recipes: false,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `lattice.toml` in the working directory.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", path.display());
                    config
                },
                Err(e) => {
                    warn!("Failed to parse config file: {e}");
                    Self::default()
                },
            },
            Err(e) => {
                warn!("Failed to read config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolves relative data paths against `base`, usually the directory
    /// holding the config file.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [&mut self.items_path, &mut self.tags_path, &mut self.recipes_path] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.table_grid_size = self.table_grid_size.clamp(1, MAX_GRID_SIZE);
        self.player_grid_size = self.player_grid_size.clamp(1, self.table_grid_size);
    }
}
