//! Shared crafting state handed to player sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lattice_crafting::{
    encode_registry, load_recipes_from_file, CatalogError, CraftingGrid, GridError, ItemCatalog,
    LoadError, RecipeRegistry, TagCatalog, TagCatalogHandle,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::ServerConfig;

/// Errors that keep the crafting context from loading.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Item catalog could not be loaded.
    #[error("item catalog {}: {source}", path.display())]
    Items {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: CatalogError,
    },

    /// Tag catalog could not be loaded.
    #[error("tag catalog {}: {source}", path.display())]
    Tags {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: CatalogError,
    },

    /// Recipe document could not be loaded at all.
    #[error("recipe document {}: {source}", path.display())]
    Recipes {
        /// Document path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: LoadError,
    },

    /// Entries were rejected while strict loading is on.
    #[error("{0} recipe entries rejected")]
    RejectedRecipes(usize),
}

/// Catalogs and recipes loaded at startup, shared by every crafting grid.
#[derive(Debug)]
pub struct CraftingContext {
    items: ItemCatalog,
    tags: Arc<TagCatalogHandle>,
    recipes: Arc<RecipeRegistry>,
    tags_path: PathBuf,
    player_grid_size: u8,
    table_grid_size: u8,
}

impl CraftingContext {
    /// Loads the item catalog, tag catalog and recipe document named by
    /// `config`.
    ///
    /// Rejected recipe entries are logged and skipped unless
    /// `strict_recipes` is set. Running out of recipe IDs keeps the recipes
    /// loaded so far.
    pub fn load(config: &ServerConfig) -> Result<Self, ContextError> {
        let items =
            ItemCatalog::from_file(&config.items_path).map_err(|source| ContextError::Items {
                path: config.items_path.clone(),
                source,
            })?;
        info!("Loaded {} items", items.len());

        let tags = load_tags(&config.tags_path, &items)?;
        info!("Loaded {} tags", tags.len());

        let outcome = load_recipes_from_file(&config.recipes_path, &items);
        match outcome.error {
            None => {},
            Some(LoadError::IdSpaceExhausted(e)) => warn!("Recipe set truncated: {e}"),
            Some(source) => {
                return Err(ContextError::Recipes {
                    path: config.recipes_path.clone(),
                    source,
                })
            },
        }
        if config.strict_recipes && !outcome.rejected.is_empty() {
            return Err(ContextError::RejectedRecipes(outcome.rejected.len()));
        }

        Ok(Self {
            items,
            tags: Arc::new(TagCatalogHandle::new(tags)),
            recipes: Arc::new(outcome.registry),
            tags_path: config.tags_path.clone(),
            player_grid_size: config.player_grid_size,
            table_grid_size: config.table_grid_size,
        })
    }

    /// Item catalog used to resolve recipe references.
    #[must_use]
    pub fn items(&self) -> &ItemCatalog {
        &self.items
    }

    /// Shared tag catalog handle.
    #[must_use]
    pub fn tags(&self) -> &Arc<TagCatalogHandle> {
        &self.tags
    }

    /// Shared recipe registry.
    #[must_use]
    pub fn recipes(&self) -> &Arc<RecipeRegistry> {
        &self.recipes
    }

    /// A fresh grid of the given size.
    pub fn grid(&self, size: u8) -> Result<CraftingGrid, GridError> {
        CraftingGrid::new(
            size,
            size,
            Arc::clone(&self.recipes),
            Arc::clone(&self.tags),
        )
    }

    /// A fresh inventory crafting grid.
    pub fn player_grid(&self) -> Result<CraftingGrid, GridError> {
        self.grid(self.player_grid_size)
    }

    /// A fresh crafting table grid.
    pub fn table_grid(&self) -> Result<CraftingGrid, GridError> {
        self.grid(self.table_grid_size)
    }

    /// Re-reads the tag document and publishes it to every grid.
    /// On failure the current catalog stays in place.
    pub fn reload_tags(&self) -> Result<usize, ContextError> {
        let tags = load_tags(&self.tags_path, &self.items)?;
        let count = tags.len();
        self.tags.replace(tags);
        info!("Reloaded {count} tags");
        Ok(count)
    }

    /// Recipe book records for every recipe, in ID order.
    #[must_use]
    pub fn recipe_book(&self) -> Vec<Vec<u8>> {
        encode_registry(&self.recipes, &self.tags.snapshot())
    }
}

fn load_tags(path: &Path, items: &ItemCatalog) -> Result<TagCatalog, ContextError> {
    TagCatalog::from_file(path, items).map_err(|source| ContextError::Tags {
        path: path.to_path_buf(),
        source,
    })
}
