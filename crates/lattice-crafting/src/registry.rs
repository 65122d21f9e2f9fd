//! Immutable, ID-ordered recipe collection.

use ahash::AHashMap;
use lattice_common::RecipeId;
use thiserror::Error;

use crate::recipe::Recipe;

/// Raised when no recipe IDs remain to be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("recipe ID space exhausted after {last}")]
pub struct IdSpaceExhausted {
    /// Last ID that was issued.
    pub last: RecipeId,
}

/// The loaded recipe set.
///
/// Recipes are kept in ascending ID order, which is also document order.
/// An index by occupied-cell count narrows selection to recipes that could
/// possibly match a grid, without changing which recipe wins.
#[derive(Debug, Default)]
pub struct RecipeRegistry {
    recipes: Vec<Recipe>,
    by_occupancy: AHashMap<usize, Vec<usize>>,
}

impl RecipeRegistry {
    /// Looks up a recipe by ID.
    #[must_use]
    pub fn get(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes
            .binary_search_by_key(&id, Recipe::id)
            .ok()
            .map(|index| &self.recipes[index])
    }

    /// Number of recipes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Returns true if no recipes are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// All recipes in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.iter()
    }

    /// Recipes that can only match a grid with exactly `occupied` non-empty
    /// cells, in ascending ID order.
    pub fn candidates(&self, occupied: usize) -> impl Iterator<Item = &Recipe> {
        self.by_occupancy
            .get(&occupied)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&index| &self.recipes[index])
    }
}

/// Issues IDs and collects recipes into a [`RecipeRegistry`].
#[derive(Debug)]
pub struct RecipeRegistryBuilder {
    next_id: Option<RecipeId>,
    last_issued: RecipeId,
    recipes: Vec<Recipe>,
}

impl Default for RecipeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeRegistryBuilder {
    /// Creates a builder that issues IDs from [`RecipeId::FIRST`].
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(RecipeId::FIRST)
    }

    pub(crate) fn starting_at(first: RecipeId) -> Self {
        Self {
            next_id: Some(first),
            last_issued: RecipeId::NONE,
            recipes: Vec::new(),
        }
    }

    /// Assigns the next ID to `recipe` and stores it.
    pub fn push(&mut self, recipe: Recipe) -> Result<RecipeId, IdSpaceExhausted> {
        let id = self.next_id.ok_or(IdSpaceExhausted {
            last: self.last_issued,
        })?;
        self.next_id = id.next();
        self.last_issued = id;
        self.recipes.push(recipe.with_id(id));
        Ok(id)
    }

    /// Number of recipes pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    /// Returns true if nothing has been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Freezes the collected recipes.
    #[must_use]
    pub fn build(self) -> RecipeRegistry {
        let mut by_occupancy: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for (index, recipe) in self.recipes.iter().enumerate() {
            by_occupancy
                .entry(recipe.occupied_cells())
                .or_default()
                .push(index);
        }

        RecipeRegistry {
            recipes: self.recipes,
            by_occupancy,
        }
    }
}
