//! Crafting grid controller.
//!
//! A [`CraftingGrid`] owns the cells of one crafting inventory plus its
//! result slot. Every mutation recomputes the result synchronously, and
//! [`CraftingGrid::consume`] selects and consumes from a single snapshot.

use std::sync::Arc;

use lattice_common::{ItemStack, RecipeId};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::catalog::TagCatalogHandle;
use crate::matching::{select_recipe, GridSnapshot};
use crate::registry::RecipeRegistry;

/// A crafting grid shared between the threads that handle one player.
pub type SharedCraftingGrid = Arc<Mutex<CraftingGrid>>;

/// Errors from grid operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Width or height is zero.
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested width
        width: u8,
        /// Requested height
        height: u8,
    },

    /// Cell or slot index past the end of the grid.
    #[error("slot {index} out of range (grid has {len})")]
    SlotOutOfRange {
        /// Requested index
        index: usize,
        /// Number of addressable positions
        len: usize,
    },

    /// The result slot is written only by recipe matching.
    #[error("result slot is read-only")]
    ResultSlotReadOnly,
}

/// Mutable crafting state for one inventory.
///
/// Slot numbering follows the inventory layout: slot 0 is the result, slots
/// `1..=width * height` are the grid cells row-major.
#[derive(Debug)]
pub struct CraftingGrid {
    width: u8,
    height: u8,
    cells: Vec<Option<ItemStack>>,
    result: Option<ItemStack>,
    last_crafted: Option<RecipeId>,
    recipes: Arc<RecipeRegistry>,
    tags: Arc<TagCatalogHandle>,
}

impl CraftingGrid {
    /// Inventory slot holding the crafting result.
    pub const RESULT_SLOT: usize = 0;

    /// Creates an empty grid matched against `recipes` and `tags`.
    pub fn new(
        width: u8,
        height: u8,
        recipes: Arc<RecipeRegistry>,
        tags: Arc<TagCatalogHandle>,
    ) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        let size = usize::from(width) * usize::from(height);

        Ok(Self {
            width,
            height,
            cells: vec![None; size],
            result: None,
            last_crafted: None,
            recipes,
            tags,
        })
    }

    /// Grid width.
    #[must_use]
    pub fn width(&self) -> u8 {
        self.width
    }

    /// Grid height.
    #[must_use]
    pub fn height(&self) -> u8 {
        self.height
    }

    /// Grid cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Option<ItemStack>] {
        &self.cells
    }

    /// Contents of one grid cell.
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<ItemStack> {
        self.cells.get(index).copied().flatten()
    }

    /// Contents of an inventory slot (0 is the result).
    #[must_use]
    pub fn slot(&self, slot: usize) -> Option<ItemStack> {
        match slot {
            Self::RESULT_SLOT => self.result,
            _ => self.cell(slot - 1),
        }
    }

    /// Current result slot.
    #[must_use]
    pub fn result(&self) -> Option<ItemStack> {
        self.result
    }

    /// Recipe consumed most recently, if any.
    #[must_use]
    pub fn last_crafted(&self) -> Option<RecipeId> {
        self.last_crafted
    }

    /// Replaces one grid cell and recomputes the result.
    pub fn set_cell(&mut self, index: usize, stack: Option<ItemStack>) -> Result<(), GridError> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(index)
            .ok_or(GridError::SlotOutOfRange { index, len })?;
        *cell = stack;
        self.on_grid_cell_changed();
        Ok(())
    }

    /// Replaces the cell at column `x`, row `y` and recomputes the result.
    pub fn set_cell_at(&mut self, x: u8, y: u8, stack: Option<ItemStack>) -> Result<(), GridError> {
        if x >= self.width || y >= self.height {
            return Err(GridError::SlotOutOfRange {
                index: usize::from(y) * usize::from(self.width) + usize::from(x),
                len: self.cells.len(),
            });
        }
        self.set_cell(usize::from(y) * usize::from(self.width) + usize::from(x), stack)
    }

    /// Replaces an inventory slot. The result slot cannot be written.
    pub fn set_slot(&mut self, slot: usize, stack: Option<ItemStack>) -> Result<(), GridError> {
        match slot {
            Self::RESULT_SLOT => Err(GridError::ResultSlotReadOnly),
            _ => self
                .set_cell(slot - 1, stack)
                .map_err(|_| GridError::SlotOutOfRange {
                    index: slot,
                    len: self.cells.len() + 1,
                }),
        }
    }

    /// Point-in-time item IDs of the grid.
    #[must_use]
    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::from_stacks(self.width, self.height, &self.cells)
    }

    /// Recomputes the result slot from the current grid.
    pub fn on_grid_cell_changed(&mut self) {
        let tags = self.tags.snapshot();
        let grid = self.snapshot();
        self.result = select_recipe(&self.recipes, &grid, &tags)
            .and_then(|matched| ItemStack::new(matched.recipe.result(), matched.recipe.result_count()));
    }

    /// The recipe the grid would craft right now.
    #[must_use]
    pub fn craftable_recipe(&self) -> Option<RecipeId> {
        let tags = self.tags.snapshot();
        select_recipe(&self.recipes, &self.snapshot(), &tags).map(|matched| matched.recipe.id())
    }

    /// Consumes one item from every cell the matching recipe uses.
    ///
    /// Selection and consumption share one grid snapshot and one tag
    /// snapshot. Without a match nothing changes. The result slot is left as
    /// is; call [`Self::on_grid_cell_changed`] or use [`Self::take_result`].
    pub fn consume(&mut self) -> Option<RecipeId> {
        let tags = self.tags.snapshot();
        let grid = self.snapshot();
        let matched = select_recipe(&self.recipes, &grid, &tags)?;

        for index in matched.participating_cells() {
            if let Some(cell) = self.cells.get_mut(index) {
                *cell = cell.and_then(ItemStack::decremented);
            }
        }

        let id = matched.recipe.id();
        self.last_crafted = Some(id);
        debug!("Crafted recipe {id} in {}x{} grid", self.width, self.height);
        Some(id)
    }

    /// Crafts once: consumes ingredients, returns the crafted stack and
    /// recomputes the result slot.
    pub fn take_result(&mut self) -> Option<ItemStack> {
        let id = self.consume()?;
        let crafted = self
            .recipes
            .get(id)
            .and_then(|recipe| ItemStack::new(recipe.result(), recipe.result_count()));
        self.on_grid_cell_changed();
        crafted
    }

    /// Empties every cell and the result slot.
    pub fn clear(&mut self) {
        self.cells.fill(None);
        self.result = None;
    }

    /// Wraps the grid for use from several threads.
    #[must_use]
    pub fn into_shared(self) -> SharedCraftingGrid {
        Arc::new(Mutex::new(self))
    }
}
