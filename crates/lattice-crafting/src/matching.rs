//! Matching engine: shaped offset search, greedy shapeless assignment and
//! first-match recipe selection.
//!
//! Everything here is a pure function of a [`GridSnapshot`], the recipes and
//! one [`TagCatalog`] snapshot.

use ahash::AHashSet;
use lattice_common::{ItemId, ItemStack};
use tracing::warn;

use crate::catalog::TagCatalog;
use crate::recipe::{IngredientCell, ItemRef, Recipe};
use crate::registry::RecipeRegistry;

/// Point-in-time contents of a crafting grid, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    width: u8,
    height: u8,
    cells: Vec<Option<ItemId>>,
}

impl GridSnapshot {
    /// Creates a snapshot, or `None` if `cells` does not cover
    /// `width * height` positions or a dimension is zero.
    #[must_use]
    pub fn new(width: u8, height: u8, cells: Vec<Option<ItemId>>) -> Option<Self> {
        let area = usize::from(width) * usize::from(height);
        (area > 0 && cells.len() == area).then_some(Self {
            width,
            height,
            cells,
        })
    }

    /// Projects slot contents onto item IDs. Callers guarantee the area.
    pub(crate) fn from_stacks(width: u8, height: u8, stacks: &[Option<ItemStack>]) -> Self {
        Self {
            width,
            height,
            cells: stacks.iter().map(|stack| stack.map(|s| s.item())).collect(),
        }
    }

    /// An all-empty grid.
    #[must_use]
    pub fn empty(width: u8, height: u8) -> Option<Self> {
        let area = usize::from(width) * usize::from(height);
        Self::new(width, height, vec![None; area])
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

    /// All cells, row-major.
    #[must_use]
    pub fn cells(&self) -> &[Option<ItemId>] {
        &self.cells
    }

    /// Item at column `x`, row `y`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<ItemId> {
        if x >= usize::from(self.width) {
            return None;
        }
        self.cells
            .get(y * usize::from(self.width) + x)
            .copied()
            .flatten()
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}

/// Where a matched recipe sits in the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Top-left corner of the recipe window.
    Shaped {
        /// Column offset
        x_off: u8,
        /// Row offset
        y_off: u8,
    },
    /// Grid index chosen for each ingredient, in ingredient order.
    Shapeless {
        /// Grid indexes
        cells: Vec<usize>,
    },
}

/// A recipe together with the placement that satisfied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeMatch<'r> {
    /// The matched recipe.
    pub recipe: &'r Recipe,
    /// How it was placed.
    pub placement: Placement,
    grid_width: u8,
}

impl RecipeMatch<'_> {
    /// Grid indexes that supply an ingredient, one per consumed item.
    #[must_use]
    pub fn participating_cells(&self) -> Vec<usize> {
        match &self.placement {
            Placement::Shapeless { cells } => cells.clone(),
            Placement::Shaped { x_off, y_off } => {
                let recipe_width = usize::from(self.recipe.width());
                let grid_width = usize::from(self.grid_width);
                self.recipe
                    .ingredients()
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.is_empty())
                    .map(|(index, _)| {
                        let x = usize::from(*x_off) + index % recipe_width;
                        let y = usize::from(*y_off) + index / recipe_width;
                        y * grid_width + x
                    })
                    .collect()
            },
        }
    }
}

/// An alternative with its tag already looked up.
enum Resolved<'t> {
    Item(ItemId),
    Members(&'t AHashSet<ItemId>),
}

impl Resolved<'_> {
    fn accepts(&self, item: ItemId) -> bool {
        match self {
            Self::Item(id) => *id == item,
            Self::Members(members) => members.contains(&item),
        }
    }
}

/// Looks up one alternative. Unknown tags are logged and never match.
fn resolve<'t>(alternative: &ItemRef, tags: &'t TagCatalog) -> Option<Resolved<'t>> {
    match alternative {
        ItemRef::Item(id) => Some(Resolved::Item(*id)),
        ItemRef::Tag(name) => {
            let members = tags.members(name);
            if members.is_none() {
                warn!(tag = %name, "Unknown tag in recipe ingredient");
            }
            members.map(Resolved::Members)
        },
    }
}

/// Whether a grid cell satisfies an ingredient cell.
///
/// An empty ingredient cell needs an empty grid cell; otherwise the grid cell
/// must hold an item accepted by one of the alternatives.
#[must_use]
pub fn cell_accepts(cell: &IngredientCell, item: Option<ItemId>, tags: &TagCatalog) -> bool {
    match item {
        None => cell.is_empty(),
        Some(item) => cell
            .alternatives()
            .iter()
            .filter_map(|alternative| resolve(alternative, tags))
            .any(|resolved| resolved.accepts(item)),
    }
}

fn shaped_fits(
    recipe: &Recipe,
    grid: &GridSnapshot,
    tags: &TagCatalog,
    x_off: usize,
    y_off: usize,
) -> bool {
    let recipe_width = usize::from(recipe.width());
    let recipe_height = usize::from(recipe.height());

    (0..usize::from(grid.height)).all(|y| {
        (0..usize::from(grid.width)).all(|x| {
            let item = grid.get(x, y);
            let inside = (x_off..x_off + recipe_width).contains(&x)
                && (y_off..y_off + recipe_height).contains(&y);
            if inside {
                let cell = &recipe.ingredients()[(y - y_off) * recipe_width + (x - x_off)];
                cell_accepts(cell, item, tags)
            } else {
                item.is_none()
            }
        })
    })
}

/// Finds the first offset, scanning rows then columns, at which a shaped
/// recipe fits with every cell outside its window empty.
#[must_use]
pub fn find_shaped_placement(
    recipe: &Recipe,
    grid: &GridSnapshot,
    tags: &TagCatalog,
) -> Option<(u8, u8)> {
    if recipe.is_shapeless() || recipe.width() > grid.width || recipe.height() > grid.height {
        return None;
    }

    for y_off in 0..=grid.height - recipe.height() {
        for x_off in 0..=grid.width - recipe.width() {
            if shaped_fits(recipe, grid, tags, usize::from(x_off), usize::from(y_off)) {
                return Some((x_off, y_off));
            }
        }
    }
    None
}

/// Assigns a grid cell to every shapeless ingredient.
///
/// Each ingredient in turn tries its alternatives in order and takes the
/// lowest-index unclaimed cell the first fitting alternative accepts. Claims
/// are never revisited, so an assignment that exists only under a different
/// claim order is not found. Every unclaimed cell must be empty.
#[must_use]
pub fn find_shapeless_assignment(
    recipe: &Recipe,
    grid: &GridSnapshot,
    tags: &TagCatalog,
) -> Option<Vec<usize>> {
    if !recipe.is_shapeless() {
        return None;
    }

    let mut claimed = vec![false; grid.cells.len()];
    let mut assignment = Vec::with_capacity(recipe.ingredients().len());

    for ingredient in recipe.ingredients() {
        let index = ingredient
            .alternatives()
            .iter()
            .filter_map(|alternative| resolve(alternative, tags))
            .find_map(|resolved| {
                grid.cells.iter().enumerate().position(|(index, item)| {
                    !claimed[index] && item.is_some_and(|item| resolved.accepts(item))
                })
            })?;
        claimed[index] = true;
        assignment.push(index);
    }

    let leftovers = grid
        .cells
        .iter()
        .zip(&claimed)
        .any(|(item, &claimed)| item.is_some() && !claimed);
    (!leftovers).then_some(assignment)
}

/// Tests one recipe against a grid.
#[must_use]
pub fn match_recipe<'r>(
    recipe: &'r Recipe,
    grid: &GridSnapshot,
    tags: &TagCatalog,
) -> Option<RecipeMatch<'r>> {
    let placement = if recipe.is_shapeless() {
        Placement::Shapeless {
            cells: find_shapeless_assignment(recipe, grid, tags)?,
        }
    } else {
        let (x_off, y_off) = find_shaped_placement(recipe, grid, tags)?;
        Placement::Shaped { x_off, y_off }
    };

    Some(RecipeMatch {
        recipe,
        placement,
        grid_width: grid.width,
    })
}

/// Selects the lowest-ID recipe that matches the grid.
#[must_use]
pub fn select_recipe<'r>(
    registry: &'r RecipeRegistry,
    grid: &GridSnapshot,
    tags: &TagCatalog,
) -> Option<RecipeMatch<'r>> {
    registry
        .candidates(grid.occupied())
        .find_map(|recipe| match_recipe(recipe, grid, tags))
}
