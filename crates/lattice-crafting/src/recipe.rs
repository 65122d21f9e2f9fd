//! Recipe model: ingredient references, ingredient cells and recipes.

use lattice_common::{strip_namespace, ItemId, RecipeId};
use thiserror::Error;

/// Reasons a recipe cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    /// Result count must be at least one.
    #[error("result count must be at least 1")]
    ZeroResultCount,

    /// Shaped recipes need a non-empty area.
    #[error("shaped recipe has zero dimension ({width}x{height})")]
    ZeroDimension {
        /// Declared width
        width: u8,
        /// Declared height
        height: u8,
    },

    /// Shaped ingredient count must equal the pattern area.
    #[error("shaped recipe has {actual} ingredient cells, expected {expected}")]
    AreaMismatch {
        /// `width * height`
        expected: usize,
        /// Cells supplied
        actual: usize,
    },

    /// Every recipe needs at least one non-empty ingredient cell.
    #[error("recipe has no ingredients")]
    NoIngredients,

    /// A shapeless ingredient with no alternatives could never be satisfied.
    #[error("shapeless ingredient {index} has no alternatives")]
    EmptyIngredient {
        /// Position of the ingredient in declaration order
        index: usize,
    },
}

/// One acceptable way to satisfy an ingredient cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    /// Exactly this item.
    Item(ItemId),
    /// Any member of the named tag, looked up when matching.
    Tag(String),
}

impl ItemRef {
    /// Reference to a tag. Any namespace on `name` is dropped.
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self::Tag(strip_namespace(name).to_owned())
    }
}

impl From<ItemId> for ItemRef {
    fn from(item: ItemId) -> Self {
        Self::Item(item)
    }
}

/// A single position in a recipe: an ordered list of alternatives, any one
/// of which satisfies it. No alternatives means the position must be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct IngredientCell {
    alternatives: Vec<ItemRef>,
}

impl IngredientCell {
    /// A cell that requires an empty grid position.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            alternatives: Vec::new(),
        }
    }

    /// A cell accepting any of `alternatives`, tried in order.
    #[must_use]
    pub fn any_of(alternatives: Vec<ItemRef>) -> Self {
        Self { alternatives }
    }

    /// A cell accepting exactly one item.
    #[must_use]
    pub fn item(item: ItemId) -> Self {
        Self::any_of(vec![ItemRef::Item(item)])
    }

    /// A cell accepting any member of one tag.
    #[must_use]
    pub fn tag(name: &str) -> Self {
        Self::any_of(vec![ItemRef::tag(name)])
    }

    /// Alternatives in declaration order.
    #[must_use]
    pub fn alternatives(&self) -> &[ItemRef] {
        &self.alternatives
    }

    /// True if this cell requires an empty grid position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }
}

/// Whether ingredients must sit in a fixed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeShape {
    /// Ingredients occupy a `width x height` pattern, row-major.
    Shaped {
        /// Pattern width
        width: u8,
        /// Pattern height
        height: u8,
    },
    /// Ingredients may be anywhere in the grid.
    Shapeless,
}

/// A validated crafting recipe.
///
/// Recipes carry [`RecipeId::NONE`] until a registry issues them an ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    id: RecipeId,
    shape: RecipeShape,
    ingredients: Vec<IngredientCell>,
    result: ItemId,
    result_count: u8,
}

impl Recipe {
    /// Builds a shaped recipe. `ingredients` are row-major, must cover
    /// exactly `width * height` cells and may not all be empty.
    pub fn shaped(
        width: u8,
        height: u8,
        ingredients: Vec<IngredientCell>,
        result: ItemId,
        result_count: u8,
    ) -> Result<Self, RecipeError> {
        if result_count == 0 {
            return Err(RecipeError::ZeroResultCount);
        }
        if width == 0 || height == 0 {
            return Err(RecipeError::ZeroDimension { width, height });
        }
        let expected = usize::from(width) * usize::from(height);
        if ingredients.len() != expected {
            return Err(RecipeError::AreaMismatch {
                expected,
                actual: ingredients.len(),
            });
        }
        if ingredients.iter().all(IngredientCell::is_empty) {
            return Err(RecipeError::NoIngredients);
        }

        Ok(Self {
            id: RecipeId::NONE,
            shape: RecipeShape::Shaped { width, height },
            ingredients,
            result,
            result_count,
        })
    }

    /// Builds a shapeless recipe. Every ingredient needs at least one
    /// alternative.
    pub fn shapeless(
        ingredients: Vec<IngredientCell>,
        result: ItemId,
        result_count: u8,
    ) -> Result<Self, RecipeError> {
        if result_count == 0 {
            return Err(RecipeError::ZeroResultCount);
        }
        if ingredients.is_empty() {
            return Err(RecipeError::NoIngredients);
        }
        if let Some(index) = ingredients.iter().position(IngredientCell::is_empty) {
            return Err(RecipeError::EmptyIngredient { index });
        }

        Ok(Self {
            id: RecipeId::NONE,
            shape: RecipeShape::Shapeless,
            ingredients,
            result,
            result_count,
        })
    }

    pub(crate) fn with_id(mut self, id: RecipeId) -> Self {
        self.id = id;
        self
    }

    /// Registry-issued ID, or [`RecipeId::NONE`] if unregistered.
    #[must_use]
    pub fn id(&self) -> RecipeId {
        self.id
    }

    /// Shape of the recipe.
    #[must_use]
    pub fn shape(&self) -> RecipeShape {
        self.shape
    }

    /// True for shapeless recipes.
    #[must_use]
    pub fn is_shapeless(&self) -> bool {
        matches!(self.shape, RecipeShape::Shapeless)
    }

    /// Pattern width (0 for shapeless recipes).
    #[must_use]
    pub fn width(&self) -> u8 {
        match self.shape {
            RecipeShape::Shaped { width, .. } => width,
            RecipeShape::Shapeless => 0,
        }
    }

    /// Pattern height (0 for shapeless recipes).
    #[must_use]
    pub fn height(&self) -> u8 {
        match self.shape {
            RecipeShape::Shaped { height, .. } => height,
            RecipeShape::Shapeless => 0,
        }
    }

    /// Ingredient cells: row-major for shaped, declaration order otherwise.
    #[must_use]
    pub fn ingredients(&self) -> &[IngredientCell] {
        &self.ingredients
    }

    /// Item produced.
    #[must_use]
    pub fn result(&self) -> ItemId {
        self.result
    }

    /// Number of items produced per craft.
    #[must_use]
    pub fn result_count(&self) -> u8 {
        self.result_count
    }

    /// Number of grid cells that hold an item whenever this recipe matches.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.ingredients.iter().filter(|cell| !cell.is_empty()).count()
    }
}
