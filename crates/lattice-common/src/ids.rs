//! ID types for items and recipes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier for an item type, as assigned by the item catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u16);

impl ItemId {
    /// Creates an item ID from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a loaded recipe.
///
/// IDs are issued sequentially at load time starting at [`RecipeId::FIRST`].
/// The zero value is reserved and never names a real recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(u16);

impl RecipeId {
    /// Reserved ID, never assigned to a recipe.
    pub const NONE: Self = Self(0);

    /// First ID handed out by the loader.
    pub const FIRST: Self = Self(1);

    /// Largest representable recipe ID.
    pub const MAX: Self = Self(u16::MAX);

    /// Creates a recipe ID from a raw value.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Checks if this is a real (non-reserved) recipe ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// The ID following this one, or `None` when the ID space is exhausted.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
