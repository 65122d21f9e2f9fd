//! Item stacks as held by inventory slots.

use crate::ids::ItemId;
use serde::{Deserialize, Serialize};

/// A non-empty stack of one item type.
///
/// An empty slot is represented as `Option::<ItemStack>::None`, never as a
/// stack with a zero count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawItemStack")]
pub struct ItemStack {
    item: ItemId,
    count: u8,
}

#[derive(Deserialize)]
struct RawItemStack {
    item: ItemId,
    count: u8,
}

impl TryFrom<RawItemStack> for ItemStack {
    type Error = &'static str;

    fn try_from(raw: RawItemStack) -> Result<Self, Self::Error> {
        Self::new(raw.item, raw.count).ok_or("item stack count must be at least 1")
    }
}

impl ItemStack {
    /// Creates a stack, or `None` if `count` is zero.
    #[must_use]
    pub const fn new(item: ItemId, count: u8) -> Option<Self> {
        if count == 0 {
            None
        } else {
            Some(Self { item, count })
        }
    }

    /// Creates a stack holding a single item.
    #[must_use]
    pub const fn one(item: ItemId) -> Self {
        Self { item, count: 1 }
    }

    /// Item type held by this stack.
    #[must_use]
    pub const fn item(&self) -> ItemId {
        self.item
    }

    /// Number of items in this stack (always at least one).
    #[must_use]
    pub const fn count(&self) -> u8 {
        self.count
    }

    /// Removes one item. Returns `None` if the stack became empty.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        Self::new(self.item, self.count - 1)
    }
}
