//! Binary recipe records for the network layer.
//!
//! Record layout (VarInt = 7-bit little-endian groups, string = VarInt length
//! followed by UTF-8):
//!
//! | Field | Encoding |
//! |---|---|
//! | recipe ID | string, decimal |
//! | shapeless | VarInt 0/1 |
//! | group | string |
//! | category | VarInt |
//! | shaped body | width, height, `width * height` ingredients, result, notification byte |
//! | shapeless body | count, `count` ingredients, result |
//!
//! An ingredient is VarInt 1 followed by a slot. A slot is a VarInt count
//! and, when the count is positive, the item ID and two zero component
//! counts.
//!
//! Ingredient alternatives cannot be expressed: each cell is projected onto
//! one representative item, see [`WireRecipe::from_recipe`].

use lattice_common::{ItemId, ItemStack, RecipeId};
use thiserror::Error;

use crate::catalog::TagCatalog;
use crate::recipe::{IngredientCell, ItemRef, Recipe, RecipeShape};
use crate::registry::RecipeRegistry;

/// Group written for every crafting recipe.
pub const RECIPE_GROUP: &str = "Craft";

/// Longest VarInt in bytes.
const MAX_VAR_INT_LEN: usize = 5;

/// Errors from decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Record ended mid-field.
    #[error("unexpected end of record")]
    UnexpectedEof,

    /// VarInt continues past five bytes.
    #[error("VarInt too long")]
    VarIntTooLong,

    /// String bytes are not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// A boolean field holds something other than 0 or 1.
    #[error("invalid flag value {0}")]
    InvalidFlag(i32),

    /// Unknown crafting category.
    #[error("invalid category {0}")]
    InvalidCategory(i32),

    /// Recipe ID string is not a valid ID.
    #[error("invalid recipe ID `{0}`")]
    InvalidRecipeId(String),

    /// A numeric field is outside its allowed range.
    #[error("{field} out of range: {value}")]
    OutOfRange {
        /// Field name
        field: &'static str,
        /// Decoded value
        value: i32,
    },

    /// Bytes remain after the record.
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}

/// Recipe book tab a recipe is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CraftingCategory {
    /// Building blocks.
    #[default]
    Building,
    /// Redstone components.
    Redstone,
    /// Tools, weapons and armor.
    Equipment,
    /// Everything else.
    Misc,
}

impl CraftingCategory {
    /// Wire value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Building => 0,
            Self::Redstone => 1,
            Self::Equipment => 2,
            Self::Misc => 3,
        }
    }

    /// Parses a wire value.
    #[must_use]
    pub const fn from_raw(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Building),
            1 => Some(Self::Redstone),
            2 => Some(Self::Equipment),
            3 => Some(Self::Misc),
            _ => None,
        }
    }
}

/// Appends a VarInt.
pub fn write_var_int(buf: &mut Vec<u8>, value: i32) {
    let mut value = value as u32;
    loop {
        if value & !0x7F == 0 {
            buf.push(value as u8);
            return;
        }
        buf.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
}

/// Appends a length-prefixed UTF-8 string.
pub fn write_string(buf: &mut Vec<u8>, value: &str) {
    write_var_int(buf, value.len() as i32);
    buf.extend_from_slice(value.as_bytes());
}

fn write_slot(buf: &mut Vec<u8>, slot: Option<ItemStack>) {
    match slot {
        None => write_var_int(buf, 0),
        Some(stack) => {
            write_var_int(buf, i32::from(stack.count()));
            write_var_int(buf, i32::from(stack.item().raw()));
            // Components to add, components to remove.
            write_var_int(buf, 0);
            write_var_int(buf, 0);
        },
    }
}

/// Cursor over a record.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Starts reading at the beginning of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        let byte = *self.data.get(self.pos).ok_or(WireError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    /// Reads a VarInt.
    pub fn read_var_int(&mut self) -> Result<i32, WireError> {
        let mut value: u32 = 0;
        for index in 0..MAX_VAR_INT_LEN {
            let byte = self.read_u8()?;
            value |= u32::from(byte & 0x7F) << (7 * index);
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }
        Err(WireError::VarIntTooLong)
    }

    /// Reads a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String, WireError> {
        let len = self.read_var_int()?;
        let len = usize::try_from(len).map_err(|_| WireError::OutOfRange {
            field: "string length",
            value: len,
        })?;
        let end = self.pos.checked_add(len).ok_or(WireError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(WireError::UnexpectedEof)?;
        self.pos = end;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }

    fn read_flag(&mut self) -> Result<bool, WireError> {
        match self.read_var_int()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::InvalidFlag(other)),
        }
    }

    fn read_bounded(&mut self, field: &'static str, max: i32) -> Result<i32, WireError> {
        let value = self.read_var_int()?;
        if (0..=max).contains(&value) {
            Ok(value)
        } else {
            Err(WireError::OutOfRange { field, value })
        }
    }

    fn read_slot(&mut self) -> Result<Option<ItemStack>, WireError> {
        let count = self.read_bounded("slot count", i32::from(u8::MAX))?;
        if count == 0 {
            return Ok(None);
        }
        let item = self.read_bounded("item id", i32::from(u16::MAX))?;
        self.read_bounded("components to add", 0)?;
        self.read_bounded("components to remove", 0)?;
        Ok(ItemStack::new(ItemId::new(item as u16), count as u8))
    }

    fn read_ingredient(&mut self) -> Result<Option<ItemStack>, WireError> {
        match self.read_var_int()? {
            1 => self.read_slot(),
            value => Err(WireError::OutOfRange {
                field: "ingredient option count",
                value,
            }),
        }
    }
}

/// A recipe as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecipe {
    /// Recipe ID.
    pub id: RecipeId,
    /// Recipe book group.
    pub group: String,
    /// Recipe book category.
    pub category: CraftingCategory,
    /// Pattern dimensions or shapeless.
    pub shape: RecipeShape,
    /// One representative per ingredient cell.
    pub ingredients: Vec<Option<ItemStack>>,
    /// Crafted stack.
    pub result: Option<ItemStack>,
    /// Whether unlocking shows a toast (shaped only).
    pub show_notification: bool,
}

/// Picks the single item a cell is shown as.
///
/// The first concrete item wins. Failing that, the first tag known to `tags`
/// with at least one member contributes its smallest member. Cells with
/// neither are sent empty.
fn representative(cell: &IngredientCell, tags: &TagCatalog) -> Option<ItemStack> {
    let alternatives = cell.alternatives();
    alternatives
        .iter()
        .find_map(|alternative| match alternative {
            ItemRef::Item(item) => Some(*item),
            ItemRef::Tag(_) => None,
        })
        .or_else(|| {
            alternatives.iter().find_map(|alternative| match alternative {
                ItemRef::Tag(name) => tags.representative(name),
                ItemRef::Item(_) => None,
            })
        })
        .map(ItemStack::one)
}

impl WireRecipe {
    /// Projects a loaded recipe onto the wire model.
    #[must_use]
    pub fn from_recipe(recipe: &Recipe, tags: &TagCatalog) -> Self {
        Self {
            id: recipe.id(),
            group: RECIPE_GROUP.to_owned(),
            category: CraftingCategory::Building,
            shape: recipe.shape(),
            ingredients: recipe
                .ingredients()
                .iter()
                .map(|cell| representative(cell, tags))
                .collect(),
            result: ItemStack::new(recipe.result(), recipe.result_count()),
            show_notification: false,
        }
    }

    /// Appends the record to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        write_string(buf, &self.id.to_string());
        write_var_int(buf, i32::from(matches!(self.shape, RecipeShape::Shapeless)));
        write_string(buf, &self.group);
        write_var_int(buf, self.category.raw());

        match self.shape {
            RecipeShape::Shaped { width, height } => {
                write_var_int(buf, i32::from(width));
                write_var_int(buf, i32::from(height));
                for ingredient in &self.ingredients {
                    write_var_int(buf, 1);
                    write_slot(buf, *ingredient);
                }
                write_slot(buf, self.result);
                buf.push(u8::from(self.show_notification));
            },
            RecipeShape::Shapeless => {
                write_var_int(buf, self.ingredients.len() as i32);
                for ingredient in &self.ingredients {
                    write_var_int(buf, 1);
                    write_slot(buf, *ingredient);
                }
                write_slot(buf, self.result);
            },
        }
    }

    /// Decodes exactly one record.
    pub fn decode(data: &[u8]) -> Result<Self, WireError> {
        let mut reader = Reader::new(data);
        let recipe = Self::read(&mut reader)?;
        match reader.remaining() {
            0 => Ok(recipe),
            extra => Err(WireError::TrailingBytes(extra)),
        }
    }

    /// Reads one record from `reader`.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self, WireError> {
        let id_text = reader.read_string()?;
        let id = id_text
            .parse::<u16>()
            .ok()
            .map(RecipeId::new)
            .filter(|id| id.is_valid())
            .ok_or(WireError::InvalidRecipeId(id_text))?;
        let shapeless = reader.read_flag()?;
        let group = reader.read_string()?;
        let raw_category = reader.read_var_int()?;
        let category =
            CraftingCategory::from_raw(raw_category).ok_or(WireError::InvalidCategory(raw_category))?;

        let (shape, count) = if shapeless {
            let count = reader.read_bounded("ingredient count", i32::MAX)? as usize;
            (RecipeShape::Shapeless, count)
        } else {
            let width = reader.read_bounded("width", i32::from(u8::MAX))? as u8;
            let height = reader.read_bounded("height", i32::from(u8::MAX))? as u8;
            let count = usize::from(width) * usize::from(height);
            (RecipeShape::Shaped { width, height }, count)
        };

        // Every ingredient takes at least two bytes.
        let mut ingredients = Vec::with_capacity(count.min(reader.remaining() / 2));
        for _ in 0..count {
            ingredients.push(reader.read_ingredient()?);
        }
        let result = reader.read_slot()?;

        let show_notification = match shape {
            RecipeShape::Shaped { .. } => match reader.read_u8()? {
                0 => false,
                1 => true,
                other => return Err(WireError::InvalidFlag(i32::from(other))),
            },
            RecipeShape::Shapeless => false,
        };

        Ok(Self {
            id,
            group,
            category,
            shape,
            ingredients,
            result,
            show_notification,
        })
    }
}

/// Encodes one recipe.
#[must_use]
pub fn encode_recipe(recipe: &Recipe, tags: &TagCatalog) -> Vec<u8> {
    let mut buf = Vec::new();
    WireRecipe::from_recipe(recipe, tags).encode(&mut buf);
    buf
}

/// Decodes one recipe record.
pub fn decode_recipe(data: &[u8]) -> Result<WireRecipe, WireError> {
    WireRecipe::decode(data)
}

/// Encodes every recipe in ID order, one record each.
#[must_use]
pub fn encode_registry(registry: &RecipeRegistry, tags: &TagCatalog) -> Vec<Vec<u8>> {
    registry
        .iter()
        .map(|recipe| encode_recipe(recipe, tags))
        .collect()
}
