//! Recipe document loading.
//!
//! A recipe document is a JSON array of entries:
//!
//! ```json
//! [
//!   {
//!     "shaped": true,
//!     "pattern": ["#", "#"],
//!     "key": { "#": { "tag": "minecraft:planks" } },
//!     "result": { "id": "minecraft:stick", "count": 4 }
//!   },
//!   {
//!     "shaped": false,
//!     "ingredients": [{ "item": "minecraft:oak_log" }],
//!     "result": { "id": "minecraft:oak_planks", "count": 4 }
//!   }
//! ]
//! ```
//!
//! An unreadable document aborts loading. A bad entry is skipped and loading
//! carries on with the next one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ahash::AHashMap;
use lattice_common::ItemId;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::catalog::{ItemCatalog, UnresolvedItem};
use crate::recipe::{IngredientCell, ItemRef, Recipe, RecipeError};
use crate::registry::{IdSpaceExhausted, RecipeRegistry, RecipeRegistryBuilder};

/// Errors that stop loading.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the document.
    #[error("failed to read recipe document: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON.
    #[error("failed to parse recipe document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Top level of the document is not an array.
    #[error("recipe document is not a list")]
    NotAList,

    /// Ran out of recipe IDs; recipes loaded so far are kept.
    #[error(transparent)]
    IdSpaceExhausted(#[from] IdSpaceExhausted),
}

/// Reasons a single entry is skipped.
#[derive(Debug, Error)]
pub enum EntryError {
    /// A field has the wrong type, or the entry is not an object.
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A mandatory field is absent.
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    /// Result count outside `1..=255`.
    #[error("invalid result count {0}")]
    InvalidResultCount(u64),

    /// An item name is not in the item catalog.
    #[error(transparent)]
    UnresolvedItem(#[from] UnresolvedItem),

    /// A tag reference with nothing after the namespace.
    #[error("empty tag name `{0}`")]
    EmptyTagName(String),

    /// Pattern has no rows, or its first row is empty.
    #[error("empty pattern")]
    EmptyPattern,

    /// A pattern row differs in length from the first row.
    #[error("pattern row {row} has {actual} symbols, expected {expected}")]
    RaggedPattern {
        /// Index of the offending row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        actual: usize,
    },

    /// Pattern dimensions do not fit in a byte.
    #[error("pattern is {width}x{height}, larger than 255x255")]
    PatternTooLarge {
        /// Symbols per row
        width: usize,
        /// Number of rows
        height: usize,
    },

    /// The assembled recipe is invalid.
    #[error(transparent)]
    Recipe(#[from] RecipeError),
}

/// An entry that was skipped, with its position in the document.
#[derive(Debug)]
pub struct RejectedEntry {
    /// Zero-based position in the document.
    pub index: usize,
    /// Why it was skipped.
    pub reason: EntryError,
}

/// Everything a load produced.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Recipes that loaded.
    pub registry: RecipeRegistry,
    /// Entries that were skipped.
    pub rejected: Vec<RejectedEntry>,
    /// Set when loading aborted or stopped early.
    pub error: Option<LoadError>,
}

impl LoadOutcome {
    fn failed(error: LoadError) -> Self {
        error!("Recipe loading aborted: {error}");
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns true if every entry loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.rejected.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    result: Option<RawResult>,
    shaped: Option<bool>,
    pattern: Option<Vec<String>>,
    key: Option<BTreeMap<String, Value>>,
    ingredients: Option<Vec<RawIngredient>>,
}

#[derive(Debug, Deserialize)]
struct RawResult {
    id: Option<String>,
    count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawIngredient {
    One(RawItemRef),
    Any(Vec<RawItemRef>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawItemRef {
    Item { item: String },
    Tag { tag: String },
}

/// Loads recipes from a JSON string.
pub fn load_recipes_from_str(input: &str, items: &ItemCatalog) -> LoadOutcome {
    load_into(RecipeRegistryBuilder::new(), input, items)
}

/// Loads recipes from a JSON file.
pub fn load_recipes_from_file(path: impl AsRef<Path>, items: &ItemCatalog) -> LoadOutcome {
    let path = path.as_ref();
    info!("Loading recipes from {:?}", path);

    match fs::read_to_string(path) {
        Ok(content) => load_recipes_from_str(&content, items),
        Err(e) => LoadOutcome::failed(LoadError::Io(e)),
    }
}

pub(crate) fn load_into(
    mut builder: RecipeRegistryBuilder,
    input: &str,
    items: &ItemCatalog,
) -> LoadOutcome {
    let entries = match serde_json::from_str::<Value>(input) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => return LoadOutcome::failed(LoadError::NotAList),
        Err(e) => return LoadOutcome::failed(LoadError::Parse(e)),
    };

    let mut rejected = Vec::new();
    let mut failure = None;

    for (index, entry) in entries.into_iter().enumerate() {
        match parse_entry(entry, items) {
            Ok(recipe) => {
                if let Err(e) = builder.push(recipe) {
                    error!("Stopping at recipe entry {index}: {e}");
                    failure = Some(LoadError::IdSpaceExhausted(e));
                    break;
                }
            },
            Err(reason) => {
                warn!("Skipping recipe entry {index}: {reason}");
                rejected.push(RejectedEntry { index, reason });
            },
        }
    }

    info!(
        "Loaded {} recipes ({} rejected)",
        builder.len(),
        rejected.len()
    );

    LoadOutcome {
        registry: builder.build(),
        rejected,
        error: failure,
    }
}

fn parse_entry(entry: Value, items: &ItemCatalog) -> Result<Recipe, EntryError> {
    let raw: RawEntry = serde_json::from_value(entry)?;

    let result = raw.result.ok_or(EntryError::MissingField("result"))?;
    let result_name = result.id.ok_or(EntryError::MissingField("result.id"))?;
    let count = result.count.ok_or(EntryError::MissingField("result.count"))?;
    let result_count = u8::try_from(count)
        .ok()
        .filter(|&count| count > 0)
        .ok_or(EntryError::InvalidResultCount(count))?;
    let result_item = items.resolve(&result_name)?;

    if raw.shaped.ok_or(EntryError::MissingField("shaped"))? {
        let pattern = raw.pattern.ok_or(EntryError::MissingField("pattern"))?;
        let key = raw.key.ok_or(EntryError::MissingField("key"))?;
        parse_shaped(&pattern, key, items, result_item, result_count)
    } else {
        let ingredients = raw
            .ingredients
            .ok_or(EntryError::MissingField("ingredients"))?
            .into_iter()
            .map(|ingredient| resolve_ingredient(ingredient, items).map(IngredientCell::any_of))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Recipe::shapeless(ingredients, result_item, result_count)?)
    }
}

fn parse_shaped(
    pattern: &[String],
    key: BTreeMap<String, Value>,
    items: &ItemCatalog,
    result: ItemId,
    result_count: u8,
) -> Result<Recipe, EntryError> {
    let rows: Vec<Vec<char>> = pattern.iter().map(|row| row.chars().collect()).collect();
    let width = rows.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(EntryError::EmptyPattern);
    }
    if let Some((row, cells)) = rows.iter().enumerate().find(|(_, cells)| cells.len() != width) {
        return Err(EntryError::RaggedPattern {
            row,
            expected: width,
            actual: cells.len(),
        });
    }
    let (Ok(recipe_width), Ok(recipe_height)) = (u8::try_from(width), u8::try_from(rows.len()))
    else {
        return Err(EntryError::PatternTooLarge {
            width,
            height: rows.len(),
        });
    };

    let mut symbols: AHashMap<char, IngredientCell> = AHashMap::new();
    for (symbol, value) in key {
        let mut chars = symbol.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let ingredient: RawIngredient = serde_json::from_value(value)?;
                symbols.insert(c, IngredientCell::any_of(resolve_ingredient(ingredient, items)?));
            },
            _ => warn!(symbol = %symbol, "Ignoring key that is not a single symbol"),
        }
    }

    let cells = rows
        .iter()
        .flatten()
        .map(|&symbol| {
            if symbol == ' ' {
                return IngredientCell::empty();
            }
            symbols.get(&symbol).cloned().unwrap_or_else(|| {
                warn!(%symbol, "Pattern symbol has no key entry, treating as empty");
                IngredientCell::empty()
            })
        })
        .collect();

    Ok(Recipe::shaped(
        recipe_width,
        recipe_height,
        cells,
        result,
        result_count,
    )?)
}

fn resolve_ingredient(
    ingredient: RawIngredient,
    items: &ItemCatalog,
) -> Result<Vec<ItemRef>, EntryError> {
    let refs = match ingredient {
        RawIngredient::One(item_ref) => vec![item_ref],
        RawIngredient::Any(item_refs) => item_refs,
    };

    refs.into_iter()
        .map(|item_ref| match item_ref {
            RawItemRef::Item { item } => Ok(ItemRef::Item(items.resolve(&item)?)),
            RawItemRef::Tag { tag } => match ItemRef::tag(&tag) {
                ItemRef::Tag(name) if name.is_empty() => Err(EntryError::EmptyTagName(tag)),
                resolved => Ok(resolved),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeShape;
    use lattice_common::RecipeId;

    fn items() -> ItemCatalog {
        [
            ("oak_log", ItemId::new(10)),
            ("oak_planks", ItemId::new(30)),
            ("stick", ItemId::new(20)),
            ("torch", ItemId::new(40)),
            ("coal", ItemId::new(50)),
        ]
        .into_iter()
        .collect()
    }

    const PLANKS_FROM_LOG: &str = r#"{
        "shaped": false,
        "ingredients": [{"item": "minecraft:oak_log"}],
        "result": {"id": "minecraft:oak_planks", "count": 4}
    }"#;

    fn document(entries: &[&str]) -> String {
        format!("[{}]", entries.join(","))
    }

    #[test]
    fn test_load_shaped_recipe() {
        let input = document(&[r##"{
            "shaped": true,
            "pattern": ["C", "#"],
            "key": {
                "C": [{"item": "coal"}, {"tag": "minecraft:coals"}],
                "#": {"item": "stick"}
            },
            "result": {"id": "torch", "count": 4},
            "category": "misc"
        }"##]);
        let outcome = load_recipes_from_str(&input, &items());
        assert!(outcome.is_clean());

        let recipe = outcome.registry.get(RecipeId::FIRST).expect("loaded");
        assert_eq!(recipe.shape(), RecipeShape::Shaped { width: 1, height: 2 });
        assert_eq!(recipe.result(), ItemId::new(40));
        assert_eq!(recipe.result_count(), 4);
        assert_eq!(
            recipe.ingredients()[0].alternatives(),
            &[ItemRef::Item(ItemId::new(50)), ItemRef::Tag("coals".to_owned())]
        );
        assert_eq!(
            recipe.ingredients()[1].alternatives(),
            &[ItemRef::Item(ItemId::new(20))]
        );
    }

    #[test]
    fn test_spaces_and_unmapped_symbols_are_empty() {
        let input = document(&[r##"{
            "shaped": true,
            "pattern": ["# ", "#X"],
            "key": {"#": {"item": "stick"}, "long": {"item": "coal"}},
            "result": {"id": "torch", "count": 1}
        }"##]);
        let outcome = load_recipes_from_str(&input, &items());
        assert!(outcome.is_clean());

        let recipe = outcome.registry.get(RecipeId::FIRST).expect("loaded");
        let empty: Vec<bool> = recipe.ingredients().iter().map(IngredientCell::is_empty).collect();
        assert_eq!(empty, vec![false, true, false, true]);
    }

    #[test]
    fn test_ids_follow_document_order_skipping_rejects() {
        let bad = r#"{"shaped": false, "ingredients": [{"item": "diamond"}],
                      "result": {"id": "stick", "count": 1}}"#;
        let outcome = load_recipes_from_str(&document(&[PLANKS_FROM_LOG, bad, PLANKS_FROM_LOG]), &items());

        assert_eq!(outcome.registry.len(), 2);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].index, 1);
        assert!(matches!(
            &outcome.rejected[0].reason,
            EntryError::UnresolvedItem(e) if e.name == "diamond"
        ));
        let ids: Vec<u16> = outcome.registry.iter().map(|r| r.id().raw()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_entry_rejections() {
        let cases = [
            (r#"{"shaped": false, "ingredients": []}"#, "missing field `result`"),
            (r#"{"shaped": false, "ingredients": [], "result": {"count": 1}}"#, "missing field `result.id`"),
            (r#"{"ingredients": [{"item": "coal"}], "result": {"id": "torch", "count": 1}}"#, "missing field `shaped`"),
            (r#"{"shaped": true, "key": {}, "result": {"id": "torch", "count": 1}}"#, "missing field `pattern`"),
            (r#"{"shaped": false, "result": {"id": "torch", "count": 1}}"#, "missing field `ingredients`"),
            (r#"{"shaped": false, "ingredients": [{"item": "coal"}], "result": {"id": "torch", "count": 0}}"#, "invalid result count 0"),
            (r#"{"shaped": false, "ingredients": [{"item": "coal"}], "result": {"id": "torch", "count": 300}}"#, "invalid result count 300"),
            (r#"{"shaped": false, "ingredients": [{"tag": "minecraft:"}], "result": {"id": "torch", "count": 1}}"#, "empty tag name `minecraft:`"),
            (r#"{"shaped": true, "pattern": [], "key": {}, "result": {"id": "torch", "count": 1}}"#, "empty pattern"),
            (r#"{"shaped": false, "ingredients": [], "result": {"id": "torch", "count": 1}}"#, "recipe has no ingredients"),
            (r#"{"shaped": false, "ingredients": [[]], "result": {"id": "torch", "count": 1}}"#, "shapeless ingredient 0 has no alternatives"),
        ];

        for (entry, expected) in cases {
            let outcome = load_recipes_from_str(&document(&[entry]), &items());
            assert!(outcome.registry.is_empty(), "{entry}");
            assert_eq!(outcome.rejected.len(), 1, "{entry}");
            assert_eq!(outcome.rejected[0].reason.to_string(), expected);
        }
    }

    #[test]
    fn test_wrong_types_are_malformed() {
        let cases = [
            r#"{"shaped": "yes", "ingredients": [], "result": {"id": "torch", "count": 1}}"#,
            r#"{"shaped": false, "ingredients": [{"item": "coal"}], "result": {"id": "torch", "count": -1}}"#,
            r#"{"shaped": false, "ingredients": [{"item": 5}], "result": {"id": "torch", "count": 1}}"#,
            r##"{"shaped": true, "pattern": ["#"], "key": {"#": "stick"}, "result": {"id": "torch", "count": 1}}"##,
            "42",
        ];

        for entry in cases {
            let outcome = load_recipes_from_str(&document(&[entry]), &items());
            assert!(
                matches!(outcome.rejected.as_slice(), [RejectedEntry { reason: EntryError::Malformed(_), .. }]),
                "{entry}"
            );
        }
    }

    #[test]
    fn test_long_key_skipped_before_its_value_is_read() {
        let input = document(&[r##"{
            "shaped": true,
            "pattern": ["#"],
            "key": {"#": {"item": "stick"}, "long": "coal", "": 7},
            "result": {"id": "torch", "count": 1}
        }"##]);
        let outcome = load_recipes_from_str(&input, &items());
        assert!(outcome.is_clean());

        let recipe = outcome.registry.get(RecipeId::FIRST).expect("loaded");
        assert_eq!(
            recipe.ingredients()[0].alternatives(),
            &[ItemRef::Item(ItemId::new(20))]
        );
    }

    #[test]
    fn test_blank_shaped_recipe_rejected() {
        let cases = [
            r#"{"shaped": true, "pattern": ["X"], "key": {}, "result": {"id": "torch", "count": 4}}"#,
            r#"{"shaped": true, "pattern": ["  ", "  "], "key": {}, "result": {"id": "torch", "count": 4}}"#,
        ];

        for entry in cases {
            let outcome = load_recipes_from_str(&document(&[entry]), &items());
            assert!(outcome.registry.is_empty(), "{entry}");
            assert!(
                matches!(
                    outcome.rejected.as_slice(),
                    [RejectedEntry { reason: EntryError::Recipe(RecipeError::NoIngredients), .. }]
                ),
                "{entry}"
            );
        }
    }

    #[test]
    fn test_ragged_pattern_rejected() {
        let input = document(&[r###"{
            "shaped": true,
            "pattern": ["##", "#"],
            "key": {"#": {"item": "stick"}},
            "result": {"id": "torch", "count": 1}
        }"###]);
        let outcome = load_recipes_from_str(&input, &items());
        assert!(matches!(
            outcome.rejected[0].reason,
            EntryError::RaggedPattern { row: 1, expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_document_fatal_errors() {
        let outcome = load_recipes_from_str("{not json", &items());
        assert!(matches!(outcome.error, Some(LoadError::Parse(_))));
        assert!(outcome.registry.is_empty());

        let outcome = load_recipes_from_str(r#"{"recipes": []}"#, &items());
        assert!(matches!(outcome.error, Some(LoadError::NotAList)));
        assert!(outcome.registry.is_empty());
    }

    #[test]
    fn test_id_exhaustion_keeps_loaded_recipes() {
        let input = document(&[PLANKS_FROM_LOG, PLANKS_FROM_LOG, PLANKS_FROM_LOG]);
        let outcome = load_into(
            RecipeRegistryBuilder::starting_at(RecipeId::new(u16::MAX - 1)),
            &input,
            &items(),
        );

        assert_eq!(outcome.registry.len(), 2);
        assert!(outcome.registry.get(RecipeId::MAX).is_some());
        assert!(matches!(outcome.error, Some(LoadError::IdSpaceExhausted(_))));
    }

    #[test]
    fn test_exhaustion_not_reported_without_another_recipe() {
        let bad = r#"{"shaped": false}"#;
        let input = document(&[PLANKS_FROM_LOG, bad]);
        let outcome = load_into(
            RecipeRegistryBuilder::starting_at(RecipeId::MAX),
            &input,
            &items(),
        );

        assert_eq!(outcome.registry.len(), 1);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.rejected.len(), 1);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let outcome = load_recipes_from_file(dir.path().join("absent.json"), &items());
        assert!(matches!(outcome.error, Some(LoadError::Io(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("recipes.json");
        fs::write(&path, document(&[PLANKS_FROM_LOG])).expect("write");

        let outcome = load_recipes_from_file(&path, &items());
        assert!(outcome.is_clean());
        assert_eq!(outcome.registry.len(), 1);
    }
}
