//! Item and tag catalogs.
//!
//! The item catalog maps bare item names to numeric IDs and is only consulted
//! while recipes load. The tag catalog maps tag names to item sets and is
//! consulted on every match, through a [`TagCatalogHandle`] whose snapshot can
//! be swapped while grids keep matching against the previous one.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use lattice_common::{strip_namespace, ItemId};
use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while reading catalog documents.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failed to read the document.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not the expected JSON shape.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// An item name that has no entry in the item catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown item `{name}`")]
pub struct UnresolvedItem {
    /// The name as written in the data, namespace included.
    pub name: String,
}

/// Lookup from bare item name to item ID.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    by_name: AHashMap<String, ItemId>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of `name -> id`.
    pub fn from_json_str(input: &str) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, u16> = serde_json::from_str(input)?;
        Ok(raw
            .into_iter()
            .map(|(name, id)| (name, ItemId::new(id)))
            .collect())
    }

    /// Reads and parses a JSON item catalog file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Registers an item. Any namespace on `name` is dropped.
    pub fn insert(&mut self, name: &str, id: ItemId) {
        self.by_name.insert(strip_namespace(name).to_owned(), id);
    }

    /// Looks up an item by (optionally namespaced) name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ItemId> {
        self.by_name.get(strip_namespace(name)).copied()
    }

    /// Resolves a name, failing with the original spelling if it is unknown.
    pub fn resolve(&self, name: &str) -> Result<ItemId, UnresolvedItem> {
        self.get(name).ok_or_else(|| UnresolvedItem {
            name: name.to_owned(),
        })
    }

    /// Number of known items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if no items are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, ItemId)> for ItemCatalog {
    fn from_iter<I: IntoIterator<Item = (S, ItemId)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (name, id) in iter {
            catalog.insert(name.as_ref(), id);
        }
        catalog
    }
}

/// A tag member as written in a tag document.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTagMember {
    Id(u16),
    Name(String),
}

/// Lookup from tag name to the set of items carrying that tag.
#[derive(Debug, Clone, Default)]
pub struct TagCatalog {
    tags: AHashMap<String, AHashSet<ItemId>>,
}

impl TagCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object of `tag -> [member, ...]`.
    ///
    /// Members are item names (resolved through `items`) or raw numeric IDs.
    /// Unknown member names are skipped with a warning.
    pub fn from_json_str(input: &str, items: &ItemCatalog) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, Vec<RawTagMember>> = serde_json::from_str(input)?;
        let mut catalog = Self::new();

        for (tag, members) in raw {
            let resolved: Vec<ItemId> = members
                .into_iter()
                .filter_map(|member| match member {
                    RawTagMember::Id(id) => Some(ItemId::new(id)),
                    RawTagMember::Name(name) => match items.resolve(&name) {
                        Ok(id) => Some(id),
                        Err(e) => {
                            warn!(tag = %tag, "Skipping tag member: {e}");
                            None
                        },
                    },
                })
                .collect();
            catalog.insert(&tag, resolved);
        }

        debug!("Parsed {} tags", catalog.len());
        Ok(catalog)
    }

    /// Reads and parses a JSON tag catalog file.
    pub fn from_file(path: impl AsRef<Path>, items: &ItemCatalog) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content, items)
    }

    /// Adds members to a tag, creating it if needed. Any namespace on `name`
    /// is dropped.
    pub fn insert(&mut self, name: &str, members: impl IntoIterator<Item = ItemId>) {
        self.tags
            .entry(strip_namespace(name).to_owned())
            .or_default()
            .extend(members);
    }

    /// Members of a tag, or `None` if the tag is unknown.
    #[must_use]
    pub fn members(&self, name: &str) -> Option<&AHashSet<ItemId>> {
        self.tags.get(strip_namespace(name))
    }

    /// Whether `item` carries the tag, or `None` if the tag is unknown.
    #[must_use]
    pub fn contains(&self, name: &str, item: ItemId) -> Option<bool> {
        self.members(name).map(|members| members.contains(&item))
    }

    /// The smallest member of a tag, used where a single concrete item must
    /// stand in for the whole tag.
    #[must_use]
    pub fn representative(&self, name: &str) -> Option<ItemId> {
        self.members(name)?.iter().min().copied()
    }

    /// Number of known tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if no tags are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Shared, swappable handle to the current tag catalog.
///
/// Readers take an `Arc` snapshot and match against it without holding the
/// lock; [`TagCatalogHandle::replace`] publishes a new catalog for every
/// later snapshot.
#[derive(Debug, Default)]
pub struct TagCatalogHandle {
    current: RwLock<Arc<TagCatalog>>,
}

impl TagCatalogHandle {
    /// Wraps an initial catalog.
    #[must_use]
    pub fn new(catalog: TagCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog as of now.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TagCatalog> {
        Arc::clone(&*self.current.read())
    }

    /// Publishes a new catalog and returns the previous one.
    pub fn replace(&self, catalog: TagCatalog) -> Arc<TagCatalog> {
        std::mem::replace(&mut *self.current.write(), Arc::new(catalog))
    }
}
