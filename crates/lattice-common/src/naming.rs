//! Namespaced identifier handling.
//!
//! Data packs refer to items and tags as `namespace:name`. Catalog lookups are
//! keyed by the bare name only.

/// Separator between a namespace and a bare name.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Returns the part of `id` after the first namespace separator, or `id`
/// unchanged when it carries no namespace.
#[must_use]
pub fn strip_namespace(id: &str) -> &str {
    match id.split_once(NAMESPACE_SEPARATOR) {
        Some((_, name)) => name,
        None => id,
    }
}
