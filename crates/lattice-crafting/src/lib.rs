//! # Lattice Crafting
//!
//! Crafting subsystem of the Lattice server.
//!
//! This crate provides:
//! - Item and tag catalogs
//! - Recipe model and the JSON recipe loader
//! - The immutable recipe registry
//! - Shaped and shapeless matching
//! - The per-inventory crafting grid controller
//! - Wire records for recipe book packets
//!
//! Data flows one way: the loader builds a [`RecipeRegistry`] once at
//! startup, grids share it through an `Arc` and match against it on every
//! mutation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod catalog;
pub mod grid;
pub mod loader;
pub mod matching;
pub mod recipe;
pub mod registry;
pub mod wire;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::catalog::*;
    pub use crate::grid::*;
    pub use crate::loader::*;
    pub use crate::matching::*;
    pub use crate::recipe::*;
    pub use crate::registry::*;
    pub use crate::wire::*;
}

pub use prelude::*;
