//! # Lattice Common
//!
//! Common types shared across the Lattice server crates.
//!
//! This crate provides foundational types used by every subsystem:
//! - ID types (`ItemId`, `RecipeId`)
//! - Item stacks as stored in inventory slots
//! - Namespaced identifier handling

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ids;
pub mod item;
pub mod naming;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::item::*;
    pub use crate::naming::*;
}

pub use prelude::*;
