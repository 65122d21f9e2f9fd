//! # Lattice Server
//!
//! Server-side bootstrap for the crafting subsystem.
//!
//! This crate provides:
//! - `lattice.toml` configuration
//! - Loading of the item, tag and recipe documents at startup
//! - The shared [`CraftingContext`] that player sessions build grids from

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod context;

pub use config::{ServerConfig, CONFIG_FILE};
pub use context::{ContextError, CraftingContext};
