//! Error types for the arena engine.
mod arena;

pub use arena::{ArenaError, Conflict};
