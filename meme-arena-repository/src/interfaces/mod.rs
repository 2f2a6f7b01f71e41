//! This module defines and re-exports the interfaces for the arena repository.
mod arena;

pub use arena::ArenaRepository;
