//! Error types for the arena repository.
mod arena;

pub use arena::ArenaRepositoryError;
