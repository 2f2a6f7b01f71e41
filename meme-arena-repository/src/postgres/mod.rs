//! PostgreSQL implementation of the arena repository.
mod arena_repository;

pub use arena_repository::PostgresArenaRepository;
