//! # Meme Arena Repository
//! This crate provides the storage seam of the arena: the `ArenaRepository`
//! trait, its error type, and two implementations. `PostgresArenaRepository`
//! is the durable backend; `InMemoryArenaRepository` backs local runs and tests.
pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;

pub use errors::ArenaRepositoryError;
pub use interfaces::ArenaRepository;
pub use memory::InMemoryArenaRepository;
pub use postgres::PostgresArenaRepository;
