//! Defines the errors that can occur while reading or writing arena state.
use meme_arena_shared::types::ItemRef;
use thiserror::Error;

/// SQLSTATE class for "insufficient resources" (disk full, out of memory, too many connections).
const INSUFFICIENT_RESOURCES_CLASS: &str = "53";

/// Represents errors that can occur within the arena repository.
#[derive(Debug, Error)]
pub enum ArenaRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[source] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Item not found: {0}")]
    NotFound(ItemRef),

    #[error("Vote on {0} was modified concurrently")]
    ConcurrentModification(ItemRef),

    #[error("Storage exhausted: {0}")]
    StorageExhausted(String),

    #[error("Invalid vote type: {0}")]
    InvalidVoteType(i16),

    #[error("Invalid item kind: {0}")]
    InvalidItemKind(i16),

    #[error("Invalid media size: {0}")]
    InvalidMediaSize(i64),
}

impl From<sqlx::Error> for ArenaRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let exhausted = db_err
                .code()
                .is_some_and(|code| code.starts_with(INSUFFICIENT_RESOURCES_CLASS));
            if exhausted {
                return ArenaRepositoryError::StorageExhausted(db_err.message().to_string());
            }
        }
        ArenaRepositoryError::DatabaseError(err)
    }
}
