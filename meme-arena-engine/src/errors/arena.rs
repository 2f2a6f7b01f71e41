//! Defines the errors surfaced by engine operations.
//! Each variant carries a message that can be shown to the caller as is.
use meme_arena_repository::ArenaRepositoryError;
use meme_arena_shared::types::{ItemRef, PairKey};
use thiserror::Error;

/// The reason a request conflicted with existing state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Conflict {
    #[error("battle {0} was already judged by this user")]
    AlreadyJudged(PairKey),
    #[error("{0} was modified concurrently, retry the vote")]
    ConcurrentModification(ItemRef),
}

/// Represents errors that can occur within the arena engine.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("Not found: {0}")]
    NotFound(ItemRef),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(Conflict),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("At least two memes are needed for a battle")]
    NotEnoughContenders,

    #[error("Storage exhausted: {0}")]
    StorageExhausted(String),

    #[error("Repository error: {0}")]
    Repository(#[source] ArenaRepositoryError),
}

impl ArenaError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<ArenaRepositoryError> for ArenaError {
    fn from(err: ArenaRepositoryError) -> Self {
        match err {
            ArenaRepositoryError::NotFound(item) => ArenaError::NotFound(item),
            ArenaRepositoryError::ConcurrentModification(item) => {
                ArenaError::Conflict(Conflict::ConcurrentModification(item))
            }
            ArenaRepositoryError::StorageExhausted(msg) => ArenaError::StorageExhausted(msg),
            other => ArenaError::Repository(other),
        }
    }
}
