//! Error types for the Meme Arena application.
//! `StartupError` covers configuration and wiring failures; `ApiError` maps
//! engine errors onto HTTP responses.
mod api;

pub use api::{ApiError, ApiResult};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Repository error: {0}")]
    Repository(#[from] meme_arena_repository::ArenaRepositoryError),
    #[error("Tracing error: {0}")]
    Tracing(String),
    #[error(transparent)]
    Server(#[from] anyhow::Error),
}
