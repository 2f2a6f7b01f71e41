//! Meme Arena Library
//!
//! HTTP front of the meme arena: configuration, dependency wiring, routes and
//! the mapping of engine errors onto responses.

pub mod config;
pub mod errors;
pub mod server;

pub use config::{ArenaConfig, Dependencies};
pub use errors::{ApiError, StartupError};
