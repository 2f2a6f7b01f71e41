//! Configuration module for the Meme Arena.
//! Reads settings from the environment and wires up the service dependencies.
mod cors;
mod dependencies;
mod settings;

pub use cors::create_cors_layer;
pub use dependencies::Dependencies;
pub use settings::{ArenaConfig, DEFAULT_SERVER_PORT, LogFormat};
