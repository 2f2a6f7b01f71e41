//! # Meme Arena Engine
//! This crate holds the voting and aggregation rules of the arena: the
//! counter mutator, ranking and item-of-the-day selection, the battle
//! selector, delete policies and vote notifications. `ArenaService` ties
//! them together over an `ArenaRepository`.
pub mod battle;
pub mod caller;
pub mod config;
pub mod daily;
pub mod locks;
pub mod mutator;
pub mod notify;
pub mod policy;
pub mod ranking;
pub mod service;
pub mod title;
pub mod validation;

pub mod errors;

pub use caller::Caller;
pub use config::EngineConfig;
pub use errors::{ArenaError, Conflict};
pub use service::ArenaService;
