//! # Meme Arena Shared
//! This crate defines shared data structures and types used across the meme arena crates.
//! It includes common definitions for memes, comments, user votes, vote counts, vote
//! changesets, battle pairings and daily selections.
pub mod types;
