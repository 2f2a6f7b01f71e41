use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ItemId, UserId, VoteDirection};

/// Reference to media held by the external media store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub content_type: String,
    pub size_bytes: u64,
}

/// A meme with its cached vote counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Meme {
    pub id: ItemId,
    pub title: String,
    pub media: MediaRef,
    pub tags: Vec<String>,
    pub owner_id: UserId,
    pub author: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    /// Number of comments, derived on read.
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<VoteDirection>,
}

impl Meme {
    pub fn net_score(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}
