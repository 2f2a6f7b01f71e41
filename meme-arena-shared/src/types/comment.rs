use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ItemId, UserId, VoteDirection};

/// A comment on a meme. Votable with the same rules as memes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: ItemId,
    pub meme_id: ItemId,
    pub owner_id: UserId,
    pub author: String,
    pub text: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    /// The caller's current vote, when the comment was read on behalf of a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_vote: Option<VoteDirection>,
}
