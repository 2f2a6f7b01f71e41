use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ItemRef;

/// Notification published after a vote commits, carrying the item's new counters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEvent {
    pub item: ItemRef,
    pub upvotes: i64,
    pub downvotes: i64,
    pub at: DateTime<Utc>,
}
