use serde::{Deserialize, Serialize};

use crate::types::ItemRef;

/// Represents the aggregated vote counts for an item.
///
/// This struct stores the total number of upvotes and downvotes cached on a
/// meme or comment row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VotesCount {
    pub item: ItemRef,
    pub upvotes: i64,
    pub downvotes: i64,
}

/// A counter that disagreed with the vote ledger when reconciled.
///
/// `recorded_*` are the cached counters before repair, `ledger_*` the values
/// recomputed from the ledger (and written back).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterDrift {
    pub item: ItemRef,
    pub recorded_upvotes: i64,
    pub recorded_downvotes: i64,
    pub ledger_upvotes: i64,
    pub ledger_downvotes: i64,
}
