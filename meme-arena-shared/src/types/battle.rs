use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ItemId, UserId};

/// Order-independent key for a pair of memes.
///
/// The two ids are sorted lexicographically, so `(a, b)` and `(b, a)` produce
/// the same key. The first id is prefixed with its length, which keeps ids that
/// contain the separator from colliding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{}:{first}-{second}", first.len()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user's judgment of one battle pairing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleJudgment {
    pub user_id: UserId,
    pub pair_key: PairKey,
    pub winner_id: ItemId,
    pub judged_at: DateTime<Utc>,
}
