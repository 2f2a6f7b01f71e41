use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a meme or comment.
pub type ItemId = String;

/// Opaque identifier of a caller, issued by the upstream auth gateway.
pub type UserId = String;

/// The kind of votable item.
///
/// Votes, counters and ledger entries are keyed by kind and id together, so a
/// meme and a comment never share counters even if their ids collide.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Meme,
    Comment,
}

impl ItemKind {
    /// Storage code used by the persistence layer.
    pub fn as_code(self) -> i16 {
        match self {
            ItemKind::Meme => 0,
            ItemKind::Comment => 1,
        }
    }

    /// Parses a storage code back into a kind.
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(ItemKind::Meme),
            1 => Some(ItemKind::Comment),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Meme => f.write_str("meme"),
            ItemKind::Comment => f.write_str("comment"),
        }
    }
}

/// Reference to a votable item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: ItemId,
}

impl ItemRef {
    pub fn meme(id: impl Into<ItemId>) -> Self {
        Self {
            kind: ItemKind::Meme,
            id: id.into(),
        }
    }

    pub fn comment(id: impl Into<ItemId>) -> Self {
        Self {
            kind: ItemKind::Comment,
            id: id.into(),
        }
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
