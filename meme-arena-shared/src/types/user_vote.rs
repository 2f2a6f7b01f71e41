use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{ItemRef, UserId};

/// Represents the direction of a vote cast by a user.
///
/// Removing a vote is not a direction: it is the outcome of repeating the
/// direction already on record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    /// Indicates an upvote or positive endorsement.
    Up,
    /// Indicates a downvote or negative endorsement.
    Down,
}

impl VoteDirection {
    /// Storage code used by the persistence layer.
    pub fn as_code(self) -> i16 {
        match self {
            VoteDirection::Up => 0,
            VoteDirection::Down => 1,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(VoteDirection::Up),
            1 => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Up => f.write_str("up"),
            VoteDirection::Down => f.write_str("down"),
        }
    }
}

impl FromStr for VoteDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(format!("unknown vote direction '{other}'")),
        }
    }
}

/// Represents a user's vote on an item.
///
/// This struct is the vote ledger entry: at most one exists per
/// (user, item kind, item id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserVote {
    pub user_id: UserId,
    pub item: ItemRef,
    pub direction: VoteDirection,
    pub voted_at: DateTime<Utc>,
}

impl UserVote {
    /// Returns this vote with its direction replaced, keeping identity and timestamp.
    pub fn switched_to(&self, direction: VoteDirection) -> Self {
        Self {
            direction,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parsing() {
        assert_eq!("up".parse::<VoteDirection>().unwrap(), VoteDirection::Up);
        assert_eq!("DOWN".parse::<VoteDirection>().unwrap(), VoteDirection::Down);
        assert!("sideways".parse::<VoteDirection>().is_err());
    }

    #[test]
    fn test_direction_serde_is_lowercase() {
        let json = serde_json::to_string(&VoteDirection::Up).unwrap();
        assert_eq!(json, "\"up\"");
        let parsed: VoteDirection = serde_json::from_str("\"down\"").unwrap();
        assert_eq!(parsed, VoteDirection::Down);
    }

    #[test]
    fn test_switched_to_keeps_identity() {
        let vote = UserVote {
            user_id: "u1".to_string(),
            item: ItemRef::meme("1"),
            direction: VoteDirection::Up,
            voted_at: Utc::now(),
        };
        let switched = vote.switched_to(VoteDirection::Down);
        assert_eq!(switched.direction, VoteDirection::Down);
        assert_eq!(switched.user_id, vote.user_id);
        assert_eq!(switched.item, vote.item);
        assert_eq!(switched.voted_at, vote.voted_at);
    }
}
