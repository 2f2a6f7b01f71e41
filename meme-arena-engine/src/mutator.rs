//! The counter mutator: how a requested vote changes the vote ledger and the
//! item's counters.
//!
//! | recorded vote | requested | ledger | up delta | down delta |
//! |---|---|---|---|---|
//! | none | up | insert up | +1 | 0 |
//! | none | down | insert down | 0 | +1 |
//! | up | up | delete | -1 | 0 |
//! | down | down | delete | 0 | -1 |
//! | up | down | switch to down | -1 | +1 |
//! | down | up | switch to up | +1 | -1 |
use chrono::{DateTime, Utc};
use meme_arena_shared::types::{ItemRef, UserId, UserVote, VoteChangeset, VoteDirection};

/// A vote requested by an identified user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRequest {
    pub user_id: UserId,
    pub item: ItemRef,
    pub direction: VoteDirection,
    pub at: DateTime<Utc>,
}

/// The ledger entry and counter deltas resulting from a vote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub new_vote: Option<UserVote>,
    pub up_delta: i64,
    pub down_delta: i64,
}

fn delta(direction: VoteDirection, amount: i64) -> (i64, i64) {
    match direction {
        VoteDirection::Up => (amount, 0),
        VoteDirection::Down => (0, amount),
    }
}

/// Applies the vote rules to the currently recorded vote.
///
/// Repeating the recorded direction removes the vote; the opposite direction
/// switches it in place, keeping its identity and `voted_at`.
pub fn apply_vote(current: Option<&UserVote>, request: &VoteRequest) -> VoteOutcome {
    match current {
        None => {
            let (up_delta, down_delta) = delta(request.direction, 1);
            VoteOutcome {
                new_vote: Some(UserVote {
                    user_id: request.user_id.clone(),
                    item: request.item.clone(),
                    direction: request.direction,
                    voted_at: request.at,
                }),
                up_delta,
                down_delta,
            }
        }
        Some(recorded) if recorded.direction == request.direction => {
            let (up_delta, down_delta) = delta(recorded.direction, -1);
            VoteOutcome {
                new_vote: None,
                up_delta,
                down_delta,
            }
        }
        Some(recorded) => {
            let (old_up, old_down) = delta(recorded.direction, -1);
            let (new_up, new_down) = delta(request.direction, 1);
            VoteOutcome {
                new_vote: Some(recorded.switched_to(request.direction)),
                up_delta: old_up + new_up,
                down_delta: old_down + new_down,
            }
        }
    }
}

/// Builds the changeset persisting `request` on top of the recorded vote.
///
/// The recorded vote becomes the changeset's precondition.
pub fn build_changeset(current: Option<UserVote>, request: VoteRequest) -> VoteChangeset {
    let outcome = apply_vote(current.as_ref(), &request);
    VoteChangeset {
        item: request.item,
        user_id: request.user_id,
        previous: current,
        next: outcome.new_vote,
        upvotes_delta: outcome.up_delta,
        downvotes_delta: outcome.down_delta,
    }
}
