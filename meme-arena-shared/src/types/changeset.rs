use crate::types::{ItemRef, UserId, UserVote};

/// Represents one vote mutation to be persisted in the arena repository.
///
/// A `VoteChangeset` bundles the ledger transition and the counter deltas it
/// implies so they are applied atomically. `previous` is the ledger entry the
/// change was computed from; persistence must fail if the ledger no longer
/// holds it.
///
/// | previous | next | ledger operation |
/// |---|---|---|
/// | `None` | `Some` | insert |
/// | `Some` | `Some` | update direction |
/// | `Some` | `None` | delete |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteChangeset {
    pub item: ItemRef,
    pub user_id: UserId,
    pub previous: Option<UserVote>,
    pub next: Option<UserVote>,
    pub upvotes_delta: i64,
    pub downvotes_delta: i64,
}

impl VoteChangeset {
    /// Returns true when the changeset leaves both ledger and counters untouched.
    pub fn is_noop(&self) -> bool {
        self.previous == self.next && self.upvotes_delta == 0 && self.downvotes_delta == 0
    }
}
