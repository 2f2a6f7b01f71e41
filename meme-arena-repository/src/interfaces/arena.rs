//! This module defines the `ArenaRepository` trait, the interface between the
//! voting engine and the store holding memes, comments, the vote ledger,
//! battle judgments and daily selections.
use chrono::NaiveDate;
use meme_arena_shared::types::{
    BattleJudgment, Comment, CounterDrift, DailySelection, ItemKind, ItemRef, Meme, PairKey,
    UserVote, VoteChangeset, VotesCount,
};

use crate::errors::ArenaRepositoryError;

/// A trait that defines the interface for interacting with arena storage.
///
/// Items are returned without a caller annotation (`user_vote` is `None`);
/// the engine attaches it from the ledger. Memes carry their `comment_count`.
#[async_trait::async_trait]
pub trait ArenaRepository: Send + Sync {
    /// Stores a new meme.
    ///
    /// Fails with `StorageExhausted` when the store cannot accept more items.
    async fn insert_meme(&self, meme: &Meme) -> Result<(), ArenaRepositoryError>;

    async fn get_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError>;

    /// Returns every meme, newest first. Memes created at the same instant
    /// keep reverse insertion order.
    async fn list_memes(&self) -> Result<Vec<Meme>, ArenaRepositoryError>;

    /// Removes a meme together with its votes, its comments and the votes on
    /// those comments, in one transaction.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(meme))` - The meme as it was before removal
    /// * `Ok(None)` - No meme with that id exists
    async fn delete_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError>;

    /// Stores a new comment. Fails with `NotFound` if its parent meme is missing.
    async fn insert_comment(&self, comment: &Comment) -> Result<(), ArenaRepositoryError>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>, ArenaRepositoryError>;

    /// Returns the comments of a meme, newest first.
    async fn list_comments(&self, meme_id: &str) -> Result<Vec<Comment>, ArenaRepositoryError>;

    /// Returns the ledger entry of `user_id` on `item`, if any.
    async fn get_user_vote(
        &self,
        user_id: &str,
        item: &ItemRef,
    ) -> Result<Option<UserVote>, ArenaRepositoryError>;

    /// Returns every ledger entry of `user_id` on items of `kind`.
    async fn get_user_votes(
        &self,
        user_id: &str,
        kind: ItemKind,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError>;

    /// Returns the most recent upvotes of `user_id` on memes, newest first.
    async fn recent_upvotes(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError>;

    /// Atomically applies a vote changeset: the ledger transition and the
    /// counter deltas commit together or not at all.
    ///
    /// The ledger must still hold `changeset.previous`; otherwise nothing is
    /// written and `ConcurrentModification` is returned.
    ///
    /// # Returns
    ///
    /// * `Ok(VotesCount)` - The item's counters after the change
    /// * `Err(NotFound)` - The item does not exist
    async fn persist_vote_changeset(
        &self,
        changeset: &VoteChangeset,
    ) -> Result<VotesCount, ArenaRepositoryError>;

    /// Recomputes every item's counters from the ledger, writes the corrected
    /// values back, and returns the items whose counters had drifted.
    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterDrift>, ArenaRepositoryError>;

    /// Records a battle judgment.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The judgment was recorded
    /// * `Ok(false)` - The user had already judged this pair; nothing changed
    async fn record_battle_judgment(
        &self,
        judgment: &BattleJudgment,
    ) -> Result<bool, ArenaRepositoryError>;

    /// Withdraws a previously recorded judgment.
    async fn forget_battle_judgment(
        &self,
        user_id: &str,
        pair_key: &PairKey,
    ) -> Result<(), ArenaRepositoryError>;

    async fn get_daily_selection(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailySelection>, ArenaRepositoryError>;

    /// Caches a selection unless one already exists for that date, and returns
    /// whichever selection is stored afterwards.
    async fn save_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<DailySelection, ArenaRepositoryError>;

    /// Overwrites the selection cached for the date.
    async fn replace_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<(), ArenaRepositoryError>;
}
