//! In-process implementation of the arena repository.
//!
//! All state lives behind one `tokio::sync::RwLock`, so every write,
//! including a vote changeset, is applied as a single critical section.
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use meme_arena_shared::types::{
    BattleJudgment, Comment, CounterDrift, DailySelection, ItemKind, ItemRef, Meme, PairKey,
    UserId, UserVote, VoteChangeset, VoteDirection, VotesCount,
};
use tokio::sync::RwLock;

use crate::{ArenaRepository, ArenaRepositoryError};

type VoteKey = (UserId, ItemRef);

/// A ledger entry plus its insertion sequence, used to order votes cast at the same instant.
#[derive(Debug, Clone)]
struct LedgerEntry {
    seq: u64,
    vote: UserVote,
}

#[derive(Debug, Default)]
struct ArenaState {
    /// Insertion order doubles as creation order.
    memes: Vec<Meme>,
    comments: Vec<Comment>,
    votes: HashMap<VoteKey, LedgerEntry>,
    next_vote_seq: u64,
    judgments: HashMap<(UserId, PairKey), BattleJudgment>,
    daily: BTreeMap<NaiveDate, DailySelection>,
}

impl ArenaState {
    fn item_count(&self) -> usize {
        self.memes.len() + self.comments.len()
    }

    fn comment_count(&self, meme_id: &str) -> i64 {
        self.comments.iter().filter(|c| c.meme_id == meme_id).count() as i64
    }

    fn with_comment_count(&self, meme: &Meme) -> Meme {
        Meme {
            comment_count: self.comment_count(&meme.id),
            ..meme.clone()
        }
    }

    fn counters_mut(&mut self, item: &ItemRef) -> Option<(&mut i64, &mut i64)> {
        match item.kind {
            ItemKind::Meme => self
                .memes
                .iter_mut()
                .find(|m| m.id == item.id)
                .map(|m| (&mut m.upvotes, &mut m.downvotes)),
            ItemKind::Comment => self
                .comments
                .iter_mut()
                .find(|c| c.id == item.id)
                .map(|c| (&mut c.upvotes, &mut c.downvotes)),
        }
    }

    fn ledger_tally(&self, item: &ItemRef) -> (i64, i64) {
        self.votes
            .values()
            .filter(|entry| &entry.vote.item == item)
            .fold((0, 0), |(up, down), entry| match entry.vote.direction {
                VoteDirection::Up => (up + 1, down),
                VoteDirection::Down => (up, down + 1),
            })
    }
}

/// In-memory arena repository.
///
/// With a capacity set, inserting a meme or comment beyond that many items
/// fails with `StorageExhausted`.
#[derive(Debug, Default)]
pub struct InMemoryArenaRepository {
    state: RwLock<ArenaState>,
    capacity: Option<usize>,
}

impl InMemoryArenaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::default(),
            capacity: Some(capacity),
        }
    }

    fn ensure_room(&self, state: &ArenaState) -> Result<(), ArenaRepositoryError> {
        match self.capacity {
            Some(capacity) if state.item_count() >= capacity => {
                Err(ArenaRepositoryError::StorageExhausted(format!(
                    "in-memory store is limited to {capacity} items"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ArenaRepository for InMemoryArenaRepository {
    async fn insert_meme(&self, meme: &Meme) -> Result<(), ArenaRepositoryError> {
        let mut state = self.state.write().await;
        self.ensure_room(&state)?;
        state.memes.push(Meme {
            comment_count: 0,
            user_vote: None,
            ..meme.clone()
        });
        Ok(())
    }

    async fn get_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .memes
            .iter()
            .find(|m| m.id == id)
            .map(|m| state.with_comment_count(m)))
    }

    async fn list_memes(&self) -> Result<Vec<Meme>, ArenaRepositoryError> {
        let state = self.state.read().await;
        let mut memes: Vec<Meme> = state
            .memes
            .iter()
            .rev()
            .map(|m| state.with_comment_count(m))
            .collect();
        memes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(memes)
    }

    async fn delete_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError> {
        let mut state = self.state.write().await;
        let Some(position) = state.memes.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        let removed = state.with_comment_count(&state.memes[position]);
        state.memes.remove(position);

        let comment_ids: Vec<String> = state
            .comments
            .iter()
            .filter(|c| c.meme_id == id)
            .map(|c| c.id.clone())
            .collect();
        state.comments.retain(|c| c.meme_id != id);
        state.votes.retain(|(_, item), _| match item.kind {
            ItemKind::Meme => item.id != id,
            ItemKind::Comment => !comment_ids.contains(&item.id),
        });
        Ok(Some(removed))
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ArenaRepositoryError> {
        let mut state = self.state.write().await;
        if !state.memes.iter().any(|m| m.id == comment.meme_id) {
            return Err(ArenaRepositoryError::NotFound(ItemRef::meme(
                comment.meme_id.clone(),
            )));
        }
        self.ensure_room(&state)?;
        state.comments.push(Comment {
            user_vote: None,
            ..comment.clone()
        });
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>, ArenaRepositoryError> {
        let state = self.state.read().await;
        Ok(state.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_comments(&self, meme_id: &str) -> Result<Vec<Comment>, ArenaRepositoryError> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .rev()
            .filter(|c| c.meme_id == meme_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn get_user_vote(
        &self,
        user_id: &str,
        item: &ItemRef,
    ) -> Result<Option<UserVote>, ArenaRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .get(&(user_id.to_string(), item.clone()))
            .map(|entry| entry.vote.clone()))
    }

    async fn get_user_votes(
        &self,
        user_id: &str,
        kind: ItemKind,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .votes
            .values()
            .filter(|entry| entry.vote.user_id == user_id && entry.vote.item.kind == kind)
            .map(|entry| entry.vote.clone())
            .collect())
    }

    async fn recent_upvotes(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError> {
        let state = self.state.read().await;
        let mut upvotes: Vec<&LedgerEntry> = state
            .votes
            .values()
            .filter(|entry| {
                entry.vote.user_id == user_id
                    && entry.vote.item.kind == ItemKind::Meme
                    && entry.vote.direction == VoteDirection::Up
            })
            .collect();
        upvotes.sort_by(|a, b| {
            b.vote
                .voted_at
                .cmp(&a.vote.voted_at)
                .then(b.seq.cmp(&a.seq))
        });
        Ok(upvotes
            .into_iter()
            .take(limit)
            .map(|entry| entry.vote.clone())
            .collect())
    }

    async fn persist_vote_changeset(
        &self,
        changeset: &VoteChangeset,
    ) -> Result<VotesCount, ArenaRepositoryError> {
        let mut state = self.state.write().await;
        if state.counters_mut(&changeset.item).is_none() {
            return Err(ArenaRepositoryError::NotFound(changeset.item.clone()));
        }

        let key = (changeset.user_id.clone(), changeset.item.clone());
        let recorded = state.votes.get(&key).map(|entry| entry.vote.direction);
        let expected = changeset.previous.as_ref().map(|vote| vote.direction);
        if recorded != expected {
            return Err(ArenaRepositoryError::ConcurrentModification(
                changeset.item.clone(),
            ));
        }

        match &changeset.next {
            Some(next) => {
                let seq = match state.votes.get(&key) {
                    Some(entry) => entry.seq,
                    None => {
                        state.next_vote_seq += 1;
                        state.next_vote_seq
                    }
                };
                state.votes.insert(
                    key,
                    LedgerEntry {
                        seq,
                        vote: next.clone(),
                    },
                );
            }
            None => {
                state.votes.remove(&key);
            }
        }

        let Some((upvotes, downvotes)) = state.counters_mut(&changeset.item) else {
            return Err(ArenaRepositoryError::NotFound(changeset.item.clone()));
        };
        *upvotes += changeset.upvotes_delta;
        *downvotes += changeset.downvotes_delta;
        Ok(VotesCount {
            item: changeset.item.clone(),
            upvotes: *upvotes,
            downvotes: *downvotes,
        })
    }

    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterDrift>, ArenaRepositoryError> {
        let mut state = self.state.write().await;
        let items: Vec<(ItemRef, i64, i64)> = state
            .memes
            .iter()
            .map(|m| (ItemRef::meme(m.id.clone()), m.upvotes, m.downvotes))
            .chain(
                state
                    .comments
                    .iter()
                    .map(|c| (ItemRef::comment(c.id.clone()), c.upvotes, c.downvotes)),
            )
            .collect();

        let mut drifts = Vec::new();
        for (item, recorded_upvotes, recorded_downvotes) in items {
            let (ledger_upvotes, ledger_downvotes) = state.ledger_tally(&item);
            if (recorded_upvotes, recorded_downvotes) == (ledger_upvotes, ledger_downvotes) {
                continue;
            }
            if let Some((upvotes, downvotes)) = state.counters_mut(&item) {
                *upvotes = ledger_upvotes;
                *downvotes = ledger_downvotes;
            }
            drifts.push(CounterDrift {
                item,
                recorded_upvotes,
                recorded_downvotes,
                ledger_upvotes,
                ledger_downvotes,
            });
        }
        Ok(drifts)
    }

    async fn record_battle_judgment(
        &self,
        judgment: &BattleJudgment,
    ) -> Result<bool, ArenaRepositoryError> {
        let mut state = self.state.write().await;
        let key = (judgment.user_id.clone(), judgment.pair_key.clone());
        if state.judgments.contains_key(&key) {
            return Ok(false);
        }
        state.judgments.insert(key, judgment.clone());
        Ok(true)
    }

    async fn forget_battle_judgment(
        &self,
        user_id: &str,
        pair_key: &PairKey,
    ) -> Result<(), ArenaRepositoryError> {
        let mut state = self.state.write().await;
        state
            .judgments
            .remove(&(user_id.to_string(), pair_key.clone()));
        Ok(())
    }

    async fn get_daily_selection(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailySelection>, ArenaRepositoryError> {
        let state = self.state.read().await;
        Ok(state.daily.get(&date).cloned())
    }

    async fn save_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<DailySelection, ArenaRepositoryError> {
        let mut state = self.state.write().await;
        Ok(state
            .daily
            .entry(selection.date)
            .or_insert_with(|| selection.clone())
            .clone())
    }

    async fn replace_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<(), ArenaRepositoryError> {
        let mut state = self.state.write().await;
        state.daily.insert(selection.date, selection.clone());
        Ok(())
    }
}
