//! Arena service implementation.
//!
//! `ArenaService` is the entry point used by transports. It validates input,
//! enforces identity and policy, runs votes through the counter mutator under
//! a per-item lock, and publishes vote events after commit.
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use meme_arena_repository::ArenaRepository;
use meme_arena_shared::types::{
    BattleJudgment, Comment, CounterDrift, ItemKind, ItemRef, MediaRef, Meme, PairKey, VoteDirection,
    VoteEvent, VotesCount,
};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use crate::battle::BattleSelector;
use crate::daily::DailySelector;
use crate::locks::KeyedMutex;
use crate::mutator::{self, VoteRequest};
use crate::notify::VoteNotifier;
use crate::policy::{AdminPolicy, DeletePolicy, IdentifiedAdminPolicy, OpenDeletePolicy};
use crate::{ArenaError, Caller, Conflict, EngineConfig, ranking, title, validation};

/// Input for creating a meme. The media has already been stored elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CreateMemeRequest {
    pub title: String,
    pub media: Option<MediaRef>,
    pub tags: Vec<String>,
}

/// The main service of the arena.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use meme_arena_engine::{ArenaService, Caller, EngineConfig};
/// use meme_arena_repository::InMemoryArenaRepository;
/// use meme_arena_shared::types::VoteDirection;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = ArenaService::new(Arc::new(InMemoryArenaRepository::new()), EngineConfig::default());
/// let caller = Caller::from_parts("user-1", Some("Ada"));
///
/// let meme = service.vote_meme("some-meme-id", caller.as_ref(), VoteDirection::Up).await?;
/// println!("{} now has {} upvotes", meme.title, meme.upvotes);
/// # Ok(())
/// # }
/// ```
pub struct ArenaService {
    repository: Arc<dyn ArenaRepository>,
    config: EngineConfig,
    delete_policy: Arc<dyn DeletePolicy>,
    admin_policy: Arc<dyn AdminPolicy>,
    item_locks: KeyedMutex<ItemRef>,
    notifier: VoteNotifier,
    battles: BattleSelector,
    daily: DailySelector,
}

fn require(caller: Option<&Caller>) -> Result<&Caller, ArenaError> {
    caller.ok_or(ArenaError::Unauthenticated)
}

impl ArenaService {
    /// Creates a service that lets any identified caller delete any meme and
    /// run maintenance.
    pub fn new(repository: Arc<dyn ArenaRepository>, config: EngineConfig) -> Self {
        let daily = DailySelector::new(repository.clone(), config.daily_selection_policy);
        Self {
            notifier: VoteNotifier::new(config.event_channel_capacity),
            repository,
            config,
            delete_policy: Arc::new(OpenDeletePolicy),
            admin_policy: Arc::new(IdentifiedAdminPolicy),
            item_locks: KeyedMutex::new(),
            battles: BattleSelector::new(),
            daily,
        }
    }

    /// Replaces the delete authorization policy.
    pub fn with_delete_policy(mut self, delete_policy: Arc<dyn DeletePolicy>) -> Self {
        self.delete_policy = delete_policy;
        self
    }

    /// Replaces the policy guarding maintenance operations.
    pub fn with_admin_policy(mut self, admin_policy: Arc<dyn AdminPolicy>) -> Self {
        self.admin_policy = admin_policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Receives a `VoteEvent` for every committed vote from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<VoteEvent> {
        self.notifier.subscribe()
    }

    // ------------------------------------------------------------------
    // Memes
    // ------------------------------------------------------------------

    /// Lists all memes, newest first, annotated with the caller's votes.
    pub async fn list_memes(&self, caller: Option<&Caller>) -> Result<Vec<Meme>, ArenaError> {
        let memes = self.repository.list_memes().await?;
        self.annotate_memes(memes, caller).await
    }

    pub async fn get_meme(&self, id: &str, caller: Option<&Caller>) -> Result<Meme, ArenaError> {
        let meme = self
            .repository
            .get_meme(id)
            .await?
            .ok_or_else(|| ArenaError::NotFound(ItemRef::meme(id)))?;
        let mut annotated = self.annotate_memes(vec![meme], caller).await?;
        annotated.pop().ok_or_else(|| ArenaError::NotFound(ItemRef::meme(id)))
    }

    /// Validates and stores a new meme owned by the caller.
    pub async fn create_meme(
        &self,
        caller: Option<&Caller>,
        request: CreateMemeRequest,
    ) -> Result<Meme, ArenaError> {
        let caller = require(caller)?;
        let title = validation::validate_title(&request.title)?;
        let media = validation::validate_media(request.media, self.config.max_upload_bytes)?;

        let meme = Meme {
            id: Uuid::new_v4().to_string(),
            title,
            media,
            tags: validation::normalize_tags(request.tags),
            owner_id: caller.user_id.clone(),
            author: caller.display_name.clone(),
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            comment_count: 0,
            user_vote: None,
        };
        self.repository.insert_meme(&meme).await?;
        info!(meme_id = %meme.id, owner_id = %meme.owner_id, "Meme created");
        Ok(meme)
    }

    /// Applies the caller's vote to a meme and returns its post-vote state.
    pub async fn vote_meme(
        &self,
        id: &str,
        caller: Option<&Caller>,
        direction: VoteDirection,
    ) -> Result<Meme, ArenaError> {
        let counts = self.cast_vote(ItemRef::meme(id), caller, direction).await?;
        let mut meme = self.get_meme(id, caller).await?;
        meme.upvotes = counts.upvotes;
        meme.downvotes = counts.downvotes;
        Ok(meme)
    }

    /// Deletes a meme with its votes and comments, if the delete policy allows it.
    pub async fn delete_meme(&self, caller: Option<&Caller>, id: &str) -> Result<Meme, ArenaError> {
        let caller = require(caller)?;
        let meme = self
            .repository
            .get_meme(id)
            .await?
            .ok_or_else(|| ArenaError::NotFound(ItemRef::meme(id)))?;
        self.delete_policy.authorize(caller, &meme)?;

        let removed = self
            .repository
            .delete_meme(id)
            .await?
            .ok_or_else(|| ArenaError::NotFound(ItemRef::meme(id)))?;
        info!(meme_id = id, deleted_by = %caller.user_id, "Meme deleted");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Ranking
    // ------------------------------------------------------------------

    /// The top `limit` memes by net score; older memes win ties.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<Meme>, ArenaError> {
        let mut memes = self.repository.list_memes().await?;
        memes.reverse();
        Ok(ranking::leaderboard(memes, limit))
    }

    pub async fn item_of_the_day(&self, date: NaiveDate) -> Result<Option<Meme>, ArenaError> {
        self.daily.item_of_the_day(date).await
    }

    /// Discards the cached pick for `date` and selects again. Maintenance only.
    pub async fn recompute_item_of_the_day(
        &self,
        caller: Option<&Caller>,
        date: NaiveDate,
    ) -> Result<Option<Meme>, ArenaError> {
        let caller = self.require_admin(caller)?;
        let meme = self.daily.recompute(date).await?;
        info!(
            %date,
            requested_by = %caller.user_id,
            meme_id = ?meme.as_ref().map(|m| &m.id),
            "Item of the day recomputed"
        );
        Ok(meme)
    }

    // ------------------------------------------------------------------
    // Battles
    // ------------------------------------------------------------------

    /// Draws two memes for the caller to judge.
    pub async fn battle_pair(&self, caller: Option<&Caller>) -> Result<(Meme, Meme), ArenaError> {
        let memes = self.repository.list_memes().await?;
        let (left, right) = self
            .battles
            .present(caller.map(|c| c.user_id.as_str()), &memes)
            .await?;
        let mut annotated = self.annotate_memes(vec![left, right], caller).await?.into_iter();
        match (annotated.next(), annotated.next()) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(ArenaError::NotEnoughContenders),
        }
    }

    /// Judges a battle: upvotes the winner and blocks the pair for this caller.
    ///
    /// When a pair is on display for the caller, the judgment must name it.
    /// The loser's counters are untouched. If the upvote fails, the judgment
    /// record is withdrawn so the pair can be judged again.
    pub async fn battle_vote(
        &self,
        caller: Option<&Caller>,
        winner_id: &str,
        loser_id: &str,
    ) -> Result<Meme, ArenaError> {
        let caller = require(caller)?;
        if winner_id == loser_id {
            return Err(ArenaError::validation("winner and loser must be different memes"));
        }
        for id in [winner_id, loser_id] {
            if self.repository.get_meme(id).await?.is_none() {
                return Err(ArenaError::NotFound(ItemRef::meme(id)));
            }
        }
        self.battles.check_judgment(&caller.user_id, winner_id, loser_id).await?;

        let pair_key = PairKey::new(winner_id, loser_id);
        let judgment = BattleJudgment {
            user_id: caller.user_id.clone(),
            pair_key: pair_key.clone(),
            winner_id: winner_id.to_string(),
            judged_at: Utc::now(),
        };
        if !self.repository.record_battle_judgment(&judgment).await? {
            return Err(ArenaError::Conflict(Conflict::AlreadyJudged(pair_key)));
        }

        if let Err(err) = self
            .cast_vote(ItemRef::meme(winner_id), Some(caller), VoteDirection::Up)
            .await
        {
            if let Err(undo) = self
                .repository
                .forget_battle_judgment(&caller.user_id, &pair_key)
                .await
            {
                warn!(%pair_key, error = %undo, "Failed to withdraw battle judgment");
            }
            return Err(err);
        }

        self.battles.conclude(&caller.user_id, winner_id, loser_id).await;
        info!(user_id = %caller.user_id, %pair_key, winner_id, "Battle judged");
        self.get_meme(winner_id, Some(caller)).await
    }

    /// Drops the presented pair without judging it.
    pub async fn battle_skip(&self, caller: Option<&Caller>) -> Result<(), ArenaError> {
        if let Some(caller) = caller {
            self.battles.reshuffle(&caller.user_id).await;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn create_comment(
        &self,
        caller: Option<&Caller>,
        meme_id: &str,
        text: &str,
    ) -> Result<Comment, ArenaError> {
        let caller = require(caller)?;
        let text = validation::validate_comment_text(text)?;
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            meme_id: meme_id.to_string(),
            owner_id: caller.user_id.clone(),
            author: caller.display_name.clone(),
            text,
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            user_vote: None,
        };
        self.repository.insert_comment(&comment).await?;
        info!(comment_id = %comment.id, meme_id, "Comment created");
        Ok(comment)
    }

    /// Lists a meme's comments, newest first, annotated with the caller's votes.
    pub async fn list_comments(
        &self,
        meme_id: &str,
        caller: Option<&Caller>,
    ) -> Result<Vec<Comment>, ArenaError> {
        if self.repository.get_meme(meme_id).await?.is_none() {
            return Err(ArenaError::NotFound(ItemRef::meme(meme_id)));
        }
        let mut comments = self.repository.list_comments(meme_id).await?;
        if let Some(caller) = caller {
            let votes = self.vote_directions(caller, ItemKind::Comment).await?;
            for comment in &mut comments {
                comment.user_vote = votes.get(&comment.id).copied();
            }
        }
        Ok(comments)
    }

    /// Applies the caller's vote to a comment, with the same rules as memes.
    pub async fn vote_comment(
        &self,
        id: &str,
        caller: Option<&Caller>,
        direction: VoteDirection,
    ) -> Result<Comment, ArenaError> {
        let counts = self.cast_vote(ItemRef::comment(id), caller, direction).await?;
        let mut comment = self
            .repository
            .get_comment(id)
            .await?
            .ok_or_else(|| ArenaError::NotFound(ItemRef::comment(id)))?;
        comment.upvotes = counts.upvotes;
        comment.downvotes = counts.downvotes;
        if let Some(caller) = caller {
            comment.user_vote = self
                .repository
                .get_user_vote(&caller.user_id, &ItemRef::comment(id))
                .await?
                .map(|vote| vote.direction);
        }
        Ok(comment)
    }

    // ------------------------------------------------------------------
    // Maintenance & profile
    // ------------------------------------------------------------------

    /// Recomputes all counters from the vote ledger and reports what drifted.
    /// Maintenance only.
    pub async fn reconcile_counters(&self, caller: Option<&Caller>) -> Result<Vec<CounterDrift>, ArenaError> {
        let caller = self.require_admin(caller)?;
        let drifts = self.repository.reconcile_vote_counts().await?;
        for drift in &drifts {
            warn!(
                item = %drift.item,
                recorded_upvotes = drift.recorded_upvotes,
                recorded_downvotes = drift.recorded_downvotes,
                ledger_upvotes = drift.ledger_upvotes,
                ledger_downvotes = drift.ledger_downvotes,
                "Counter drift repaired"
            );
        }
        info!(drifted = drifts.len(), requested_by = %caller.user_id, "Counters reconciled");
        Ok(drifts)
    }

    /// A personalised title based on the caller's recent upvotes.
    pub async fn voter_title(&self, caller: Option<&Caller>) -> Result<String, ArenaError> {
        let Some(caller) = caller else {
            return Ok(title::ANONYMOUS_TITLE.to_string());
        };
        let recent = self
            .repository
            .recent_upvotes(&caller.user_id, title::RECENT_UPVOTE_WINDOW)
            .await?;
        let mut titles = Vec::with_capacity(recent.len());
        for vote in &recent {
            if let Some(meme) = self.repository.get_meme(&vote.item.id).await? {
                titles.push(meme.title);
            }
        }
        Ok(title::voter_title(&titles, recent.len()).to_string())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_admin<'a>(&self, caller: Option<&'a Caller>) -> Result<&'a Caller, ArenaError> {
        let caller = require(caller)?;
        self.admin_policy.authorize(caller)?;
        Ok(caller)
    }

    /// Reads the caller's vote, applies the mutator and persists the result,
    /// all under the item's lock. The event is published after the lock is released.
    async fn cast_vote(
        &self,
        item: ItemRef,
        caller: Option<&Caller>,
        direction: VoteDirection,
    ) -> Result<VotesCount, ArenaError> {
        let caller = require(caller)?;

        let counts = {
            let _guard = self.item_locks.lock(item.clone()).await;
            let current = self.repository.get_user_vote(&caller.user_id, &item).await?;
            let changeset = mutator::build_changeset(
                current,
                VoteRequest {
                    user_id: caller.user_id.clone(),
                    item: item.clone(),
                    direction,
                    at: Utc::now(),
                },
            );
            self.repository.persist_vote_changeset(&changeset).await?
        };

        info!(
            %item,
            user_id = %caller.user_id,
            %direction,
            upvotes = counts.upvotes,
            downvotes = counts.downvotes,
            "Vote applied"
        );
        self.notifier.publish(VoteEvent {
            item,
            upvotes: counts.upvotes,
            downvotes: counts.downvotes,
            at: Utc::now(),
        });
        Ok(counts)
    }

    async fn vote_directions(
        &self,
        caller: &Caller,
        kind: ItemKind,
    ) -> Result<HashMap<String, VoteDirection>, ArenaError> {
        Ok(self
            .repository
            .get_user_votes(&caller.user_id, kind)
            .await?
            .into_iter()
            .map(|vote| (vote.item.id, vote.direction))
            .collect())
    }

    async fn annotate_memes(&self, mut memes: Vec<Meme>, caller: Option<&Caller>) -> Result<Vec<Meme>, ArenaError> {
        if let Some(caller) = caller {
            let votes = self.vote_directions(caller, ItemKind::Meme).await?;
            for meme in &mut memes {
                meme.user_vote = votes.get(&meme.id).copied();
            }
        }
        Ok(memes)
    }
}
