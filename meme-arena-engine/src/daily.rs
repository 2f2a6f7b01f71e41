//! Item of the day: the leaderboard top, memoized per calendar date.
//!
//! The first lookup of a date caches the current leader; later lookups that
//! day return the cached meme even if another meme overtakes it.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use meme_arena_repository::ArenaRepository;
use meme_arena_shared::types::{DailySelection, Meme};
use tracing::{debug, info};

use crate::{ArenaError, ranking};

/// What happens when the cached meme of a date has been deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DailySelectionPolicy {
    /// The date yields no item of the day until explicitly recomputed.
    #[default]
    Stable,
    /// The date is recomputed on lookup.
    SelfHealing,
}

impl FromStr for DailySelectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(DailySelectionPolicy::Stable),
            "self-healing" | "self_healing" => Ok(DailySelectionPolicy::SelfHealing),
            other => Err(format!(
                "unknown daily selection policy '{other}', expected 'stable' or 'self-healing'"
            )),
        }
    }
}

impl fmt::Display for DailySelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailySelectionPolicy::Stable => f.write_str("stable"),
            DailySelectionPolicy::SelfHealing => f.write_str("self-healing"),
        }
    }
}

/// The calendar date of `now` in the caller's time zone.
///
/// `tz_offset_minutes` is the caller's offset east of UTC (e.g. `120` for
/// UTC+02:00); without it the server's local zone is used.
pub fn local_date(now: DateTime<Utc>, tz_offset_minutes: Option<i32>) -> Result<NaiveDate, ArenaError> {
    match tz_offset_minutes {
        Some(minutes) => {
            let offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ArenaError::validation(format!("time zone offset {minutes} minutes is out of range"))
                })?;
            Ok(now.with_timezone(&offset).date_naive())
        }
        None => Ok(now.with_timezone(&Local).date_naive()),
    }
}

/// Chooses and caches the item of the day.
pub struct DailySelector {
    repository: Arc<dyn ArenaRepository>,
    policy: DailySelectionPolicy,
}

impl DailySelector {
    pub fn new(repository: Arc<dyn ArenaRepository>, policy: DailySelectionPolicy) -> Self {
        Self { repository, policy }
    }

    /// Returns the item of the day for `date`, selecting and caching it on first use.
    ///
    /// Returns `None` when there are no memes, or when the cached meme was
    /// deleted under the `Stable` policy.
    pub async fn item_of_the_day(&self, date: NaiveDate) -> Result<Option<Meme>, ArenaError> {
        if let Some(selection) = self.repository.get_daily_selection(date).await? {
            if let Some(meme) = self.repository.get_meme(&selection.item_id).await? {
                return Ok(Some(meme));
            }
            return match self.policy {
                DailySelectionPolicy::Stable => {
                    debug!(%date, item_id = %selection.item_id, "Item of the day was deleted");
                    Ok(None)
                }
                DailySelectionPolicy::SelfHealing => {
                    info!(%date, item_id = %selection.item_id, "Item of the day was deleted, recomputing");
                    self.recompute(date).await
                }
            };
        }

        let Some(leader) = self.current_leader().await? else {
            return Ok(None);
        };
        let candidate = DailySelection {
            date,
            item_id: leader.id.clone(),
        };
        let stored = self.repository.save_daily_selection(&candidate).await?;
        if stored.item_id == leader.id {
            info!(%date, item_id = %leader.id, "Item of the day selected");
            return Ok(Some(leader));
        }
        // Another caller cached a different leader first.
        Ok(self.repository.get_meme(&stored.item_id).await?)
    }

    /// Replaces the cached selection for `date` with the current leader.
    pub async fn recompute(&self, date: NaiveDate) -> Result<Option<Meme>, ArenaError> {
        let Some(leader) = self.current_leader().await? else {
            return Ok(None);
        };
        self.repository
            .replace_daily_selection(&DailySelection {
                date,
                item_id: leader.id.clone(),
            })
            .await?;
        info!(%date, item_id = %leader.id, "Item of the day recomputed");
        Ok(Some(leader))
    }

    async fn current_leader(&self) -> Result<Option<Meme>, ArenaError> {
        let mut memes = self.repository.list_memes().await?;
        memes.reverse();
        Ok(ranking::leader(memes))
    }
}
