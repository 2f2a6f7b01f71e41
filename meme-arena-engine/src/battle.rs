//! Battle pairing: per-user presentation state and recent-pairing history.
//!
//! Judgment records are durable and live in the repository; the state
//! machine and history here are process memory.
use std::collections::HashMap;

use meme_arena_shared::types::{ItemId, Meme, UserId};
use rand::Rng;
use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tracing::debug;

use crate::ArenaError;

/// Where a user stands in the battle flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BattleState {
    #[default]
    Idle,
    AwaitingJudgment { left: ItemId, right: ItemId },
}

#[derive(Debug, Default)]
struct BattleSession {
    state: BattleState,
    history: Vec<ItemId>,
}

/// Two memes drawn for a battle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPick {
    pub left: Meme,
    pub right: Meme,
    /// True when too few memes were outside the history and it had to be cleared.
    pub history_reset: bool,
}

/// Draws two distinct memes, avoiding ids in `history` while at least two others remain.
///
/// Returns `None` if there are fewer than two memes in total.
pub fn pick_pair<R: Rng + ?Sized>(memes: &[Meme], history: &[ItemId], rng: &mut R) -> Option<PairPick> {
    if memes.len() < 2 {
        return None;
    }

    let eligible: Vec<&Meme> = memes.iter().filter(|m| !history.contains(&m.id)).collect();
    let (mut pool, history_reset) = if eligible.len() >= 2 {
        (eligible, false)
    } else {
        (memes.iter().collect::<Vec<&Meme>>(), true)
    };

    let (picked, _) = pool.partial_shuffle(rng, 2);
    Some(PairPick {
        left: picked[0].clone(),
        right: picked[1].clone(),
        history_reset,
    })
}

/// Tracks the battle state of every user seen by this process.
#[derive(Debug, Default)]
pub struct BattleSelector {
    sessions: Mutex<HashMap<UserId, BattleSession>>,
}

impl BattleSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Presents a pair to `user_id`, moving them to `AwaitingJudgment`.
    ///
    /// Anonymous callers get a pair drawn without history and no state is kept.
    pub async fn present(&self, user_id: Option<&str>, memes: &[Meme]) -> Result<(Meme, Meme), ArenaError> {
        let Some(user_id) = user_id else {
            let pick = pick_pair(memes, &[], &mut rand::thread_rng()).ok_or(ArenaError::NotEnoughContenders)?;
            return Ok((pick.left, pick.right));
        };

        let mut sessions = self.sessions.lock().await;
        let history = sessions.get(user_id).map(|s| s.history.as_slice()).unwrap_or_default();
        let pick = pick_pair(memes, history, &mut rand::thread_rng()).ok_or(ArenaError::NotEnoughContenders)?;

        let session = sessions.entry(user_id.to_string()).or_default();
        if pick.history_reset {
            debug!(user_id, cleared = session.history.len(), "Battle history reset");
            session.history.clear();
        }
        session.state = BattleState::AwaitingJudgment {
            left: pick.left.id.clone(),
            right: pick.right.id.clone(),
        };
        Ok((pick.left, pick.right))
    }

    /// Checks that a judgment matches the pair presented to `user_id`, in
    /// either order. A user with no pair on display may judge any pair.
    pub async fn check_judgment(&self, user_id: &str, winner_id: &str, loser_id: &str) -> Result<(), ArenaError> {
        let sessions = self.sessions.lock().await;
        match sessions.get(user_id).map(|session| &session.state) {
            Some(BattleState::AwaitingJudgment { left, right }) => {
                let presented = (left == winner_id && right == loser_id) || (left == loser_id && right == winner_id);
                if presented {
                    Ok(())
                } else {
                    Err(ArenaError::validation("judgment does not match the presented pair"))
                }
            }
            Some(BattleState::Idle) | None => Ok(()),
        }
    }

    /// Records a judged pair in the user's history and returns them to `Idle`.
    pub async fn conclude(&self, user_id: &str, winner_id: &str, loser_id: &str) {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.entry(user_id.to_string()).or_default();
        session.history.push(winner_id.to_string());
        session.history.push(loser_id.to_string());
        session.state = BattleState::Idle;
    }

    /// Abandons the presented pair without judging it. A session left with
    /// nothing to remember is dropped.
    pub async fn reshuffle(&self, user_id: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(user_id) {
            session.state = BattleState::Idle;
            if session.history.is_empty() {
                sessions.remove(user_id);
            }
        }
    }

    pub async fn state(&self, user_id: &str) -> BattleState {
        let sessions = self.sessions.lock().await;
        sessions
            .get(user_id)
            .map(|session| session.state.clone())
            .unwrap_or_default()
    }

    /// Number of users with a session in memory.
    pub async fn tracked_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn history(&self, user_id: &str) -> Vec<ItemId> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(user_id)
            .map(|session| session.history.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meme_arena_shared::types::MediaRef;

    fn meme(id: &str) -> Meme {
        Meme {
            id: id.to_string(),
            title: id.to_string(),
            media: MediaRef {
                url: format!("https://media.example/{id}.webp"),
                content_type: "image/webp".to_string(),
                size_bytes: 10,
            },
            tags: vec![],
            owner_id: "o".to_string(),
            author: "o".to_string(),
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            comment_count: 0,
            user_vote: None,
        }
    }

    fn memes(ids: &[&str]) -> Vec<Meme> {
        ids.iter().map(|id| meme(id)).collect()
    }

    #[test]
    fn test_pick_pair_needs_two_memes() {
        let mut rng = rand::thread_rng();
        assert!(pick_pair(&[], &[], &mut rng).is_none());
        assert!(pick_pair(&memes(&["a"]), &[], &mut rng).is_none());
    }

    #[test]
    fn test_pick_pair_is_distinct_and_from_set() {
        let all = memes(&["a", "b", "c", "d"]);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let pick = pick_pair(&all, &[], &mut rng).unwrap();
            assert_ne!(pick.left.id, pick.right.id);
            assert!(all.contains(&pick.left));
            assert!(all.contains(&pick.right));
            assert!(!pick.history_reset);
        }
    }

    #[test]
    fn test_pick_pair_excludes_history() {
        let all = memes(&["a", "b", "c", "d"]);
        let history = vec!["a".to_string(), "b".to_string()];
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let pick = pick_pair(&all, &history, &mut rng).unwrap();
            let mut ids = vec![pick.left.id, pick.right.id];
            ids.sort();
            assert_eq!(ids, vec!["c", "d"]);
        }
    }

    #[test]
    fn test_pick_pair_resets_exhausted_history() {
        let all = memes(&["a", "b", "c"]);
        let history = vec!["a".to_string(), "b".to_string()];
        let pick = pick_pair(&all, &history, &mut rand::thread_rng()).unwrap();
        assert!(pick.history_reset);
        assert_ne!(pick.left.id, pick.right.id);
    }

    #[tokio::test]
    async fn test_state_machine_transitions() {
        let selector = BattleSelector::new();
        let all = memes(&["a", "b"]);
        assert_eq!(selector.state("u1").await, BattleState::Idle);

        let (left, right) = selector.present(Some("u1"), &all).await.unwrap();
        assert_eq!(
            selector.state("u1").await,
            BattleState::AwaitingJudgment { left: left.id.clone(), right: right.id.clone() }
        );

        selector.conclude("u1", &left.id, &right.id).await;
        assert_eq!(selector.state("u1").await, BattleState::Idle);
        assert_eq!(selector.history("u1").await.len(), 2);

        selector.present(Some("u1"), &all).await.unwrap();
        selector.reshuffle("u1").await;
        assert_eq!(selector.state("u1").await, BattleState::Idle);
    }

    #[tokio::test]
    async fn test_history_cleared_when_exhausted() {
        let selector = BattleSelector::new();
        let all = memes(&["a", "b"]);
        selector.conclude("u1", "a", "b").await;

        selector.present(Some("u1"), &all).await.unwrap();

        assert!(selector.history("u1").await.is_empty());
    }

    #[tokio::test]
    async fn test_not_enough_contenders() {
        let selector = BattleSelector::new();
        let result = selector.present(Some("u1"), &memes(&["a"])).await;
        assert!(matches!(result, Err(ArenaError::NotEnoughContenders)));
        let result = selector.present(None, &[]).await;
        assert!(matches!(result, Err(ArenaError::NotEnoughContenders)));
        assert_eq!(selector.tracked_sessions().await, 0);
    }

    #[tokio::test]
    async fn test_judgment_must_match_presented_pair() {
        let selector = BattleSelector::new();
        assert!(selector.check_judgment("u1", "a", "b").await.is_ok());

        selector.present(Some("u1"), &memes(&["a", "b"])).await.unwrap();

        assert!(selector.check_judgment("u1", "a", "b").await.is_ok());
        assert!(selector.check_judgment("u1", "b", "a").await.is_ok());
        assert!(matches!(
            selector.check_judgment("u1", "a", "c").await,
            Err(ArenaError::ValidationError(_))
        ));
        assert!(selector.check_judgment("u2", "a", "c").await.is_ok());
    }

    #[tokio::test]
    async fn test_skipped_sessions_without_history_are_dropped() {
        let selector = BattleSelector::new();
        let all = memes(&["a", "b", "c"]);
        for user in ["u1", "u2", "u3"] {
            selector.present(Some(user), &all).await.unwrap();
        }
        assert_eq!(selector.tracked_sessions().await, 3);

        selector.reshuffle("u1").await;
        selector.reshuffle("u2").await;
        assert_eq!(selector.tracked_sessions().await, 1);

        selector.conclude("u3", "a", "b").await;
        selector.present(Some("u3"), &memes(&["a", "b", "c", "d"])).await.unwrap();
        selector.reshuffle("u3").await;
        assert_eq!(selector.tracked_sessions().await, 1);
        assert_eq!(selector.history("u3").await.len(), 2);
    }
}
