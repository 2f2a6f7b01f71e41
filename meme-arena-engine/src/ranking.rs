//! Ordered views over memes by net score.
use meme_arena_shared::types::Meme;
use serde::Serialize;

/// Leaderboard length used when the consumer does not pick one.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;

pub fn net_score(upvotes: i64, downvotes: i64) -> i64 {
    upvotes - downvotes
}

/// `round(up / (up + down) * 100)`, or 0 for an item nobody voted on.
pub fn approval_percentage(upvotes: i64, downvotes: i64) -> u8 {
    let total = upvotes + downvotes;
    if total <= 0 {
        return 0;
    }
    let percentage = (upvotes as f64 / total as f64 * 100.0).round();
    percentage.clamp(0.0, 100.0) as u8
}

/// Sorts memes by net score, highest first, and keeps the top `limit`.
///
/// `memes` must be in creation order (oldest first). The sort is stable, so
/// among equal scores the older meme ranks higher.
pub fn leaderboard(mut memes: Vec<Meme>, limit: usize) -> Vec<Meme> {
    memes.sort_by_key(|meme| std::cmp::Reverse(net_score(meme.upvotes, meme.downvotes)));
    memes.truncate(limit);
    memes
}

/// The meme that would top the leaderboard, if any.
pub fn leader(memes: Vec<Meme>) -> Option<Meme> {
    leaderboard(memes, 1).into_iter().next()
}

/// A leaderboard row as presented to consumers.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub net_score: i64,
    pub approval_percentage: u8,
    #[serde(flatten)]
    pub meme: Meme,
}

/// Numbers an already ranked list starting at 1.
pub fn entries(ranked: Vec<Meme>) -> Vec<LeaderboardEntry> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(index, meme)| LeaderboardEntry {
            rank: index + 1,
            net_score: net_score(meme.upvotes, meme.downvotes),
            approval_percentage: approval_percentage(meme.upvotes, meme.downvotes),
            meme,
        })
        .collect()
}
