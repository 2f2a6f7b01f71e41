mod battle;
mod changeset;
mod comment;
mod daily_selection;
mod item;
mod meme;
mod user_vote;
mod vote_event;
mod votes_count;

pub use battle::{BattleJudgment, PairKey};
pub use changeset::VoteChangeset;
pub use comment::Comment;
pub use daily_selection::DailySelection;
pub use item::{ItemId, ItemKind, ItemRef, UserId};
pub use meme::{MediaRef, Meme};
pub use user_vote::{UserVote, VoteDirection};
pub use vote_event::VoteEvent;
pub use votes_count::{CounterDrift, VotesCount};
