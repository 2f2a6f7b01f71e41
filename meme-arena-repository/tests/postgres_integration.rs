//! Integration tests for the PostgreSQL arena repository.
//!
//! These tests require a real PostgreSQL database (`DATABASE_URL`) and use
//! SQLx test macros for per-test databases and cleanup.
//!
//! Run with: `cargo test -p meme-arena-repository --features postgres-tests --test postgres_integration`
#![cfg(feature = "postgres-tests")]

use chrono::{NaiveDate, Utc};
use meme_arena_repository::{ArenaRepository, ArenaRepositoryError, PostgresArenaRepository};
use meme_arena_shared::types::{
    BattleJudgment, Comment, DailySelection, ItemKind, ItemRef, MediaRef, Meme, PairKey, UserVote,
    VoteChangeset, VoteDirection,
};
use sqlx::Row;
use uuid::Uuid;

/// Creates a test meme with the given counters.
fn make_meme(upvotes: i64, downvotes: i64) -> Meme {
    Meme {
        id: Uuid::new_v4().to_string(),
        title: "When the build is green on the first try".to_string(),
        media: MediaRef {
            url: "https://media.example/green.png".to_string(),
            content_type: "image/png".to_string(),
            size_bytes: 2048,
        },
        tags: vec!["ci".to_string()],
        owner_id: "owner-1".to_string(),
        author: "Owner".to_string(),
        upvotes,
        downvotes,
        created_at: Utc::now(),
        comment_count: 0,
        user_vote: None,
    }
}

fn make_comment(meme_id: &str) -> Comment {
    Comment {
        id: Uuid::new_v4().to_string(),
        meme_id: meme_id.to_string(),
        owner_id: "owner-2".to_string(),
        author: "Commenter".to_string(),
        text: "classic".to_string(),
        upvotes: 0,
        downvotes: 0,
        created_at: Utc::now(),
        user_vote: None,
    }
}

fn make_vote(user: &str, item: &ItemRef, direction: VoteDirection) -> UserVote {
    UserVote {
        user_id: user.to_string(),
        item: item.clone(),
        direction,
        voted_at: Utc::now(),
    }
}

fn first_vote(user: &str, item: &ItemRef, direction: VoteDirection) -> VoteChangeset {
    let (upvotes_delta, downvotes_delta) = match direction {
        VoteDirection::Up => (1, 0),
        VoteDirection::Down => (0, 1),
    };
    VoteChangeset {
        item: item.clone(),
        user_id: user.to_string(),
        previous: None,
        next: Some(make_vote(user, item, direction)),
        upvotes_delta,
        downvotes_delta,
    }
}

// ============================================================================
// Meme Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_insert_and_get_meme(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(0, 0);

    repository.insert_meme(&meme).await.unwrap();

    let stored = repository.get_meme(&meme.id).await.unwrap().unwrap();
    assert_eq!(stored.title, meme.title);
    assert_eq!(stored.media, meme.media);
    assert_eq!(stored.tags, meme.tags);
    assert_eq!(stored.comment_count, 0);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_list_memes_newest_first(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let mut older = make_meme(0, 0);
    older.created_at = Utc::now() - chrono::Duration::hours(1);
    let newer = make_meme(0, 0);

    repository.insert_meme(&older).await.unwrap();
    repository.insert_meme(&newer).await.unwrap();

    let ids: Vec<String> = repository
        .list_memes()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![newer.id, older.id]);
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_delete_meme_cascades(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(0, 0);
    repository.insert_meme(&meme).await.unwrap();
    let comment = make_comment(&meme.id);
    repository.insert_comment(&comment).await.unwrap();

    let meme_ref = ItemRef::meme(meme.id.clone());
    let comment_ref = ItemRef::comment(comment.id.clone());
    repository
        .persist_vote_changeset(&first_vote("u1", &meme_ref, VoteDirection::Up))
        .await
        .unwrap();
    repository
        .persist_vote_changeset(&first_vote("u1", &comment_ref, VoteDirection::Down))
        .await
        .unwrap();

    let removed = repository.delete_meme(&meme.id).await.unwrap().unwrap();
    assert_eq!(removed.upvotes, 1);
    assert_eq!(removed.comment_count, 1);

    let votes = sqlx::query("SELECT * FROM votes").fetch_all(&pool).await.unwrap();
    assert!(votes.is_empty());
    let comments = sqlx::query("SELECT * FROM comments").fetch_all(&pool).await.unwrap();
    assert!(comments.is_empty());
    assert!(repository.delete_meme(&meme.id).await.unwrap().is_none());
}

// ============================================================================
// Vote Changeset Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_vote_changesets_follow_toggle_and_switch(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(234, 12);
    repository.insert_meme(&meme).await.unwrap();
    let item = ItemRef::meme(meme.id.clone());

    let up = first_vote("u1", &item, VoteDirection::Up);
    let counts = repository.persist_vote_changeset(&up).await.unwrap();
    assert_eq!((counts.upvotes, counts.downvotes), (235, 12));

    let toggle_off = VoteChangeset {
        previous: up.next.clone(),
        next: None,
        upvotes_delta: -1,
        downvotes_delta: 0,
        ..up.clone()
    };
    let counts = repository.persist_vote_changeset(&toggle_off).await.unwrap();
    assert_eq!((counts.upvotes, counts.downvotes), (234, 12));
    assert!(repository.get_user_vote("u1", &item).await.unwrap().is_none());

    let down = first_vote("u1", &item, VoteDirection::Down);
    let counts = repository.persist_vote_changeset(&down).await.unwrap();
    assert_eq!((counts.upvotes, counts.downvotes), (234, 13));

    let switch = VoteChangeset {
        previous: down.next.clone(),
        next: down.next.as_ref().map(|v| v.switched_to(VoteDirection::Up)),
        upvotes_delta: 1,
        downvotes_delta: -1,
        ..down.clone()
    };
    let counts = repository.persist_vote_changeset(&switch).await.unwrap();
    assert_eq!((counts.upvotes, counts.downvotes), (235, 12));

    let rows = sqlx::query("SELECT direction FROM votes WHERE item_id = $1")
        .bind(&meme.id)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get::<i16, _>("direction"), VoteDirection::Up.as_code());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_stale_changeset_rolls_back(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(0, 0);
    repository.insert_meme(&meme).await.unwrap();
    let item = ItemRef::meme(meme.id.clone());

    repository
        .persist_vote_changeset(&first_vote("u1", &item, VoteDirection::Up))
        .await
        .unwrap();
    let result = repository
        .persist_vote_changeset(&first_vote("u1", &item, VoteDirection::Up))
        .await;

    assert!(matches!(
        result,
        Err(ArenaRepositoryError::ConcurrentModification(_))
    ));
    let stored = repository.get_meme(&meme.id).await.unwrap().unwrap();
    assert_eq!((stored.upvotes, stored.downvotes), (1, 0));
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_vote_on_missing_item_is_not_found(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let result = repository
        .persist_vote_changeset(&first_vote("u1", &ItemRef::meme("missing"), VoteDirection::Up))
        .await;
    assert!(matches!(result, Err(ArenaRepositoryError::NotFound(_))));

    let votes = sqlx::query("SELECT * FROM votes").fetch_all(&pool).await.unwrap();
    assert!(votes.is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_reconcile_reports_and_repairs_drift(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(5, 2);
    repository.insert_meme(&meme).await.unwrap();
    let item = ItemRef::meme(meme.id.clone());
    repository
        .persist_vote_changeset(&first_vote("u1", &item, VoteDirection::Up))
        .await
        .unwrap();

    let drifts = repository.reconcile_vote_counts().await.unwrap();
    assert_eq!(drifts.len(), 1);
    assert_eq!(drifts[0].item, item);
    assert_eq!((drifts[0].recorded_upvotes, drifts[0].recorded_downvotes), (6, 2));
    assert_eq!((drifts[0].ledger_upvotes, drifts[0].ledger_downvotes), (1, 0));

    assert!(repository.reconcile_vote_counts().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_user_votes_by_kind(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let meme = make_meme(0, 0);
    repository.insert_meme(&meme).await.unwrap();
    let comment = make_comment(&meme.id);
    repository.insert_comment(&comment).await.unwrap();

    repository
        .persist_vote_changeset(&first_vote("u1", &ItemRef::meme(meme.id.clone()), VoteDirection::Up))
        .await
        .unwrap();
    repository
        .persist_vote_changeset(&first_vote("u1", &ItemRef::comment(comment.id.clone()), VoteDirection::Down))
        .await
        .unwrap();

    let meme_votes = repository.get_user_votes("u1", ItemKind::Meme).await.unwrap();
    assert_eq!(meme_votes.len(), 1);
    assert_eq!(meme_votes[0].direction, VoteDirection::Up);

    let recent = repository.recent_upvotes("u1", 5).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].item.id, meme.id);
}

// ============================================================================
// Battle & Daily Selection Tests
// ============================================================================

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_battle_judgment_unique_per_pair(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let judgment = BattleJudgment {
        user_id: "u1".to_string(),
        pair_key: PairKey::new("b", "a"),
        winner_id: "a".to_string(),
        judged_at: Utc::now(),
    };

    assert!(repository.record_battle_judgment(&judgment).await.unwrap());
    assert!(!repository.record_battle_judgment(&judgment).await.unwrap());
    let other_user = BattleJudgment {
        user_id: "u2".to_string(),
        pair_key: PairKey::new("a", "b"),
        ..judgment.clone()
    };
    assert!(repository.record_battle_judgment(&other_user).await.unwrap());

    repository.forget_battle_judgment("u1", &judgment.pair_key).await.unwrap();
    assert!(repository.record_battle_judgment(&judgment).await.unwrap());
}

#[sqlx::test(migrations = "src/postgres/migrations")]
async fn test_daily_selection_first_write_wins(pool: sqlx::PgPool) {
    let repository = PostgresArenaRepository::new(pool.clone()).await.unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let first = DailySelection { date, item_id: "m1".to_string() };
    let second = DailySelection { date, item_id: "m2".to_string() };

    assert_eq!(repository.save_daily_selection(&first).await.unwrap(), first);
    assert_eq!(repository.save_daily_selection(&second).await.unwrap(), first);
    assert_eq!(repository.get_daily_selection(date).await.unwrap(), Some(first));

    repository.replace_daily_selection(&second).await.unwrap();
    assert_eq!(repository.get_daily_selection(date).await.unwrap(), Some(second));
}
