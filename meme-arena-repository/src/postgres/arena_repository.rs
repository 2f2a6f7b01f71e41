//! PostgreSQL implementation of the arena repository.
//!
//! Provides the durable backend for the `ArenaRepository` trait with
//! connection pooling, transactions, and embedded migrations.
//!
//! ## Database Tables
//!
//! - `memes`, `comments`: items with their cached `upvotes`/`downvotes`
//! - `votes`: the vote ledger, unique on (user_id, item_kind, item_id)
//! - `battle_judgments`: unique on (user_id, pair_key)
//! - `daily_selections`: item of the day keyed by date
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use meme_arena_shared::types::{
    BattleJudgment, Comment, CounterDrift, DailySelection, ItemKind, ItemRef, MediaRef, Meme,
    PairKey, UserVote, VoteChangeset, VoteDirection, VotesCount,
};
use tracing::{debug, info};

use crate::{ArenaRepository, ArenaRepositoryError};

const MEME_COLUMNS: &str = "m.id, m.title, m.media_url, m.media_content_type, m.media_size_bytes, \
     m.tags, m.owner_id, m.author, m.upvotes, m.downvotes, m.created_at, \
     (SELECT COUNT(*) FROM comments c WHERE c.meme_id = m.id) AS comment_count";

const COMMENT_COLUMNS: &str =
    "id, meme_id, owner_id, author, body, upvotes, downvotes, created_at";

const VOTE_COLUMNS: &str = "user_id, item_kind, item_id, direction, voted_at";

/// Table holding the counters of items of the given kind.
fn counter_table(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Meme => "memes",
        ItemKind::Comment => "comments",
    }
}

#[derive(sqlx::FromRow)]
struct MemeRow {
    id: String,
    title: String,
    media_url: String,
    media_content_type: String,
    media_size_bytes: i64,
    tags: Vec<String>,
    owner_id: String,
    author: String,
    upvotes: i64,
    downvotes: i64,
    created_at: DateTime<Utc>,
    comment_count: i64,
}

impl TryFrom<MemeRow> for Meme {
    type Error = ArenaRepositoryError;

    fn try_from(row: MemeRow) -> Result<Self, Self::Error> {
        let size_bytes = u64::try_from(row.media_size_bytes)
            .map_err(|_| ArenaRepositoryError::InvalidMediaSize(row.media_size_bytes))?;
        Ok(Meme {
            id: row.id,
            title: row.title,
            media: MediaRef {
                url: row.media_url,
                content_type: row.media_content_type,
                size_bytes,
            },
            tags: row.tags,
            owner_id: row.owner_id,
            author: row.author,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            created_at: row.created_at,
            comment_count: row.comment_count,
            user_vote: None,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: String,
    meme_id: String,
    owner_id: String,
    author: String,
    body: String,
    upvotes: i64,
    downvotes: i64,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            meme_id: row.meme_id,
            owner_id: row.owner_id,
            author: row.author,
            text: row.body,
            upvotes: row.upvotes,
            downvotes: row.downvotes,
            created_at: row.created_at,
            user_vote: None,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VoteRow {
    user_id: String,
    item_kind: i16,
    item_id: String,
    direction: i16,
    voted_at: DateTime<Utc>,
}

impl TryFrom<VoteRow> for UserVote {
    type Error = ArenaRepositoryError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        let kind = ItemKind::from_code(row.item_kind)
            .ok_or(ArenaRepositoryError::InvalidItemKind(row.item_kind))?;
        let direction = VoteDirection::from_code(row.direction)
            .ok_or(ArenaRepositoryError::InvalidVoteType(row.direction))?;
        Ok(UserVote {
            user_id: row.user_id,
            item: ItemRef { kind, id: row.item_id },
            direction,
            voted_at: row.voted_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TallyRow {
    id: String,
    upvotes: i64,
    downvotes: i64,
    ledger_upvotes: i64,
    ledger_downvotes: i64,
}

/// PostgreSQL implementation of the arena repository.
///
/// Every write that touches more than one row runs inside a single
/// transaction; dropping the transaction on an early return rolls it back.
pub struct PostgresArenaRepository {
    pool: sqlx::PgPool,
}

impl PostgresArenaRepository {
    /// Creates a repository over an existing pool. The schema must already exist.
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, ArenaRepositoryError> {
        Ok(Self { pool })
    }

    /// Connects to `url` and applies the embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, ArenaRepositoryError> {
        let pool = sqlx::PgPool::connect(url).await?;
        let repository = Self::new(pool).await?;
        repository.migrate().await?;
        Ok(repository)
    }

    pub async fn migrate(&self) -> Result<(), ArenaRepositoryError> {
        sqlx::migrate!("./src/postgres/migrations")
            .run(&self.pool)
            .await?;
        info!("Arena schema migrations applied");
        Ok(())
    }

    /// Moves the vote ledger from `changeset.previous` to `changeset.next`.
    ///
    /// Each statement is conditioned on the previous ledger state, so zero
    /// affected rows means another writer got there first.
    async fn apply_ledger_transition_tx(
        &self,
        changeset: &VoteChangeset,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<(), ArenaRepositoryError> {
        let kind = changeset.item.kind.as_code();
        let result = match (&changeset.previous, &changeset.next) {
            (None, None) => return Ok(()),
            (None, Some(next)) => {
                sqlx::query(
                    r#"
                    INSERT INTO votes (user_id, item_kind, item_id, direction, voted_at)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (user_id, item_kind, item_id) DO NOTHING
                    "#,
                )
                .bind(&changeset.user_id)
                .bind(kind)
                .bind(&changeset.item.id)
                .bind(next.direction.as_code())
                .bind(next.voted_at)
                .execute(&mut **tx)
                .await?
            }
            (Some(previous), Some(next)) => {
                sqlx::query(
                    r#"
                    UPDATE votes SET direction = $4
                    WHERE user_id = $1 AND item_kind = $2 AND item_id = $3 AND direction = $5
                    "#,
                )
                .bind(&changeset.user_id)
                .bind(kind)
                .bind(&changeset.item.id)
                .bind(next.direction.as_code())
                .bind(previous.direction.as_code())
                .execute(&mut **tx)
                .await?
            }
            (Some(previous), None) => {
                sqlx::query(
                    r#"
                    DELETE FROM votes
                    WHERE user_id = $1 AND item_kind = $2 AND item_id = $3 AND direction = $4
                    "#,
                )
                .bind(&changeset.user_id)
                .bind(kind)
                .bind(&changeset.item.id)
                .bind(previous.direction.as_code())
                .execute(&mut **tx)
                .await?
            }
        };

        if result.rows_affected() != 1 {
            return Err(ArenaRepositoryError::ConcurrentModification(
                changeset.item.clone(),
            ));
        }
        Ok(())
    }

    /// Adds the changeset's deltas to the item's counters and returns the new values.
    async fn apply_counter_deltas_tx(
        &self,
        changeset: &VoteChangeset,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<VotesCount, ArenaRepositoryError> {
        let sql = format!(
            "UPDATE {} SET upvotes = upvotes + $1, downvotes = downvotes + $2 \
             WHERE id = $3 RETURNING upvotes, downvotes",
            counter_table(changeset.item.kind)
        );
        let (upvotes, downvotes): (i64, i64) = sqlx::query_as(&sql)
            .bind(changeset.upvotes_delta)
            .bind(changeset.downvotes_delta)
            .bind(&changeset.item.id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| ArenaRepositoryError::NotFound(changeset.item.clone()))?;
        Ok(VotesCount {
            item: changeset.item.clone(),
            upvotes,
            downvotes,
        })
    }

    async fn reconcile_kind_tx(
        &self,
        kind: ItemKind,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> Result<Vec<CounterDrift>, ArenaRepositoryError> {
        let table = counter_table(kind);
        let tally_sql = format!(
            "SELECT i.id, i.upvotes, i.downvotes, \
                 COUNT(v.item_id) FILTER (WHERE v.direction = 0) AS ledger_upvotes, \
                 COUNT(v.item_id) FILTER (WHERE v.direction = 1) AS ledger_downvotes \
             FROM {table} i \
             LEFT JOIN votes v ON v.item_kind = $1 AND v.item_id = i.id \
             GROUP BY i.id, i.upvotes, i.downvotes"
        );
        let rows: Vec<TallyRow> = sqlx::query_as(&tally_sql)
            .bind(kind.as_code())
            .fetch_all(&mut **tx)
            .await?;

        let update_sql = format!("UPDATE {table} SET upvotes = $1, downvotes = $2 WHERE id = $3");
        let mut drifts = Vec::new();
        for row in rows {
            if row.upvotes == row.ledger_upvotes && row.downvotes == row.ledger_downvotes {
                continue;
            }
            sqlx::query(&update_sql)
                .bind(row.ledger_upvotes)
                .bind(row.ledger_downvotes)
                .bind(&row.id)
                .execute(&mut **tx)
                .await?;
            drifts.push(CounterDrift {
                item: ItemRef { kind, id: row.id },
                recorded_upvotes: row.upvotes,
                recorded_downvotes: row.downvotes,
                ledger_upvotes: row.ledger_upvotes,
                ledger_downvotes: row.ledger_downvotes,
            });
        }
        Ok(drifts)
    }
}

#[async_trait]
impl ArenaRepository for PostgresArenaRepository {
    async fn insert_meme(&self, meme: &Meme) -> Result<(), ArenaRepositoryError> {
        let size_bytes = i64::try_from(meme.media.size_bytes)
            .map_err(|_| ArenaRepositoryError::InvalidMediaSize(i64::MAX))?;
        sqlx::query(
            r#"
            INSERT INTO memes (id, title, media_url, media_content_type, media_size_bytes,
                               tags, owner_id, author, upvotes, downvotes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(&meme.id)
        .bind(&meme.title)
        .bind(&meme.media.url)
        .bind(&meme.media.content_type)
        .bind(size_bytes)
        .bind(&meme.tags)
        .bind(&meme.owner_id)
        .bind(&meme.author)
        .bind(meme.upvotes)
        .bind(meme.downvotes)
        .bind(meme.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError> {
        let sql = format!("SELECT {MEME_COLUMNS} FROM memes m WHERE m.id = $1");
        sqlx::query_as::<_, MemeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Meme::try_from)
            .transpose()
    }

    async fn list_memes(&self) -> Result<Vec<Meme>, ArenaRepositoryError> {
        let sql = format!("SELECT {MEME_COLUMNS} FROM memes m ORDER BY m.created_at DESC, m.seq DESC");
        sqlx::query_as::<_, MemeRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Meme::try_from)
            .collect()
    }

    async fn delete_meme(&self, id: &str) -> Result<Option<Meme>, ArenaRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {MEME_COLUMNS} FROM memes m WHERE m.id = $1 FOR UPDATE OF m");
        let Some(row) = sqlx::query_as::<_, MemeRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let meme = Meme::try_from(row)?;

        let comment_votes = sqlx::query(
            "DELETE FROM votes WHERE item_kind = $1 AND item_id IN (SELECT id FROM comments WHERE meme_id = $2)",
        )
        .bind(ItemKind::Comment.as_code())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let meme_votes = sqlx::query("DELETE FROM votes WHERE item_kind = $1 AND item_id = $2")
            .bind(ItemKind::Meme.as_code())
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let comments = sqlx::query("DELETE FROM comments WHERE meme_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM memes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(
            meme_id = id,
            meme_votes = meme_votes.rows_affected(),
            comments = comments.rows_affected(),
            comment_votes = comment_votes.rows_affected(),
            "Meme deleted with cascade"
        );
        Ok(Some(meme))
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), ArenaRepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (id, meme_id, owner_id, author, body, upvotes, downvotes, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8
            WHERE EXISTS (SELECT 1 FROM memes WHERE id = $2)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.meme_id)
        .bind(&comment.owner_id)
        .bind(&comment.author)
        .bind(&comment.text)
        .bind(comment.upvotes)
        .bind(comment.downvotes)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ArenaRepositoryError::NotFound(ItemRef::meme(
                comment.meme_id.clone(),
            )));
        }
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>, ArenaRepositoryError> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1");
        let row = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, meme_id: &str) -> Result<Vec<Comment>, ArenaRepositoryError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE meme_id = $1 ORDER BY created_at DESC, seq DESC"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&sql)
            .bind(meme_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn get_user_vote(
        &self,
        user_id: &str,
        item: &ItemRef,
    ) -> Result<Option<UserVote>, ArenaRepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE user_id = $1 AND item_kind = $2 AND item_id = $3"
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(user_id)
            .bind(item.kind.as_code())
            .bind(&item.id)
            .fetch_optional(&self.pool)
            .await?
            .map(UserVote::try_from)
            .transpose()
    }

    async fn get_user_votes(
        &self,
        user_id: &str,
        kind: ItemKind,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError> {
        let sql = format!("SELECT {VOTE_COLUMNS} FROM votes WHERE user_id = $1 AND item_kind = $2");
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(user_id)
            .bind(kind.as_code())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserVote::try_from)
            .collect()
    }

    async fn recent_upvotes(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<UserVote>, ArenaRepositoryError> {
        let sql = format!(
            "SELECT {VOTE_COLUMNS} FROM votes \
             WHERE user_id = $1 AND item_kind = $2 AND direction = $3 \
             ORDER BY voted_at DESC, seq DESC LIMIT $4"
        );
        sqlx::query_as::<_, VoteRow>(&sql)
            .bind(user_id)
            .bind(ItemKind::Meme.as_code())
            .bind(VoteDirection::Up.as_code())
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(UserVote::try_from)
            .collect()
    }

    async fn persist_vote_changeset(
        &self,
        changeset: &VoteChangeset,
    ) -> Result<VotesCount, ArenaRepositoryError> {
        let mut tx = self.pool.begin().await?;

        let lock_sql = format!(
            "SELECT id FROM {} WHERE id = $1 FOR UPDATE",
            counter_table(changeset.item.kind)
        );
        let locked: Option<String> = sqlx::query_scalar(&lock_sql)
            .bind(&changeset.item.id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(ArenaRepositoryError::NotFound(changeset.item.clone()));
        }

        self.apply_ledger_transition_tx(changeset, &mut tx).await?;
        let counts = self.apply_counter_deltas_tx(changeset, &mut tx).await?;

        tx.commit().await?;
        Ok(counts)
    }

    async fn reconcile_vote_counts(&self) -> Result<Vec<CounterDrift>, ArenaRepositoryError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE memes, comments, votes IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let mut drifts = self.reconcile_kind_tx(ItemKind::Meme, &mut tx).await?;
        drifts.extend(self.reconcile_kind_tx(ItemKind::Comment, &mut tx).await?);

        tx.commit().await?;
        Ok(drifts)
    }

    async fn record_battle_judgment(
        &self,
        judgment: &BattleJudgment,
    ) -> Result<bool, ArenaRepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO battle_judgments (user_id, pair_key, winner_id, judged_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, pair_key) DO NOTHING
            "#,
        )
        .bind(&judgment.user_id)
        .bind(judgment.pair_key.as_str())
        .bind(&judgment.winner_id)
        .bind(judgment.judged_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn forget_battle_judgment(
        &self,
        user_id: &str,
        pair_key: &PairKey,
    ) -> Result<(), ArenaRepositoryError> {
        sqlx::query("DELETE FROM battle_judgments WHERE user_id = $1 AND pair_key = $2")
            .bind(user_id)
            .bind(pair_key.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_daily_selection(
        &self,
        date: NaiveDate,
    ) -> Result<Option<DailySelection>, ArenaRepositoryError> {
        let item_id: Option<String> =
            sqlx::query_scalar("SELECT item_id FROM daily_selections WHERE selection_date = $1")
                .bind(date)
                .fetch_optional(&self.pool)
                .await?;
        Ok(item_id.map(|item_id| DailySelection { date, item_id }))
    }

    async fn save_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<DailySelection, ArenaRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO daily_selections (selection_date, item_id)
            VALUES ($1, $2)
            ON CONFLICT (selection_date) DO NOTHING
            "#,
        )
        .bind(selection.date)
        .bind(&selection.item_id)
        .execute(&self.pool)
        .await?;

        // Separate statement so a row committed concurrently by another caller is visible.
        let item_id: String =
            sqlx::query_scalar("SELECT item_id FROM daily_selections WHERE selection_date = $1")
                .bind(selection.date)
                .fetch_one(&self.pool)
                .await?;
        Ok(DailySelection {
            date: selection.date,
            item_id,
        })
    }

    async fn replace_daily_selection(
        &self,
        selection: &DailySelection,
    ) -> Result<(), ArenaRepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO daily_selections (selection_date, item_id)
            VALUES ($1, $2)
            ON CONFLICT (selection_date) DO UPDATE SET item_id = EXCLUDED.item_id
            "#,
        )
        .bind(selection.date)
        .bind(&selection.item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
