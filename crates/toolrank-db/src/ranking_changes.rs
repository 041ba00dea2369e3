//! Database operations for `article_rankings_changes`, the ranking ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use toolrank_core::ChangeType;
use uuid::Uuid;

use crate::DbError;

macro_rules! change_columns {
    () => {
        "id, article_id, tool_id, tool_name, article_url, metric_changes, old_rank, \
         new_rank, rank_change, old_score, new_score, score_change, change_type, \
         change_reason, is_applied, applied_at, rolled_back, rolled_back_at, created_at"
    };
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `article_rankings_changes` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankingChangeRow {
    pub id: Uuid,
    pub article_id: Uuid,
    pub tool_id: String,
    pub tool_name: String,
    pub article_url: Option<String>,
    pub metric_changes: serde_json::Value,
    pub old_rank: Option<i32>,
    pub new_rank: Option<i32>,
    pub rank_change: i32,
    pub old_score: Decimal,
    pub new_score: Decimal,
    pub score_change: Decimal,
    pub change_type: String,
    pub change_reason: String,
    pub is_applied: bool,
    pub applied_at: Option<DateTime<Utc>>,
    pub rolled_back: bool,
    pub rolled_back_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A fully-defaulted ledger entry ready to insert.
#[derive(Debug, Clone)]
pub struct NewRankingChange {
    pub article_id: Uuid,
    pub tool_id: String,
    pub tool_name: String,
    pub article_url: Option<String>,
    pub metric_changes: serde_json::Value,
    pub old_rank: Option<i32>,
    pub new_rank: Option<i32>,
    pub rank_change: i32,
    pub old_score: Decimal,
    pub new_score: Decimal,
    pub score_change: Decimal,
    pub change_type: ChangeType,
    pub change_reason: String,
    pub is_applied: bool,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Inserts a batch of ledger entries in a single transaction.
///
/// Applied entries get `applied_at = NOW()`. Either every entry is stored or
/// none is.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the transaction is rolled back.
pub async fn insert_ranking_changes(
    pool: &PgPool,
    changes: &[NewRankingChange],
) -> Result<Vec<RankingChangeRow>, DbError> {
    if changes.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(changes.len());

    for change in changes {
        let row = sqlx::query_as::<_, RankingChangeRow>(concat!(
            "INSERT INTO article_rankings_changes (article_id, tool_id, tool_name, \
             article_url, metric_changes, old_rank, new_rank, rank_change, old_score, \
             new_score, score_change, change_type, change_reason, is_applied, applied_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
                     CASE WHEN $14 THEN NOW() ELSE NULL END) \
             RETURNING ",
            change_columns!()
        ))
        .bind(change.article_id)
        .bind(&change.tool_id)
        .bind(&change.tool_name)
        .bind(&change.article_url)
        .bind(&change.metric_changes)
        .bind(change.old_rank)
        .bind(change.new_rank)
        .bind(change.rank_change)
        .bind(change.old_score)
        .bind(change.new_score)
        .bind(change.score_change)
        .bind(change.change_type.as_str())
        .bind(&change.change_reason)
        .bind(change.is_applied)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

/// Flags every applied, not-yet-rolled-back entry for the article as rolled
/// back. Returns the number of entries affected; a second call returns 0.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn rollback_ranking_changes(pool: &PgPool, article_id: Uuid) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE article_rankings_changes \
         SET is_applied = FALSE, rolled_back = TRUE, rolled_back_at = NOW() \
         WHERE article_id = $1 AND is_applied = TRUE AND rolled_back = FALSE",
    )
    .bind(article_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All entries for an article, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ranking_changes_for_article(
    pool: &PgPool,
    article_id: Uuid,
) -> Result<Vec<RankingChangeRow>, DbError> {
    let rows = sqlx::query_as::<_, RankingChangeRow>(concat!(
        "SELECT ",
        change_columns!(),
        " FROM article_rankings_changes \
         WHERE article_id = $1 \
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The most recent applied entries across all articles.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_ranking_changes(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RankingChangeRow>, DbError> {
    let rows = sqlx::query_as::<_, RankingChangeRow>(concat!(
        "SELECT ",
        change_columns!(),
        " FROM article_rankings_changes \
         WHERE is_applied = TRUE \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
