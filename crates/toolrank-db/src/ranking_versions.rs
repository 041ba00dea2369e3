//! Database operations for `ranking_versions`. Versions are append-only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `ranking_versions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RankingVersionRow {
    pub id: Uuid,
    pub version: String,
    pub article_id: Option<Uuid>,
    pub rankings_snapshot: serde_json::Value,
    pub changes_summary: Option<String>,
    pub news_items_count: i32,
    pub tools_affected: i32,
    pub previous_version_id: Option<Uuid>,
    pub created_by: String,
    pub is_rollback: bool,
    pub rolled_back_from_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRankingVersion {
    pub version: String,
    pub article_id: Option<Uuid>,
    pub rankings_snapshot: serde_json::Value,
    pub changes_summary: Option<String>,
    pub news_items_count: i32,
    pub tools_affected: i32,
    pub previous_version_id: Option<Uuid>,
    pub created_by: String,
    pub is_rollback: bool,
    pub rolled_back_from_id: Option<Uuid>,
}

/// Inserts a new version.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including on a duplicate
/// version label.
pub async fn insert_ranking_version(
    pool: &PgPool,
    version: &NewRankingVersion,
) -> Result<RankingVersionRow, DbError> {
    let row = sqlx::query_as::<_, RankingVersionRow>(
        "INSERT INTO ranking_versions (version, article_id, rankings_snapshot, changes_summary, \
             news_items_count, tools_affected, previous_version_id, created_by, is_rollback, \
             rolled_back_from_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id, version, article_id, rankings_snapshot, changes_summary, news_items_count, \
                   tools_affected, previous_version_id, created_by, is_rollback, \
                   rolled_back_from_id, created_at",
    )
    .bind(&version.version)
    .bind(version.article_id)
    .bind(&version.rankings_snapshot)
    .bind(&version.changes_summary)
    .bind(version.news_items_count)
    .bind(version.tools_affected)
    .bind(version.previous_version_id)
    .bind(&version.created_by)
    .bind(version.is_rollback)
    .bind(version.rolled_back_from_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// The newest version, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_ranking_version(pool: &PgPool) -> Result<Option<RankingVersionRow>, DbError> {
    let row = sqlx::query_as::<_, RankingVersionRow>(
        "SELECT id, version, article_id, rankings_snapshot, changes_summary, news_items_count, \
                tools_affected, previous_version_id, created_by, is_rollback, \
                rolled_back_from_id, created_at \
         FROM ranking_versions \
         ORDER BY created_at DESC, id DESC \
         LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The most recent `limit` versions, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ranking_versions(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<RankingVersionRow>, DbError> {
    let rows = sqlx::query_as::<_, RankingVersionRow>(
        "SELECT id, version, article_id, rankings_snapshot, changes_summary, news_items_count, \
                tools_affected, previous_version_id, created_by, is_rollback, \
                rolled_back_from_id, created_at \
         FROM ranking_versions \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
