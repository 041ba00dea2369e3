//! Database operations for `ingestion_runs`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use toolrank_core::{RunStatus, RunType};
use uuid::Uuid;

use crate::DbError;

macro_rules! run_columns {
    () => {
        "id, run_type, status, articles_discovered, articles_passed_quality, \
         articles_ingested, articles_skipped, articles_skipped_semantic, articles_degraded, \
         ranking_changes, estimated_cost_usd, search_query, error_log, ingested_article_ids, \
         started_at, completed_at, created_at"
    };
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `ingestion_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestionRunRow {
    pub id: Uuid,
    pub run_type: String,
    /// `running`, `completed` or `failed`.
    pub status: String,
    pub articles_discovered: i32,
    pub articles_passed_quality: i32,
    pub articles_ingested: i32,
    pub articles_skipped: i32,
    /// Always 0: only URL-level deduplication is performed.
    pub articles_skipped_semantic: i32,
    /// Assessments that fell back to the reject default.
    pub articles_degraded: i32,
    pub ranking_changes: i32,
    pub estimated_cost_usd: Decimal,
    pub search_query: Option<String>,
    /// JSON array of error strings.
    pub error_log: serde_json::Value,
    /// JSON array of article UUID strings.
    pub ingested_article_ids: serde_json::Value,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewIngestionRun {
    pub run_type: RunType,
    pub search_query: Option<String>,
}

/// Full snapshot of a run's progress. Each update overwrites every counter.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionRunUpdate {
    pub status: RunStatus,
    pub articles_discovered: i32,
    pub articles_passed_quality: i32,
    pub articles_ingested: i32,
    pub articles_skipped: i32,
    pub articles_degraded: i32,
    pub ranking_changes: i32,
    pub estimated_cost_usd: Decimal,
    pub errors: Vec<String>,
    pub ingested_article_ids: Vec<Uuid>,
}

impl IngestionRunUpdate {
    pub(crate) fn error_log_json(&self) -> serde_json::Value {
        serde_json::Value::from(self.errors.clone())
    }

    pub(crate) fn article_ids_json(&self) -> serde_json::Value {
        self.ingested_article_ids
            .iter()
            .map(|id| serde_json::Value::String(id.to_string()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Creates a run in `running` status with `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_ingestion_run(
    pool: &PgPool,
    run: &NewIngestionRun,
) -> Result<IngestionRunRow, DbError> {
    let row = sqlx::query_as::<_, IngestionRunRow>(concat!(
        "INSERT INTO ingestion_runs (run_type, status, search_query) \
         VALUES ($1, 'running', $2) \
         RETURNING ",
        run_columns!()
    ))
    .bind(run.run_type.as_str())
    .bind(&run.search_query)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Writes a progress snapshot to a `running` run. A terminal status also
/// stamps `completed_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the run is no longer `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_ingestion_run(
    pool: &PgPool,
    id: Uuid,
    update: &IngestionRunUpdate,
) -> Result<(), DbError> {
    let status = update.status.persisted();
    let result = sqlx::query(
        "UPDATE ingestion_runs \
         SET status = $2, articles_discovered = $3, articles_passed_quality = $4, \
             articles_ingested = $5, articles_skipped = $6, ranking_changes = $7, \
             estimated_cost_usd = $8, error_log = $9, ingested_article_ids = $10, \
             articles_degraded = $11, \
             completed_at = CASE WHEN $2 = 'running' THEN NULL ELSE NOW() END \
         WHERE id = $1 AND status = 'running'",
    )
    .bind(id)
    .bind(status.as_str())
    .bind(update.articles_discovered)
    .bind(update.articles_passed_quality)
    .bind(update.articles_ingested)
    .bind(update.articles_skipped)
    .bind(update.ranking_changes)
    .bind(update.estimated_cost_usd)
    .bind(update.error_log_json())
    .bind(update.article_ids_json())
    .bind(update.articles_degraded)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidTransition {
            entity: "ingestion run",
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Fetches a run by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_ingestion_run(pool: &PgPool, id: Uuid) -> Result<Option<IngestionRunRow>, DbError> {
    let row = sqlx::query_as::<_, IngestionRunRow>(concat!(
        "SELECT ",
        run_columns!(),
        " FROM ingestion_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// The most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_ingestion_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<IngestionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, IngestionRunRow>(concat!(
        "SELECT ",
        run_columns!(),
        " FROM ingestion_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// A `running` run of `run_type` that started at or after `since`, if one exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_running_ingestion_run(
    pool: &PgPool,
    run_type: RunType,
    since: DateTime<Utc>,
) -> Result<Option<IngestionRunRow>, DbError> {
    let row = sqlx::query_as::<_, IngestionRunRow>(concat!(
        "SELECT ",
        run_columns!(),
        " FROM ingestion_runs \
         WHERE run_type = $1 AND status = 'running' AND started_at >= $2 \
         ORDER BY started_at DESC \
         LIMIT 1"
    ))
    .bind(run_type.as_str())
    .bind(since)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
