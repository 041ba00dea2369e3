//! Database operations for `article_processing_logs`.
//!
//! A log is created in `started` status and moved to `completed` or `failed`
//! exactly once.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use toolrank_core::ProcessingAction;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `article_processing_logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProcessingLogRow {
    pub id: Uuid,
    pub article_id: Option<Uuid>,
    pub action: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub tools_affected: i32,
    pub companies_affected: i32,
    pub rankings_changed: i32,
    pub error_message: Option<String>,
    pub debug_info: Option<serde_json::Value>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProcessingLog {
    pub article_id: Option<Uuid>,
    pub action: ProcessingAction,
    pub performed_by: String,
    pub debug_info: Option<serde_json::Value>,
}

/// Counters recorded when a log completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogOutcome {
    pub duration_ms: i64,
    pub tools_affected: i32,
    pub companies_affected: i32,
    pub rankings_changed: i32,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Creates a log row in `started` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn start_processing_log(
    pool: &PgPool,
    log: &NewProcessingLog,
) -> Result<ProcessingLogRow, DbError> {
    let row = sqlx::query_as::<_, ProcessingLogRow>(
        "INSERT INTO article_processing_logs (article_id, action, status, performed_by, debug_info) \
         VALUES ($1, $2, 'started', $3, $4) \
         RETURNING id, article_id, action, status, started_at, completed_at, duration_ms, \
                   tools_affected, companies_affected, rankings_changed, error_message, \
                   debug_info, performed_by, created_at",
    )
    .bind(log.article_id)
    .bind(log.action.as_str())
    .bind(&log.performed_by)
    .bind(&log.debug_info)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a `started` log as `completed` with the given counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the log is not `started`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_processing_log(
    pool: &PgPool,
    id: Uuid,
    outcome: &LogOutcome,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE article_processing_logs \
         SET status = 'completed', completed_at = NOW(), duration_ms = $2, \
             tools_affected = $3, companies_affected = $4, rankings_changed = $5 \
         WHERE id = $1 AND status = 'started'",
    )
    .bind(id)
    .bind(outcome.duration_ms)
    .bind(outcome.tools_affected)
    .bind(outcome.companies_affected)
    .bind(outcome.rankings_changed)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidTransition {
            entity: "processing log",
            id,
            expected_status: "started",
        });
    }
    Ok(())
}

/// Marks a `started` log as `failed`, recording the error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidTransition`] if the log is not `started`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_processing_log(
    pool: &PgPool,
    id: Uuid,
    error_message: &str,
    duration_ms: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE article_processing_logs \
         SET status = 'failed', completed_at = NOW(), duration_ms = $2, error_message = $3 \
         WHERE id = $1 AND status = 'started'",
    )
    .bind(id)
    .bind(duration_ms)
    .bind(error_message)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidTransition {
            entity: "processing log",
            id,
            expected_status: "started",
        });
    }
    Ok(())
}

/// All logs for an article, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_processing_logs(
    pool: &PgPool,
    article_id: Uuid,
) -> Result<Vec<ProcessingLogRow>, DbError> {
    let rows = sqlx::query_as::<_, ProcessingLogRow>(
        "SELECT id, article_id, action, status, started_at, completed_at, duration_ms, \
                tools_affected, companies_affected, rankings_changed, error_message, \
                debug_info, performed_by, created_at \
         FROM article_processing_logs \
         WHERE article_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(article_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
