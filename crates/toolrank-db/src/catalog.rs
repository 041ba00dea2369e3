//! Tools, companies and the current tool ranking.
//!
//! These tables belong to the ranking system; ingestion reads them and may
//! add auto-created tools and companies discovered in articles.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use toolrank_core::{KnownCompany, KnownTool, ToolRanking};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ToolRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub category: String,
    pub company_id: Option<Uuid>,
    pub auto_created: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub auto_created: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ToolRankingRow {
    tool_id: Uuid,
    tool_name: String,
    rank: i32,
    score: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewTool {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub company_id: Option<Uuid>,
    pub auto_created: bool,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub slug: String,
    pub website: Option<String>,
    pub auto_created: bool,
}

impl From<ToolRow> for KnownTool {
    fn from(row: ToolRow) -> Self {
        KnownTool {
            id: row.id.to_string(),
            name: row.name,
        }
    }
}

impl From<CompanyRow> for KnownCompany {
    fn from(row: CompanyRow) -> Self {
        KnownCompany {
            id: row.id.to_string(),
            name: row.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The current ranking ordered by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_current_rankings(pool: &PgPool) -> Result<Vec<ToolRanking>, DbError> {
    let rows = sqlx::query_as::<_, ToolRankingRow>(
        "SELECT r.tool_id, t.name AS tool_name, r.rank, r.score \
         FROM tool_rankings r \
         JOIN tools t ON t.id = r.tool_id \
         ORDER BY r.rank ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| ToolRanking {
            tool_id: row.tool_id.to_string(),
            tool_name: row.tool_name,
            rank: row.rank,
            score: row.score.to_f64().unwrap_or(0.0),
        })
        .collect())
}

/// All tools ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_tools(pool: &PgPool) -> Result<Vec<ToolRow>, DbError> {
    let rows = sqlx::query_as::<_, ToolRow>(
        "SELECT id, name, slug, category, company_id, auto_created, created_at \
         FROM tools ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All companies ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_companies(pool: &PgPool) -> Result<Vec<CompanyRow>, DbError> {
    let rows = sqlx::query_as::<_, CompanyRow>(
        "SELECT id, name, slug, website, auto_created, created_at \
         FROM companies ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts a tool, or returns the existing row with the same slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_tool(pool: &PgPool, tool: &NewTool) -> Result<ToolRow, DbError> {
    let row = sqlx::query_as::<_, ToolRow>(
        "INSERT INTO tools (name, slug, category, company_id, auto_created) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug \
         RETURNING id, name, slug, category, company_id, auto_created, created_at",
    )
    .bind(&tool.name)
    .bind(&tool.slug)
    .bind(&tool.category)
    .bind(tool.company_id)
    .bind(tool.auto_created)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Inserts a company, or returns the existing row with the same slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_company(pool: &PgPool, company: &NewCompany) -> Result<CompanyRow, DbError> {
    let row = sqlx::query_as::<_, CompanyRow>(
        "INSERT INTO companies (name, slug, website, auto_created) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug \
         RETURNING id, name, slug, website, auto_created, created_at",
    )
    .bind(&company.name)
    .bind(&company.slug)
    .bind(&company.website)
    .bind(company.auto_created)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
