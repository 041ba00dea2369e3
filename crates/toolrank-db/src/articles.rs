//! Database operations for the `articles` table.
//!
//! Every read path hides rows whose `status` is `deleted`. Slug and source-URL
//! lookups used for uniqueness and deduplication see all rows.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use toolrank_core::{ArticleStatus, IngestionType};
use uuid::Uuid;

use crate::DbError;

macro_rules! article_columns {
    () => {
        "id, slug, title, summary, content, content_markdown, ingestion_type, \
         source_url, source_name, file_name, file_type, author, published_date, \
         tags, category, importance_score, sentiment_score, tool_mentions, \
         company_mentions, rankings_snapshot, status, is_processed, processed_at, \
         ingested_by, ingested_at, created_at, updated_at"
    };
}

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `articles` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ArticleRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub content_markdown: Option<String>,
    pub ingestion_type: String,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    /// `1..=10`, enforced by a CHECK constraint.
    pub importance_score: i32,
    /// `NUMERIC(3, 2)` in `[-1, 1]`.
    pub sentiment_score: Option<Decimal>,
    pub tool_mentions: serde_json::Value,
    pub company_mentions: serde_json::Value,
    pub rankings_snapshot: Option<serde_json::Value>,
    pub status: String,
    pub is_processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub ingested_by: String,
    pub ingested_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert parameters for a new article. New articles start `active` and
/// unprocessed.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub slug: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub content_markdown: Option<String>,
    pub ingestion_type: IngestionType,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub file_name: Option<String>,
    pub file_type: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub importance_score: i32,
    pub sentiment_score: Decimal,
    pub tool_mentions: serde_json::Value,
    pub company_mentions: serde_json::Value,
    pub rankings_snapshot: Option<serde_json::Value>,
    pub ingested_by: String,
}

/// Text-only edits. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub category: Option<String>,
}

impl ArticlePatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.category.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ArticleFilter {
    /// Defaults to `active`. `deleted` is never returned.
    pub status: ArticleStatus,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            status: ArticleStatus::Active,
            category: None,
            tag: None,
            limit: 50,
            offset: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Inserts a new article in `active` status and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::DuplicateSlug`] if the slug is taken, or [`DbError::Sqlx`]
/// if the insert otherwise fails.
pub async fn insert_article(pool: &PgPool, article: &NewArticle) -> Result<ArticleRow, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(concat!(
        "INSERT INTO articles (slug, title, summary, content, content_markdown, \
         ingestion_type, source_url, source_name, file_name, file_type, author, \
         published_date, tags, category, importance_score, sentiment_score, \
         tool_mentions, company_mentions, rankings_snapshot, ingested_by, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                 $16, $17, $18, $19, $20, 'active') \
         RETURNING ",
        article_columns!()
    ))
    .bind(&article.slug)
    .bind(&article.title)
    .bind(&article.summary)
    .bind(&article.content)
    .bind(&article.content_markdown)
    .bind(article.ingestion_type.as_str())
    .bind(&article.source_url)
    .bind(&article.source_name)
    .bind(&article.file_name)
    .bind(&article.file_type)
    .bind(&article.author)
    .bind(article.published_date)
    .bind(&article.tags)
    .bind(&article.category)
    .bind(article.importance_score)
    .bind(article.sentiment_score)
    .bind(&article.tool_mentions)
    .bind(&article.company_mentions)
    .bind(&article.rankings_snapshot)
    .bind(&article.ingested_by)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DbError::DuplicateSlug(article.slug.clone())
        }
        _ => DbError::Sqlx(e),
    })?;

    Ok(row)
}

/// Applies a text-only patch to a visible article.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article does not exist or is deleted,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn update_article(
    pool: &PgPool,
    id: Uuid,
    patch: &ArticlePatch,
) -> Result<ArticleRow, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(concat!(
        "UPDATE articles \
         SET title = COALESCE($2, title), \
             summary = COALESCE($3, summary), \
             content = COALESCE($4, content), \
             tags = COALESCE($5, tags), \
             category = COALESCE($6, category), \
             updated_at = NOW() \
         WHERE id = $1 AND status <> 'deleted' \
         RETURNING ",
        article_columns!()
    ))
    .bind(id)
    .bind(&patch.title)
    .bind(&patch.summary)
    .bind(&patch.content)
    .bind(&patch.tags)
    .bind(&patch.category)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Sets `is_processed = true` and stamps `processed_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`].
pub async fn mark_article_processed(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE articles \
         SET is_processed = TRUE, processed_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Soft-deletes an article by moving it to `deleted` status.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the article does not exist or is already
/// deleted, or [`DbError::Sqlx`].
pub async fn soft_delete_article(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE articles \
         SET status = 'deleted', updated_at = NOW() \
         WHERE id = $1 AND status <> 'deleted'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Removes an article row. Ranking changes and processing logs cascade;
/// ranking versions keep a null article reference.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matched, or [`DbError::Sqlx`].
pub async fn hard_delete_article(pool: &PgPool, id: Uuid) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM articles WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Fetches a visible article by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article(pool: &PgPool, id: Uuid) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(concat!(
        "SELECT ",
        article_columns!(),
        " FROM articles WHERE id = $1 AND status <> 'deleted'"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches an article by id whatever its status, including `deleted`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article_any_status(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(concat!(
        "SELECT ",
        article_columns!(),
        " FROM articles WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetches a visible article by slug.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_article_by_slug(pool: &PgPool, slug: &str) -> Result<Option<ArticleRow>, DbError> {
    let row = sqlx::query_as::<_, ArticleRow>(concat!(
        "SELECT ",
        article_columns!(),
        " FROM articles WHERE slug = $1 AND status <> 'deleted'"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Lists articles newest-published first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_articles(
    pool: &PgPool,
    filter: &ArticleFilter,
) -> Result<Vec<ArticleRow>, DbError> {
    let rows = sqlx::query_as::<_, ArticleRow>(concat!(
        "SELECT ",
        article_columns!(),
        " FROM articles \
         WHERE status = $1 AND status <> 'deleted' \
           AND ($2::text IS NULL OR category = $2) \
           AND ($3::text IS NULL OR $3 = ANY(tags)) \
         ORDER BY published_date DESC NULLS LAST, created_at DESC \
         LIMIT $4 OFFSET $5"
    ))
    .bind(filter.status.as_str())
    .bind(&filter.category)
    .bind(&filter.tag)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns `true` if any article, deleted or not, already uses `slug`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM articles WHERE slug = $1)",
    )
    .bind(slug)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Returns the subset of `urls` already stored as an article `source_url`.
/// Matching is exact and case-sensitive.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_existing_source_urls(
    pool: &PgPool,
    urls: &[String],
) -> Result<HashSet<String>, DbError> {
    if urls.is_empty() {
        return Ok(HashSet::new());
    }

    let found = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT source_url FROM articles WHERE source_url = ANY($1)",
    )
    .bind(urls)
    .fetch_all(pool)
    .await?;

    Ok(found.into_iter().collect())
}
