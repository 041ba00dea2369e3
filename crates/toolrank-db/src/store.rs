//! The [`Store`] trait and its Postgres implementation.
//!
//! | Group | Methods |
//! |-------|---------|
//! | Articles | `create_article`, `get_article`, `get_article_any_status`, `get_article_by_slug`, `list_articles`, `slug_exists`, `update_article`, `mark_article_processed`, `soft_delete_article`, `hard_delete_article`, `find_existing_source_urls` |
//! | Ledger | `insert_ranking_changes`, `rollback_ranking_changes`, `ranking_changes_for_article`, `recent_ranking_changes` |
//! | Processing logs | `start_processing_log`, `complete_processing_log`, `fail_processing_log`, `processing_logs_for_article` |
//! | Catalog | `current_rankings`, `known_tools`, `known_companies`, `create_tool`, `create_company` |
//! | Versions | `create_ranking_version`, `latest_ranking_version`, `list_ranking_versions` |
//! | Runs | `create_ingestion_run`, `update_ingestion_run`, `get_ingestion_run`, `list_ingestion_runs`, `find_running_ingestion_run` |

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use toolrank_core::{KnownCompany, KnownTool, RunType, ToolRanking};
use uuid::Uuid;

use crate::{
    articles, catalog, ingestion_runs, processing_logs, ranking_changes, ranking_versions,
    ArticleFilter, ArticlePatch, ArticleRow, DbError, IngestionRunRow, IngestionRunUpdate,
    LogOutcome, NewArticle, NewCompany, NewIngestionRun, NewProcessingLog, NewRankingChange,
    NewRankingVersion, NewTool, ProcessingLogRow, RankingChangeRow, RankingVersionRow,
};

/// Persistence seam for the ingestion pipeline.
///
/// `insert_ranking_changes` must be atomic: either the whole batch is stored
/// or none of it is.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRow, DbError>;
    async fn get_article(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError>;
    /// Like `get_article`, but also returns soft-deleted rows.
    async fn get_article_any_status(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError>;
    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRow>, DbError>;
    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<ArticleRow>, DbError>;
    async fn slug_exists(&self, slug: &str) -> Result<bool, DbError>;
    async fn update_article(&self, id: Uuid, patch: &ArticlePatch)
        -> Result<ArticleRow, DbError>;
    async fn mark_article_processed(&self, id: Uuid) -> Result<(), DbError>;
    async fn soft_delete_article(&self, id: Uuid) -> Result<(), DbError>;
    async fn hard_delete_article(&self, id: Uuid) -> Result<(), DbError>;
    async fn find_existing_source_urls(&self, urls: &[String])
        -> Result<HashSet<String>, DbError>;

    async fn insert_ranking_changes(
        &self,
        changes: &[NewRankingChange],
    ) -> Result<Vec<RankingChangeRow>, DbError>;
    async fn rollback_ranking_changes(&self, article_id: Uuid) -> Result<u64, DbError>;
    async fn ranking_changes_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<RankingChangeRow>, DbError>;
    async fn recent_ranking_changes(&self, limit: i64) -> Result<Vec<RankingChangeRow>, DbError>;

    async fn start_processing_log(
        &self,
        log: &NewProcessingLog,
    ) -> Result<ProcessingLogRow, DbError>;
    async fn complete_processing_log(&self, id: Uuid, outcome: &LogOutcome)
        -> Result<(), DbError>;
    async fn fail_processing_log(
        &self,
        id: Uuid,
        error_message: &str,
        duration_ms: i64,
    ) -> Result<(), DbError>;
    async fn processing_logs_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<ProcessingLogRow>, DbError>;

    async fn current_rankings(&self) -> Result<Vec<ToolRanking>, DbError>;
    async fn known_tools(&self) -> Result<Vec<KnownTool>, DbError>;
    async fn known_companies(&self) -> Result<Vec<KnownCompany>, DbError>;
    async fn create_tool(&self, tool: &NewTool) -> Result<KnownTool, DbError>;
    async fn create_company(&self, company: &NewCompany) -> Result<KnownCompany, DbError>;

    async fn create_ranking_version(
        &self,
        version: &NewRankingVersion,
    ) -> Result<RankingVersionRow, DbError>;
    async fn latest_ranking_version(&self) -> Result<Option<RankingVersionRow>, DbError>;
    async fn list_ranking_versions(&self, limit: i64)
        -> Result<Vec<RankingVersionRow>, DbError>;

    async fn create_ingestion_run(
        &self,
        run: &NewIngestionRun,
    ) -> Result<IngestionRunRow, DbError>;
    async fn update_ingestion_run(
        &self,
        id: Uuid,
        update: &IngestionRunUpdate,
    ) -> Result<(), DbError>;
    async fn get_ingestion_run(&self, id: Uuid) -> Result<Option<IngestionRunRow>, DbError>;
    async fn list_ingestion_runs(&self, limit: i64) -> Result<Vec<IngestionRunRow>, DbError>;
    async fn find_running_ingestion_run(
        &self,
        run_type: RunType,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestionRunRow>, DbError>;
}

/// [`Store`] backed by a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRow, DbError> {
        articles::insert_article(&self.pool, article).await
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError> {
        articles::get_article(&self.pool, id).await
    }

    async fn get_article_any_status(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError> {
        articles::get_article_any_status(&self.pool, id).await
    }

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRow>, DbError> {
        articles::get_article_by_slug(&self.pool, slug).await
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<ArticleRow>, DbError> {
        articles::list_articles(&self.pool, filter).await
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, DbError> {
        articles::slug_exists(&self.pool, slug).await
    }

    async fn update_article(
        &self,
        id: Uuid,
        patch: &ArticlePatch,
    ) -> Result<ArticleRow, DbError> {
        articles::update_article(&self.pool, id, patch).await
    }

    async fn mark_article_processed(&self, id: Uuid) -> Result<(), DbError> {
        articles::mark_article_processed(&self.pool, id).await
    }

    async fn soft_delete_article(&self, id: Uuid) -> Result<(), DbError> {
        articles::soft_delete_article(&self.pool, id).await
    }

    async fn hard_delete_article(&self, id: Uuid) -> Result<(), DbError> {
        articles::hard_delete_article(&self.pool, id).await
    }

    async fn find_existing_source_urls(
        &self,
        urls: &[String],
    ) -> Result<HashSet<String>, DbError> {
        articles::find_existing_source_urls(&self.pool, urls).await
    }

    async fn insert_ranking_changes(
        &self,
        changes: &[NewRankingChange],
    ) -> Result<Vec<RankingChangeRow>, DbError> {
        ranking_changes::insert_ranking_changes(&self.pool, changes).await
    }

    async fn rollback_ranking_changes(&self, article_id: Uuid) -> Result<u64, DbError> {
        ranking_changes::rollback_ranking_changes(&self.pool, article_id).await
    }

    async fn ranking_changes_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<RankingChangeRow>, DbError> {
        ranking_changes::list_ranking_changes_for_article(&self.pool, article_id).await
    }

    async fn recent_ranking_changes(&self, limit: i64) -> Result<Vec<RankingChangeRow>, DbError> {
        ranking_changes::list_recent_ranking_changes(&self.pool, limit).await
    }

    async fn start_processing_log(
        &self,
        log: &NewProcessingLog,
    ) -> Result<ProcessingLogRow, DbError> {
        processing_logs::start_processing_log(&self.pool, log).await
    }

    async fn complete_processing_log(
        &self,
        id: Uuid,
        outcome: &LogOutcome,
    ) -> Result<(), DbError> {
        processing_logs::complete_processing_log(&self.pool, id, outcome).await
    }

    async fn fail_processing_log(
        &self,
        id: Uuid,
        error_message: &str,
        duration_ms: i64,
    ) -> Result<(), DbError> {
        processing_logs::fail_processing_log(&self.pool, id, error_message, duration_ms).await
    }

    async fn processing_logs_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<ProcessingLogRow>, DbError> {
        processing_logs::list_processing_logs(&self.pool, article_id).await
    }

    async fn current_rankings(&self) -> Result<Vec<ToolRanking>, DbError> {
        catalog::list_current_rankings(&self.pool).await
    }

    async fn known_tools(&self) -> Result<Vec<KnownTool>, DbError> {
        let rows = catalog::list_tools(&self.pool).await?;
        Ok(rows.into_iter().map(KnownTool::from).collect())
    }

    async fn known_companies(&self) -> Result<Vec<KnownCompany>, DbError> {
        let rows = catalog::list_companies(&self.pool).await?;
        Ok(rows.into_iter().map(KnownCompany::from).collect())
    }

    async fn create_tool(&self, tool: &NewTool) -> Result<KnownTool, DbError> {
        catalog::upsert_tool(&self.pool, tool)
            .await
            .map(KnownTool::from)
    }

    async fn create_company(&self, company: &NewCompany) -> Result<KnownCompany, DbError> {
        catalog::upsert_company(&self.pool, company)
            .await
            .map(KnownCompany::from)
    }

    async fn create_ranking_version(
        &self,
        version: &NewRankingVersion,
    ) -> Result<RankingVersionRow, DbError> {
        ranking_versions::insert_ranking_version(&self.pool, version).await
    }

    async fn latest_ranking_version(&self) -> Result<Option<RankingVersionRow>, DbError> {
        ranking_versions::latest_ranking_version(&self.pool).await
    }

    async fn list_ranking_versions(
        &self,
        limit: i64,
    ) -> Result<Vec<RankingVersionRow>, DbError> {
        ranking_versions::list_ranking_versions(&self.pool, limit).await
    }

    async fn create_ingestion_run(
        &self,
        run: &NewIngestionRun,
    ) -> Result<IngestionRunRow, DbError> {
        ingestion_runs::create_ingestion_run(&self.pool, run).await
    }

    async fn update_ingestion_run(
        &self,
        id: Uuid,
        update: &IngestionRunUpdate,
    ) -> Result<(), DbError> {
        ingestion_runs::update_ingestion_run(&self.pool, id, update).await
    }

    async fn get_ingestion_run(&self, id: Uuid) -> Result<Option<IngestionRunRow>, DbError> {
        ingestion_runs::get_ingestion_run(&self.pool, id).await
    }

    async fn list_ingestion_runs(&self, limit: i64) -> Result<Vec<IngestionRunRow>, DbError> {
        ingestion_runs::list_ingestion_runs(&self.pool, limit).await
    }

    async fn find_running_ingestion_run(
        &self,
        run_type: RunType,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestionRunRow>, DbError> {
        ingestion_runs::find_running_ingestion_run(&self.pool, run_type, since).await
    }
}
