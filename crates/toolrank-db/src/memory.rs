//! In-process [`Store`] implementation.
//!
//! Holds every table in a single `RwLock`, so each trait call is atomic.
//! Insertion order stands in for `created_at` when sorting newest first.
//! Test double only, compiled with the `test-util` feature.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use toolrank_core::{
    slugify, ArticleStatus, KnownCompany, KnownTool, ProcessingStatus, RunStatus, RunType,
    ToolRanking,
};
use uuid::Uuid;

use crate::{
    ArticleFilter, ArticlePatch, ArticleRow, DbError, IngestionRunRow, IngestionRunUpdate,
    LogOutcome, NewArticle, NewCompany, NewIngestionRun, NewProcessingLog, NewRankingChange,
    NewRankingVersion, NewTool, ProcessingLogRow, RankingChangeRow, RankingVersionRow, Store,
};

struct StoredTool {
    id: Uuid,
    name: String,
    slug: String,
}

struct StoredCompany {
    id: Uuid,
    name: String,
    slug: String,
}

struct StoredRanking {
    tool_id: Uuid,
    rank: i32,
    score: f64,
}

#[derive(Default)]
struct MemoryState {
    articles: Vec<ArticleRow>,
    changes: Vec<RankingChangeRow>,
    logs: Vec<ProcessingLogRow>,
    tools: Vec<StoredTool>,
    companies: Vec<StoredCompany>,
    rankings: Vec<StoredRanking>,
    versions: Vec<RankingVersionRow>,
    runs: Vec<IngestionRunRow>,
    failing: HashSet<&'static str>,
    stale_slug_checks: bool,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool to the catalog and places it in the current ranking.
    pub fn seed_ranked_tool(&self, name: &str, rank: i32, score: f64) -> KnownTool {
        let mut state = self.write();
        let id = Uuid::new_v4();
        state.tools.push(StoredTool {
            id,
            name: name.to_string(),
            slug: slugify(name),
        });
        state.rankings.push(StoredRanking {
            tool_id: id,
            rank,
            score,
        });
        KnownTool {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    pub fn seed_company(&self, name: &str) -> KnownCompany {
        let mut state = self.write();
        let id = Uuid::new_v4();
        state.companies.push(StoredCompany {
            id,
            name: name.to_string(),
            slug: slugify(name),
        });
        KnownCompany {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Makes `slug_exists` report every slug as free, the way a concurrent
    /// writer sees it before the other insert commits.
    pub fn stale_slug_checks(&self) {
        self.write().stale_slug_checks = true;
    }

    /// Makes every later call to the named [`Store`] method fail as if the
    /// database were unreachable.
    pub fn fail_on(&self, method: &'static str) {
        self.write().failing.insert(method);
    }

    /// Number of article rows in any status.
    #[must_use]
    pub fn article_count(&self) -> usize {
        self.read().articles.len()
    }

    /// Status of an article, including deleted ones.
    #[must_use]
    pub fn article_status(&self, id: Uuid) -> Option<String> {
        self.read()
            .articles
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.status.clone())
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn check(&self, method: &'static str) -> Result<(), DbError> {
        if self.read().failing.contains(method) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn visible(article: &ArticleRow) -> bool {
    article.status != ArticleStatus::Deleted.as_str()
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_article(&self, article: &NewArticle) -> Result<ArticleRow, DbError> {
        self.check("create_article")?;
        let mut state = self.write();
        if state.articles.iter().any(|a| a.slug == article.slug) {
            return Err(DbError::DuplicateSlug(article.slug.clone()));
        }
        let now = Utc::now();
        let row = ArticleRow {
            id: Uuid::new_v4(),
            slug: article.slug.clone(),
            title: article.title.clone(),
            summary: article.summary.clone(),
            content: article.content.clone(),
            content_markdown: article.content_markdown.clone(),
            ingestion_type: article.ingestion_type.as_str().to_string(),
            source_url: article.source_url.clone(),
            source_name: article.source_name.clone(),
            file_name: article.file_name.clone(),
            file_type: article.file_type.clone(),
            author: article.author.clone(),
            published_date: article.published_date,
            tags: article.tags.clone(),
            category: article.category.clone(),
            importance_score: article.importance_score,
            sentiment_score: Some(article.sentiment_score),
            tool_mentions: article.tool_mentions.clone(),
            company_mentions: article.company_mentions.clone(),
            rankings_snapshot: article.rankings_snapshot.clone(),
            status: ArticleStatus::Active.as_str().to_string(),
            is_processed: false,
            processed_at: None,
            ingested_by: article.ingested_by.clone(),
            ingested_at: now,
            created_at: now,
            updated_at: now,
        };
        state.articles.push(row.clone());
        Ok(row)
    }

    async fn get_article(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError> {
        self.check("get_article")?;
        Ok(self
            .read()
            .articles
            .iter()
            .find(|a| a.id == id && visible(a))
            .cloned())
    }

    async fn get_article_any_status(&self, id: Uuid) -> Result<Option<ArticleRow>, DbError> {
        self.check("get_article_any_status")?;
        Ok(self.read().articles.iter().find(|a| a.id == id).cloned())
    }

    async fn get_article_by_slug(&self, slug: &str) -> Result<Option<ArticleRow>, DbError> {
        self.check("get_article_by_slug")?;
        Ok(self
            .read()
            .articles
            .iter()
            .find(|a| a.slug == slug && visible(a))
            .cloned())
    }

    async fn list_articles(&self, filter: &ArticleFilter) -> Result<Vec<ArticleRow>, DbError> {
        self.check("list_articles")?;
        let state = self.read();
        let mut rows: Vec<ArticleRow> = state
            .articles
            .iter()
            .rev()
            .filter(|a| visible(a) && a.status == filter.status.as_str())
            .filter(|a| {
                filter
                    .category
                    .as_ref()
                    .is_none_or(|c| a.category.as_ref() == Some(c))
            })
            .filter(|a| filter.tag.as_ref().is_none_or(|t| a.tags.contains(t)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.published_date.cmp(&a.published_date));
        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, DbError> {
        self.check("slug_exists")?;
        let state = self.read();
        Ok(!state.stale_slug_checks && state.articles.iter().any(|a| a.slug == slug))
    }

    async fn update_article(
        &self,
        id: Uuid,
        patch: &ArticlePatch,
    ) -> Result<ArticleRow, DbError> {
        self.check("update_article")?;
        let mut state = self.write();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == id && visible(a))
            .ok_or(DbError::NotFound)?;
        if let Some(title) = &patch.title {
            article.title.clone_from(title);
        }
        if let Some(summary) = &patch.summary {
            article.summary = Some(summary.clone());
        }
        if let Some(content) = &patch.content {
            article.content = Some(content.clone());
        }
        if let Some(tags) = &patch.tags {
            article.tags.clone_from(tags);
        }
        if let Some(category) = &patch.category {
            article.category = Some(category.clone());
        }
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn mark_article_processed(&self, id: Uuid) -> Result<(), DbError> {
        self.check("mark_article_processed")?;
        let mut state = self.write();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(DbError::NotFound)?;
        let now = Utc::now();
        article.is_processed = true;
        article.processed_at = Some(now);
        article.updated_at = now;
        Ok(())
    }

    async fn soft_delete_article(&self, id: Uuid) -> Result<(), DbError> {
        self.check("soft_delete_article")?;
        let mut state = self.write();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == id && visible(a))
            .ok_or(DbError::NotFound)?;
        ArticleStatus::Deleted
            .as_str()
            .clone_into(&mut article.status);
        article.updated_at = Utc::now();
        Ok(())
    }

    async fn hard_delete_article(&self, id: Uuid) -> Result<(), DbError> {
        self.check("hard_delete_article")?;
        let mut state = self.write();
        let before = state.articles.len();
        state.articles.retain(|a| a.id != id);
        if state.articles.len() == before {
            return Err(DbError::NotFound);
        }
        state.changes.retain(|c| c.article_id != id);
        state.logs.retain(|l| l.article_id != Some(id));
        for version in &mut state.versions {
            if version.article_id == Some(id) {
                version.article_id = None;
            }
        }
        Ok(())
    }

    async fn find_existing_source_urls(
        &self,
        urls: &[String],
    ) -> Result<HashSet<String>, DbError> {
        self.check("find_existing_source_urls")?;
        let state = self.read();
        Ok(urls
            .iter()
            .filter(|url| {
                state
                    .articles
                    .iter()
                    .any(|a| a.source_url.as_deref() == Some(url.as_str()))
            })
            .cloned()
            .collect())
    }

    async fn insert_ranking_changes(
        &self,
        changes: &[NewRankingChange],
    ) -> Result<Vec<RankingChangeRow>, DbError> {
        self.check("insert_ranking_changes")?;
        let mut state = self.write();
        // Validate the whole batch before touching state so a bad entry stores nothing.
        for change in changes {
            if !state.articles.iter().any(|a| a.id == change.article_id) {
                return Err(DbError::InvalidValue(format!(
                    "ranking change references unknown article {}",
                    change.article_id
                )));
            }
        }
        let now = Utc::now();
        let rows: Vec<RankingChangeRow> = changes
            .iter()
            .map(|change| RankingChangeRow {
                id: Uuid::new_v4(),
                article_id: change.article_id,
                tool_id: change.tool_id.clone(),
                tool_name: change.tool_name.clone(),
                article_url: change.article_url.clone(),
                metric_changes: change.metric_changes.clone(),
                old_rank: change.old_rank,
                new_rank: change.new_rank,
                rank_change: change.rank_change,
                old_score: change.old_score,
                new_score: change.new_score,
                score_change: change.score_change,
                change_type: change.change_type.as_str().to_string(),
                change_reason: change.change_reason.clone(),
                is_applied: change.is_applied,
                applied_at: change.is_applied.then_some(now),
                rolled_back: false,
                rolled_back_at: None,
                created_at: now,
            })
            .collect();
        state.changes.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn rollback_ranking_changes(&self, article_id: Uuid) -> Result<u64, DbError> {
        self.check("rollback_ranking_changes")?;
        let mut state = self.write();
        let now = Utc::now();
        let mut affected = 0u64;
        for change in state
            .changes
            .iter_mut()
            .filter(|c| c.article_id == article_id && c.is_applied && !c.rolled_back)
        {
            change.is_applied = false;
            change.rolled_back = true;
            change.rolled_back_at = Some(now);
            affected += 1;
        }
        Ok(affected)
    }

    async fn ranking_changes_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<RankingChangeRow>, DbError> {
        self.check("ranking_changes_for_article")?;
        Ok(self
            .read()
            .changes
            .iter()
            .rev()
            .filter(|c| c.article_id == article_id)
            .cloned()
            .collect())
    }

    async fn recent_ranking_changes(&self, limit: i64) -> Result<Vec<RankingChangeRow>, DbError> {
        self.check("recent_ranking_changes")?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .read()
            .changes
            .iter()
            .rev()
            .filter(|c| c.is_applied)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn start_processing_log(
        &self,
        log: &NewProcessingLog,
    ) -> Result<ProcessingLogRow, DbError> {
        self.check("start_processing_log")?;
        let now = Utc::now();
        let row = ProcessingLogRow {
            id: Uuid::new_v4(),
            article_id: log.article_id,
            action: log.action.as_str().to_string(),
            status: ProcessingStatus::Started.as_str().to_string(),
            started_at: now,
            completed_at: None,
            duration_ms: None,
            tools_affected: 0,
            companies_affected: 0,
            rankings_changed: 0,
            error_message: None,
            debug_info: log.debug_info.clone(),
            performed_by: log.performed_by.clone(),
            created_at: now,
        };
        self.write().logs.push(row.clone());
        Ok(row)
    }

    async fn complete_processing_log(
        &self,
        id: Uuid,
        outcome: &LogOutcome,
    ) -> Result<(), DbError> {
        self.check("complete_processing_log")?;
        let mut state = self.write();
        let log = state
            .logs
            .iter_mut()
            .find(|l| l.id == id && l.status == ProcessingStatus::Started.as_str())
            .ok_or(DbError::InvalidTransition {
                entity: "processing log",
                id,
                expected_status: "started",
            })?;
        ProcessingStatus::Completed
            .as_str()
            .clone_into(&mut log.status);
        log.completed_at = Some(Utc::now());
        log.duration_ms = Some(outcome.duration_ms);
        log.tools_affected = outcome.tools_affected;
        log.companies_affected = outcome.companies_affected;
        log.rankings_changed = outcome.rankings_changed;
        Ok(())
    }

    async fn fail_processing_log(
        &self,
        id: Uuid,
        error_message: &str,
        duration_ms: i64,
    ) -> Result<(), DbError> {
        self.check("fail_processing_log")?;
        let mut state = self.write();
        let log = state
            .logs
            .iter_mut()
            .find(|l| l.id == id && l.status == ProcessingStatus::Started.as_str())
            .ok_or(DbError::InvalidTransition {
                entity: "processing log",
                id,
                expected_status: "started",
            })?;
        ProcessingStatus::Failed.as_str().clone_into(&mut log.status);
        log.completed_at = Some(Utc::now());
        log.duration_ms = Some(duration_ms);
        log.error_message = Some(error_message.to_string());
        Ok(())
    }

    async fn processing_logs_for_article(
        &self,
        article_id: Uuid,
    ) -> Result<Vec<ProcessingLogRow>, DbError> {
        self.check("processing_logs_for_article")?;
        Ok(self
            .read()
            .logs
            .iter()
            .rev()
            .filter(|l| l.article_id == Some(article_id))
            .cloned()
            .collect())
    }

    async fn current_rankings(&self) -> Result<Vec<ToolRanking>, DbError> {
        self.check("current_rankings")?;
        let state = self.read();
        let mut rankings: Vec<ToolRanking> = state
            .rankings
            .iter()
            .filter_map(|r| {
                state.tools.iter().find(|t| t.id == r.tool_id).map(|t| ToolRanking {
                    tool_id: t.id.to_string(),
                    tool_name: t.name.clone(),
                    rank: r.rank,
                    score: r.score,
                })
            })
            .collect();
        rankings.sort_by_key(|r| r.rank);
        Ok(rankings)
    }

    async fn known_tools(&self) -> Result<Vec<KnownTool>, DbError> {
        self.check("known_tools")?;
        Ok(self
            .read()
            .tools
            .iter()
            .map(|t| KnownTool {
                id: t.id.to_string(),
                name: t.name.clone(),
            })
            .collect())
    }

    async fn known_companies(&self) -> Result<Vec<KnownCompany>, DbError> {
        self.check("known_companies")?;
        Ok(self
            .read()
            .companies
            .iter()
            .map(|c| KnownCompany {
                id: c.id.to_string(),
                name: c.name.clone(),
            })
            .collect())
    }

    async fn create_tool(&self, tool: &NewTool) -> Result<KnownTool, DbError> {
        self.check("create_tool")?;
        let mut state = self.write();
        if let Some(existing) = state.tools.iter().find(|t| t.slug == tool.slug) {
            return Ok(KnownTool {
                id: existing.id.to_string(),
                name: existing.name.clone(),
            });
        }
        let id = Uuid::new_v4();
        state.tools.push(StoredTool {
            id,
            name: tool.name.clone(),
            slug: tool.slug.clone(),
        });
        Ok(KnownTool {
            id: id.to_string(),
            name: tool.name.clone(),
        })
    }

    async fn create_company(&self, company: &NewCompany) -> Result<KnownCompany, DbError> {
        self.check("create_company")?;
        let mut state = self.write();
        if let Some(existing) = state.companies.iter().find(|c| c.slug == company.slug) {
            return Ok(KnownCompany {
                id: existing.id.to_string(),
                name: existing.name.clone(),
            });
        }
        let id = Uuid::new_v4();
        state.companies.push(StoredCompany {
            id,
            name: company.name.clone(),
            slug: company.slug.clone(),
        });
        Ok(KnownCompany {
            id: id.to_string(),
            name: company.name.clone(),
        })
    }

    async fn create_ranking_version(
        &self,
        version: &NewRankingVersion,
    ) -> Result<RankingVersionRow, DbError> {
        self.check("create_ranking_version")?;
        let mut state = self.write();
        if state.versions.iter().any(|v| v.version == version.version) {
            return Err(DbError::InvalidValue(format!(
                "duplicate version '{}'",
                version.version
            )));
        }
        let row = RankingVersionRow {
            id: Uuid::new_v4(),
            version: version.version.clone(),
            article_id: version.article_id,
            rankings_snapshot: version.rankings_snapshot.clone(),
            changes_summary: version.changes_summary.clone(),
            news_items_count: version.news_items_count,
            tools_affected: version.tools_affected,
            previous_version_id: version.previous_version_id,
            created_by: version.created_by.clone(),
            is_rollback: version.is_rollback,
            rolled_back_from_id: version.rolled_back_from_id,
            created_at: Utc::now(),
        };
        state.versions.push(row.clone());
        Ok(row)
    }

    async fn latest_ranking_version(&self) -> Result<Option<RankingVersionRow>, DbError> {
        self.check("latest_ranking_version")?;
        Ok(self.read().versions.last().cloned())
    }

    async fn list_ranking_versions(
        &self,
        limit: i64,
    ) -> Result<Vec<RankingVersionRow>, DbError> {
        self.check("list_ranking_versions")?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .read()
            .versions
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_ingestion_run(
        &self,
        run: &NewIngestionRun,
    ) -> Result<IngestionRunRow, DbError> {
        self.check("create_ingestion_run")?;
        let now = Utc::now();
        let row = IngestionRunRow {
            id: Uuid::new_v4(),
            run_type: run.run_type.as_str().to_string(),
            status: RunStatus::Running.as_str().to_string(),
            articles_discovered: 0,
            articles_passed_quality: 0,
            articles_ingested: 0,
            articles_skipped: 0,
            articles_skipped_semantic: 0,
            articles_degraded: 0,
            ranking_changes: 0,
            estimated_cost_usd: Decimal::ZERO,
            search_query: run.search_query.clone(),
            error_log: serde_json::json!([]),
            ingested_article_ids: serde_json::json!([]),
            started_at: now,
            completed_at: None,
            created_at: now,
        };
        self.write().runs.push(row.clone());
        Ok(row)
    }

    async fn update_ingestion_run(
        &self,
        id: Uuid,
        update: &IngestionRunUpdate,
    ) -> Result<(), DbError> {
        self.check("update_ingestion_run")?;
        let mut state = self.write();
        let run = state
            .runs
            .iter_mut()
            .find(|r| r.id == id && r.status == RunStatus::Running.as_str())
            .ok_or(DbError::InvalidTransition {
                entity: "ingestion run",
                id,
                expected_status: "running",
            })?;
        let status = update.status.persisted();
        status.as_str().clone_into(&mut run.status);
        run.articles_discovered = update.articles_discovered;
        run.articles_passed_quality = update.articles_passed_quality;
        run.articles_ingested = update.articles_ingested;
        run.articles_skipped = update.articles_skipped;
        run.articles_degraded = update.articles_degraded;
        run.ranking_changes = update.ranking_changes;
        run.estimated_cost_usd = update.estimated_cost_usd;
        run.error_log = update.error_log_json();
        run.ingested_article_ids = update.article_ids_json();
        run.completed_at = (status != RunStatus::Running).then(Utc::now);
        Ok(())
    }

    async fn get_ingestion_run(&self, id: Uuid) -> Result<Option<IngestionRunRow>, DbError> {
        self.check("get_ingestion_run")?;
        Ok(self.read().runs.iter().find(|r| r.id == id).cloned())
    }

    async fn list_ingestion_runs(&self, limit: i64) -> Result<Vec<IngestionRunRow>, DbError> {
        self.check("list_ingestion_runs")?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .read()
            .runs
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_running_ingestion_run(
        &self,
        run_type: RunType,
        since: DateTime<Utc>,
    ) -> Result<Option<IngestionRunRow>, DbError> {
        self.check("find_running_ingestion_run")?;
        Ok(self
            .read()
            .runs
            .iter()
            .rev()
            .find(|r| {
                r.run_type == run_type.as_str()
                    && r.status == RunStatus::Running.as_str()
                    && r.started_at >= since
            })
            .cloned())
    }
}
