//! Single-article lifecycle: ingest, edit, recalculate, delete, roll back.
//!
//! Every write path opens a processing log first and closes it exactly once,
//! as completed or failed. Ranking effects always go through the
//! [`RankingChangeLedger`], so deleting or recalculating an article only ever
//! touches that article's own ledger rows.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use toolrank_core::{
    slugify, AnalysisResult, ArticleStatus, CompanyMention, IngestionType, ProcessingAction,
    ToolMention,
};
use toolrank_db::{
    ArticleFilter, ArticlePatch, ArticleRow, DbError, LogOutcome, NewArticle, NewCompany,
    NewProcessingLog, NewTool, ProcessingLogRow, Store,
};
use toolrank_search::{ContentExtractor, ContentFetcher, FileExtractor, FileUpload};
use uuid::Uuid;

use crate::analyzer::{AnalysisContext, ContentAnalyzer};
use crate::error::IngestError;
use crate::impact::{
    calculate_changes, identify_new_entities, summarize, ChangeSummary, NewCompanyCandidate,
    NewEntities, NewToolCandidate, PredictedChange,
};
use crate::ledger::{ChangeRecord, RankingChangeLedger};

const DEFAULT_ACTOR: &str = "admin";
const PREVIEW_CHARS: usize = 1000;
const FALLBACK_SLUG: &str = "article";
/// Inserts retried after a concurrent writer took the chosen slug.
const MAX_SLUG_RETRIES: u32 = 5;

/// Where the article body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestKind {
    /// `input` is a URL to fetch, unless content was supplied.
    Url,
    /// `input` is the article body.
    Text,
    /// The body is extracted from an uploaded file; `input` is its name.
    File(FileUpload),
}

impl IngestKind {
    fn ingestion_type(&self) -> IngestionType {
        match self {
            IngestKind::Url => IngestionType::Url,
            IngestKind::Text => IngestionType::Text,
            IngestKind::File(_) => IngestionType::File,
        }
    }

    fn file_type(&self) -> Option<String> {
        match self {
            IngestKind::File(upload) => Some(upload.mime_type.clone()),
            IngestKind::Url | IngestKind::Text => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArticleMetadata {
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
    pub source_name: Option<String>,
    pub file_name: Option<String>,
    pub ingested_by: Option<String>,
    /// Search provider that surfaced the article, for automated runs.
    pub discovery_source: Option<String>,
    pub run_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestInput {
    pub kind: IngestKind,
    pub input: String,
    pub dry_run: bool,
    /// Already-fetched body for a URL input; skips the fetch.
    pub content: Option<String>,
    pub metadata: ArticleMetadata,
}

impl IngestInput {
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            kind: IngestKind::Url,
            input: url.into(),
            dry_run: false,
            content: None,
            metadata: ArticleMetadata::default(),
        }
    }

    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: IngestKind::Text,
            input: body.into(),
            dry_run: false,
            content: None,
            metadata: ArticleMetadata::default(),
        }
    }

    /// Ingest an uploaded file. Its name is recorded as `file_name`.
    #[must_use]
    pub fn file(upload: FileUpload) -> Self {
        let file_name = upload.file_name.clone();
        Self {
            input: file_name.clone(),
            kind: IngestKind::File(upload),
            dry_run: false,
            content: None,
            metadata: ArticleMetadata {
                file_name: Some(file_name),
                ..ArticleMetadata::default()
            },
        }
    }

    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// What the article would look like if stored.
#[derive(Debug, Clone, Serialize)]
pub struct ArticlePreview {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub ingestion_type: IngestionType,
    pub source_url: Option<String>,
    pub source_name: Option<String>,
    pub tags: Vec<String>,
    pub category: Option<String>,
    pub importance_score: i32,
    pub sentiment_score: Decimal,
    pub tool_mentions: Vec<ToolMention>,
    pub company_mentions: Vec<CompanyMention>,
    pub author: Option<String>,
    pub published_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DryRunResult {
    pub article: ArticlePreview,
    pub predicted_changes: Vec<PredictedChange>,
    pub new_tools: Vec<NewToolCandidate>,
    pub new_companies: Vec<NewCompanyCandidate>,
    pub summary: ChangeSummary,
}

#[derive(Debug, Clone)]
pub enum IngestOutcome {
    DryRun(Box<DryRunResult>),
    Ingested {
        article: Box<ArticleRow>,
        ranking_changes: usize,
    },
}

/// Analysis plus everything derived from it against the current catalog.
struct Evaluation {
    analysis: AnalysisResult,
    rankings_snapshot: serde_json::Value,
    changes: Vec<PredictedChange>,
    entities: NewEntities,
}

pub struct ArticleService {
    store: Arc<dyn Store>,
    analyzer: ContentAnalyzer,
    fetcher: Arc<dyn ContentFetcher>,
    extractor: Arc<dyn ContentExtractor>,
    ledger: RankingChangeLedger,
    actor: String,
}

impl ArticleService {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        analyzer: ContentAnalyzer,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            ledger: RankingChangeLedger::new(Arc::clone(&store)),
            store,
            analyzer,
            fetcher,
            extractor: Arc::new(FileExtractor),
            actor: DEFAULT_ACTOR.to_owned(),
        }
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ContentExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Name recorded as `performed_by` and, by default, `ingested_by`.
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    #[must_use]
    pub fn ledger(&self) -> &RankingChangeLedger {
        &self.ledger
    }

    /// Analyze an article and either preview or commit its ranking effect.
    ///
    /// A dry run performs no writes.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::TransientIo`] when the fetch or analysis fails,
    /// [`IngestError::Validation`] for unusable analysis output, empty
    /// content or an unreadable file, and [`IngestError::Persistence`] when a store write fails. A
    /// failure after the article is created marks its processing log failed.
    pub async fn ingest(&self, input: IngestInput) -> Result<IngestOutcome, IngestError> {
        let started = Instant::now();
        let source_url = match input.kind {
            IngestKind::Url => Some(input.input.clone()),
            IngestKind::Text | IngestKind::File(_) => None,
        };
        let content = self.resolve_content(&input).await?;

        let context = AnalysisContext {
            url: source_url.clone(),
            file_name: input.metadata.file_name.clone(),
            author: input.metadata.author.clone(),
        };
        let eval = self.evaluate(&content, &context).await?;

        let published_date = input
            .metadata
            .published_date
            .or_else(|| eval.analysis.published_date.as_deref().and_then(parse_published_date));
        let source_name = input
            .metadata
            .source_name
            .clone()
            .or_else(|| eval.analysis.source.clone());

        if input.dry_run {
            let summary = summarize(&eval.changes, &eval.entities);
            tracing::info!(
                title = %eval.analysis.title,
                predicted = eval.changes.len(),
                new_tools = eval.entities.tools.len(),
                "dry-run analysis complete"
            );
            let article = ArticlePreview {
                title: eval.analysis.title.clone(),
                summary: eval.analysis.summary.clone(),
                content: preview(&content),
                ingestion_type: input.kind.ingestion_type(),
                source_url,
                source_name,
                tags: eval.analysis.tags.clone(),
                category: eval.analysis.category.clone(),
                importance_score: clamp_importance(eval.analysis.importance_score),
                sentiment_score: round_sentiment(eval.analysis.overall_sentiment),
                tool_mentions: eval.analysis.tool_mentions.clone(),
                company_mentions: eval.analysis.company_mentions.clone(),
                author: input.metadata.author.clone(),
                published_date,
            };
            return Ok(IngestOutcome::DryRun(Box::new(DryRunResult {
                article,
                predicted_changes: eval.changes,
                new_tools: eval.entities.tools,
                new_companies: eval.entities.companies,
                summary,
            })));
        }

        let ingested_by = input
            .metadata
            .ingested_by
            .clone()
            .unwrap_or_else(|| self.actor.clone());
        let article = self
            .create_with_unique_slug(NewArticle {
                slug: slugify(&eval.analysis.title),
                title: eval.analysis.title.clone(),
                summary: Some(eval.analysis.summary.clone()),
                content: Some(content),
                content_markdown: None,
                ingestion_type: input.kind.ingestion_type(),
                source_url: source_url.clone(),
                source_name: source_name.clone(),
                file_name: input.metadata.file_name.clone(),
                file_type: input.kind.file_type(),
                author: input.metadata.author.clone().or(source_name),
                published_date: published_date.or_else(|| Some(Utc::now())),
                tags: eval.analysis.tags.clone(),
                category: eval.analysis.category.clone(),
                importance_score: clamp_importance(eval.analysis.importance_score),
                sentiment_score: round_sentiment(eval.analysis.overall_sentiment),
                tool_mentions: to_json(&eval.analysis.tool_mentions)?,
                company_mentions: to_json(&eval.analysis.company_mentions)?,
                rankings_snapshot: Some(eval.rankings_snapshot.clone()),
                ingested_by: ingested_by.clone(),
            })
            .await?;

        let debug_info = serde_json::json!({
            "discovery_source": input.metadata.discovery_source,
            "run_id": input.metadata.run_id,
        });
        let log = self
            .start_log(Some(article.id), ProcessingAction::Ingest, Some(debug_info))
            .await?;

        let result = self
            .apply_evaluation(&article, source_url, &eval, "Article ingestion")
            .await;
        let result = match result {
            Ok(outcome) => self
                .store
                .mark_article_processed(article.id)
                .await
                .map(|()| outcome)
                .map_err(IngestError::from),
            Err(e) => Err(e),
        };
        self.finish_log(&log, started, &result).await;
        let outcome = result?;

        tracing::info!(
            article_id = %article.id,
            slug = %article.slug,
            ingested_by = %ingested_by,
            changes = outcome.rankings_changed,
            "article ingested"
        );
        let stored = self
            .store
            .get_article(article.id)
            .await?
            .unwrap_or(article);
        Ok(IngestOutcome::Ingested {
            article: Box::new(stored),
            ranking_changes: usize::try_from(outcome.rankings_changed).unwrap_or(0),
        })
    }

    /// Edit text fields. Rankings are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ArticleNotFound`] for a missing or deleted
    /// article and [`IngestError::Persistence`] on store failure.
    pub async fn update(&self, id: Uuid, patch: ArticlePatch) -> Result<ArticleRow, IngestError> {
        self.require_article(id).await?;
        let started = Instant::now();
        let log = self.start_log(Some(id), ProcessingAction::Update, None).await?;
        let result = self
            .store
            .update_article(id, &patch)
            .await
            .map_err(IngestError::from);
        let log_result = result.as_ref().map(|_| LogOutcome::default());
        self.finish_log(&log, started, &log_result).await;
        let row = result?;
        tracing::info!(article_id = %id, "article updated");
        Ok(row)
    }

    /// Re-analyze the stored content and replace the article's ledger rows.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ArticleNotFound`] for a missing article,
    /// [`IngestError::Validation`] when it has no stored content, and any
    /// analysis or persistence error.
    pub async fn recalculate(&self, id: Uuid) -> Result<LogOutcome, IngestError> {
        let article = self.require_article(id).await?;
        let content = article
            .content
            .clone()
            .or_else(|| article.content_markdown.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| IngestError::Validation(format!("article {id} has no content")))?;

        let started = Instant::now();
        let log = self
            .start_log(Some(id), ProcessingAction::Recalculate, None)
            .await?;
        let result = async {
            let context = AnalysisContext {
                url: article.source_url.clone(),
                file_name: article.file_name.clone(),
                author: article.author.clone(),
            };
            let eval = self.evaluate(&content, &context).await?;
            let rolled_back = self.ledger.rollback(id).await?;
            tracing::debug!(article_id = %id, rolled_back, "cleared previous changes");
            self.apply_evaluation(&article, article.source_url.clone(), &eval, "Recalculation")
                .await
        }
        .await;
        self.finish_log(&log, started, &result).await;
        let outcome = result?;
        tracing::info!(article_id = %id, changes = outcome.rankings_changed, "article recalculated");
        Ok(outcome)
    }

    /// Roll back the article's ranking effect, then delete it.
    ///
    /// A soft delete keeps the row with status `deleted`; a hard delete
    /// removes it together with its ledger rows and logs. A soft-deleted
    /// article can still be hard-deleted; its changes were already rolled
    /// back, so that reports 0.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ArticleNotFound`] for a missing article, or for
    /// a soft delete of an already deleted one, and
    /// [`IngestError::Persistence`] on store failure.
    pub async fn delete(&self, id: Uuid, hard: bool) -> Result<u64, IngestError> {
        let article = self
            .store
            .get_article_any_status(id)
            .await?
            .ok_or(IngestError::ArticleNotFound(id))?;
        let already_deleted = article.status == ArticleStatus::Deleted.as_str();
        if already_deleted && !hard {
            return Err(IngestError::ArticleNotFound(id));
        }

        let started = Instant::now();
        let log = self.start_log(Some(id), ProcessingAction::Delete, None).await?;

        let rolled_back = if already_deleted {
            0
        } else {
            match self.ledger.rollback(id).await {
                Ok(n) => n,
                Err(e) => {
                    self.finish_log(&log, started, &Err::<LogOutcome, _>(e.to_string()))
                        .await;
                    return Err(e);
                }
            }
        };
        let outcome = LogOutcome {
            rankings_changed: i32::try_from(rolled_back).unwrap_or(i32::MAX),
            ..LogOutcome::default()
        };

        if hard {
            // The log row goes with the article, so close it first.
            self.finish_log(&log, started, &Ok::<_, String>(outcome)).await;
            self.store.hard_delete_article(id).await?;
        } else {
            let result = self
                .store
                .soft_delete_article(id)
                .await
                .map(|()| outcome)
                .map_err(IngestError::from);
            self.finish_log(&log, started, &result.as_ref().copied()).await;
            result?;
        }

        tracing::info!(article_id = %id, hard, rolled_back, "article deleted");
        Ok(rolled_back)
    }

    /// Roll back the article's ranking effect without deleting it.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::ArticleNotFound`] for a missing article and
    /// [`IngestError::Persistence`] on store failure.
    pub async fn rollback(&self, id: Uuid) -> Result<u64, IngestError> {
        self.require_article(id).await?;
        let started = Instant::now();
        let log = self.start_log(Some(id), ProcessingAction::Rollback, None).await?;
        let result = self.ledger.rollback(id).await;
        let log_result = result
            .as_ref()
            .map(|n| LogOutcome {
                rankings_changed: i32::try_from(*n).unwrap_or(i32::MAX),
                ..LogOutcome::default()
            })
            .map_err(ToString::to_string);
        self.finish_log(&log, started, &log_result).await;
        result
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn get(&self, id: Uuid) -> Result<Option<ArticleRow>, IngestError> {
        Ok(self.store.get_article(id).await?)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<ArticleRow>, IngestError> {
        Ok(self.store.get_article_by_slug(slug).await?)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn list(&self, filter: &ArticleFilter) -> Result<Vec<ArticleRow>, IngestError> {
        Ok(self.store.list_articles(filter).await?)
    }

    /// # Errors
    ///
    /// Returns [`IngestError::Persistence`] on store failure.
    pub async fn processing_logs(&self, id: Uuid) -> Result<Vec<ProcessingLogRow>, IngestError> {
        Ok(self.store.processing_logs_for_article(id).await?)
    }

    async fn resolve_content(&self, input: &IngestInput) -> Result<String, IngestError> {
        let content = match (&input.kind, &input.content) {
            (_, Some(body)) => body.clone(),
            (IngestKind::Url, None) => self.fetcher.fetch(&input.input).await?,
            (IngestKind::Text, None) => input.input.clone(),
            (IngestKind::File(upload), None) => self.extractor.extract(upload).await?,
        };
        if content.trim().is_empty() {
            return Err(IngestError::Validation("article content is empty".to_owned()));
        }
        Ok(content)
    }

    async fn evaluate(
        &self,
        content: &str,
        context: &AnalysisContext,
    ) -> Result<Evaluation, IngestError> {
        let analysis = self.analyzer.analyze(content, context).await?;
        let rankings = self.store.current_rankings().await?;
        let known_tools = self.store.known_tools().await?;
        let known_companies = self.store.known_companies().await?;

        let changes = calculate_changes(&analysis, &rankings);
        let entities = identify_new_entities(&analysis, &known_tools, &known_companies);
        Ok(Evaluation {
            rankings_snapshot: to_json(&rankings)?,
            analysis,
            changes,
            entities,
        })
    }

    /// Create missing catalog entries and commit the predicted changes.
    async fn apply_evaluation(
        &self,
        article: &ArticleRow,
        article_url: Option<String>,
        eval: &Evaluation,
        reason_prefix: &str,
    ) -> Result<LogOutcome, IngestError> {
        for company in &eval.entities.companies {
            self.store
                .create_company(&NewCompany {
                    name: company.name.clone(),
                    slug: slugify(&company.name),
                    website: company.website.clone(),
                    auto_created: true,
                })
                .await?;
        }
        for tool in &eval.entities.tools {
            self.store
                .create_tool(&NewTool {
                    name: tool.name.clone(),
                    slug: slugify(&tool.name),
                    category: tool.category.clone(),
                    company_id: tool
                        .company_id
                        .as_deref()
                        .and_then(|id| Uuid::parse_str(id).ok()),
                    auto_created: true,
                })
                .await?;
        }

        let reason = format!("{reason_prefix}: {}", eval.analysis.title);
        let records = eval
            .changes
            .iter()
            .map(|c| ChangeRecord::from_prediction(article.id, article_url.clone(), c, &reason))
            .collect();
        let committed = self.ledger.commit(records).await?;

        Ok(LogOutcome {
            duration_ms: 0,
            tools_affected: count(eval.changes.len()),
            companies_affected: count(eval.entities.companies.len()),
            rankings_changed: count(committed.len()),
        })
    }

    /// Insert under `article.slug`, or the first of `-1`, `-2`, ... that is
    /// unused. A slug taken between the check and the insert moves on to the
    /// next suffix.
    async fn create_with_unique_slug(
        &self,
        mut article: NewArticle,
    ) -> Result<ArticleRow, IngestError> {
        let base = if article.slug.is_empty() {
            FALLBACK_SLUG.to_owned()
        } else {
            std::mem::take(&mut article.slug)
        };
        let mut n = 0u32;
        while self.store.slug_exists(&suffixed(&base, n)).await? {
            n += 1;
        }

        let mut retries = 0;
        loop {
            article.slug = suffixed(&base, n);
            match self.store.create_article(&article).await {
                Err(DbError::DuplicateSlug(taken)) if retries < MAX_SLUG_RETRIES => {
                    tracing::debug!(slug = %taken, "slug taken concurrently, trying next suffix");
                    retries += 1;
                    n += 1;
                }
                result => return Ok(result?),
            }
        }
    }

    async fn require_article(&self, id: Uuid) -> Result<ArticleRow, IngestError> {
        self.store
            .get_article(id)
            .await?
            .ok_or(IngestError::ArticleNotFound(id))
    }

    async fn start_log(
        &self,
        article_id: Option<Uuid>,
        action: ProcessingAction,
        debug_info: Option<serde_json::Value>,
    ) -> Result<ProcessingLogRow, IngestError> {
        Ok(self
            .store
            .start_processing_log(&NewProcessingLog {
                article_id,
                action,
                performed_by: self.actor.clone(),
                debug_info,
            })
            .await?)
    }

    /// Close a processing log. A failure to close is logged, never returned,
    /// so it cannot mask the operation's own result.
    async fn finish_log<E: ToString>(
        &self,
        log: &ProcessingLogRow,
        started: Instant,
        result: &Result<LogOutcome, E>,
    ) {
        let duration_ms = elapsed_ms(started);
        let closed = match result {
            Ok(outcome) => {
                self.store
                    .complete_processing_log(
                        log.id,
                        &LogOutcome {
                            duration_ms,
                            ..*outcome
                        },
                    )
                    .await
            }
            Err(e) => {
                self.store
                    .fail_processing_log(log.id, &e.to_string(), duration_ms)
                    .await
            }
        };
        if let Err(e) = closed {
            tracing::warn!(log_id = %log.id, action = %log.action, error = %e, "failed to close processing log");
        }
    }
}

fn suffixed(base: &str, n: u32) -> String {
    if n == 0 {
        base.to_owned()
    } else {
        format!("{base}-{n}")
    }
}

/// Accepts `YYYY-MM-DD` or RFC 3339.
pub(crate) fn parse_published_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_importance(raw: f64) -> i32 {
    if raw.is_finite() {
        raw.round().clamp(1.0, 10.0) as i32
    } else {
        5
    }
}

fn round_sentiment(raw: f64) -> Decimal {
    let clamped = if raw.is_finite() { raw.clamp(-1.0, 1.0) } else { 0.0 };
    Decimal::from_f64(clamped).unwrap_or_default().round_dp(2)
}

fn preview(content: &str) -> String {
    let mut out: String = content.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, IngestError> {
    serde_json::to_value(value).map_err(|e| IngestError::Validation(e.to_string()))
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn importance_is_rounded_and_clamped() {
        assert_eq!(clamp_importance(0.2), 1);
        assert_eq!(clamp_importance(7.6), 8);
        assert_eq!(clamp_importance(42.0), 10);
        assert_eq!(clamp_importance(f64::NAN), 5);
    }

    #[test]
    fn sentiment_is_rounded_to_two_places() {
        assert_eq!(round_sentiment(0.756).to_string(), "0.76");
        assert_eq!(round_sentiment(-3.0).to_string(), "-1");
    }

    #[test]
    fn published_dates_parse_both_forms() {
        let day = parse_published_date("2026-10-15").unwrap();
        assert_eq!(day.to_rfc3339(), "2026-10-15T00:00:00+00:00");
        assert!(parse_published_date("2026-10-15T08:30:00Z").is_some());
        assert!(parse_published_date("last Tuesday").is_none());
    }

    #[test]
    fn preview_is_capped() {
        let p = preview(&"a".repeat(5000));
        assert_eq!(p.len(), PREVIEW_CHARS + 3);
        assert!(p.ends_with("..."));
    }
}
