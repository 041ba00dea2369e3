//! Automated discovery run: search → dedup → content → quality → ingest.
//!
//! [`IngestionOrchestrator::trigger_run`] never fails. Every problem ends up
//! in the returned [`IngestionResult`]'s error list and status, and (outside
//! dry runs) in the persisted run record, which is refreshed after each stage.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use toolrank_core::{RunStatus, RunType};
use toolrank_db::{IngestionRunUpdate, NewIngestionRun, Store};
use toolrank_search::{ContentFetcher, SearchProvider, SearchQuery, SearchResult};
use uuid::Uuid;

use crate::articles::{ArticleMetadata, ArticleService, IngestInput, IngestKind, IngestOutcome};
use crate::dedup::DiscoveryDeduplicator;
use crate::error::IngestError;
use crate::quality::{ArticleToAssess, AssessmentOutcome, QualityGate};

pub const DEFAULT_MAX_ARTICLES: usize = 20;
const DISCOVERY_MAX_RESULTS: u32 = 20;
/// Provider-supplied content longer than this is used without fetching.
const MIN_PREFETCHED_CHARS: usize = 100;
const ANALYSIS_COST_PER_ARTICLE_USD: f64 = 0.003;
const AUTOMATED_ACTOR: &str = "automated-ingestion";
const NO_PROVIDER_MESSAGE: &str =
    "No search API configured (Tavily or Brave) - cannot discover articles";
const NO_CONTENT_MESSAGE: &str = "Could not fetch content for any discovered articles";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub max_articles: Option<usize>,
    /// Overrides the quality gate's minimum average for this run only.
    pub quality_threshold: Option<f64>,
    pub skip_quality_check: bool,
    pub run_type: RunType,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_articles: None,
            quality_threshold: None,
            skip_quality_check: false,
            run_type: RunType::DailyNews,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestionResult {
    /// Run record id, `dry-run-<millis>` for dry runs, or empty when no
    /// record could be created.
    pub run_id: String,
    pub status: RunStatus,
    pub articles_discovered: usize,
    pub articles_passed_quality: usize,
    pub articles_ingested: usize,
    pub articles_skipped: usize,
    pub articles_skipped_semantic: usize,
    /// Assessments that fell back to the reject default because the model
    /// call or its parse failed.
    pub articles_degraded: usize,
    pub ranking_changes: usize,
    pub estimated_cost_usd: Decimal,
    pub errors: Vec<String>,
    pub ingested_article_ids: Vec<Uuid>,
    pub duration_ms: u64,
}

/// Counters accumulated while a run progresses.
#[derive(Debug, Default)]
struct RunReport {
    discovered: usize,
    passed_quality: usize,
    ingested: usize,
    skipped: usize,
    degraded: usize,
    ranking_changes: usize,
    cost_usd: f64,
    errors: Vec<String>,
    ingested_ids: Vec<Uuid>,
}

impl RunReport {
    /// Status for a run that went through every stage.
    fn final_status(&self) -> RunStatus {
        match (self.errors.is_empty(), self.ingested > 0) {
            (true, _) => RunStatus::Completed,
            (false, true) => RunStatus::PartiallyFailed,
            (false, false) => RunStatus::Failed,
        }
    }

    fn cost(&self) -> Decimal {
        Decimal::from_f64(self.cost_usd)
            .unwrap_or_default()
            .round_dp(4)
    }

    fn to_update(&self, status: RunStatus) -> IngestionRunUpdate {
        IngestionRunUpdate {
            status,
            articles_discovered: to_i32(self.discovered),
            articles_passed_quality: to_i32(self.passed_quality),
            articles_ingested: to_i32(self.ingested),
            articles_skipped: to_i32(self.skipped),
            articles_degraded: to_i32(self.degraded),
            ranking_changes: to_i32(self.ranking_changes),
            estimated_cost_usd: self.cost(),
            errors: self.errors.clone(),
            ingested_article_ids: self.ingested_ids.clone(),
        }
    }
}

/// How the stage sequence ended.
enum Flow {
    /// Every stage ran; status follows the error and ingest counts.
    Finished,
    /// Stopped early with a fixed status.
    Stopped(RunStatus),
}

/// A discovered article with its body ready for assessment.
struct Prepared {
    result: SearchResult,
    content: String,
}

pub struct IngestionOrchestrator {
    store: Arc<dyn Store>,
    providers: Vec<Arc<dyn SearchProvider>>,
    fetcher: Arc<dyn ContentFetcher>,
    quality: QualityGate,
    articles: Arc<ArticleService>,
    dedup: DiscoveryDeduplicator,
    search_query: Option<String>,
    search_days: u32,
    default_max_articles: usize,
}

impl IngestionOrchestrator {
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        fetcher: Arc<dyn ContentFetcher>,
        quality: QualityGate,
        articles: Arc<ArticleService>,
    ) -> Self {
        Self {
            dedup: DiscoveryDeduplicator::new(Arc::clone(&store)),
            store,
            providers: Vec::new(),
            fetcher,
            quality,
            articles,
            search_query: None,
            search_days: 1,
            default_max_articles: DEFAULT_MAX_ARTICLES,
        }
    }

    /// Add a search provider. The first one added is used.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    #[must_use]
    pub fn with_search(mut self, query: Option<String>, days: u32) -> Self {
        self.search_query = query;
        self.search_days = days;
        self
    }

    #[must_use]
    pub fn with_default_max_articles(mut self, max: usize) -> Self {
        self.default_max_articles = max;
        self
    }

    /// Run the discovery pipeline once.
    pub async fn trigger_run(&self, options: RunOptions) -> IngestionResult {
        let started = Instant::now();
        let max_articles = options.max_articles.unwrap_or(self.default_max_articles);
        tracing::info!(
            dry_run = options.dry_run,
            max_articles,
            run_type = %options.run_type,
            "starting ingestion run"
        );

        let mut report = RunReport::default();

        let record_id = if options.dry_run {
            None
        } else {
            if let Some(message) = self.overlapping_run(options.run_type).await {
                tracing::warn!(run_type = %options.run_type, "{message}");
                report.errors.push(message);
                return finish(String::new(), RunStatus::Failed, report, started);
            }
            match self
                .store
                .create_ingestion_run(&NewIngestionRun {
                    run_type: options.run_type,
                    search_query: self.search_query.clone(),
                })
                .await
            {
                Ok(row) => Some(row.id),
                Err(e) => {
                    tracing::error!(error = %e, "failed to create ingestion run record");
                    report.errors.push(format!("Pipeline error: {e}"));
                    return finish(String::new(), RunStatus::Failed, report, started);
                }
            }
        };
        let run_id = record_id.map_or_else(
            || format!("dry-run-{}", Utc::now().timestamp_millis()),
            |id| id.to_string(),
        );

        let status = match self
            .execute(&options, max_articles, record_id, &run_id, &mut report)
            .await
        {
            Ok(Flow::Finished) => report.final_status(),
            Ok(Flow::Stopped(status)) => status,
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "ingestion pipeline error");
                report.errors.push(format!("Pipeline error: {e}"));
                RunStatus::Failed
            }
        };

        if let Some(id) = record_id {
            if let Err(e) = self
                .store
                .update_ingestion_run(id, &report.to_update(status))
                .await
            {
                tracing::error!(run_id = %id, error = %e, "failed to finalize ingestion run");
            }
        }

        let result = finish(run_id, status, report, started);
        tracing::info!(
            run_id = %result.run_id,
            status = %result.status,
            discovered = result.articles_discovered,
            ingested = result.articles_ingested,
            skipped = result.articles_skipped,
            errors = result.errors.len(),
            duration_ms = result.duration_ms,
            "ingestion run finished"
        );
        result
    }

    async fn execute(
        &self,
        options: &RunOptions,
        max_articles: usize,
        record_id: Option<Uuid>,
        run_id: &str,
        report: &mut RunReport,
    ) -> Result<Flow, IngestError> {
        let Some(provider) = self.providers.first() else {
            tracing::error!("{NO_PROVIDER_MESSAGE}");
            report.errors.push(NO_PROVIDER_MESSAGE.to_owned());
            return Ok(Flow::Stopped(RunStatus::Failed));
        };

        // Discovering
        let query = SearchQuery {
            query: self.search_query.clone(),
            days: self.search_days,
            max_results: DISCOVERY_MAX_RESULTS,
        };
        let discovered = provider.search(&query).await?;
        report.discovered = discovered.len();
        tracing::info!(provider = provider.name(), count = report.discovered, "discovered articles");
        self.checkpoint(record_id, report).await;
        if discovered.is_empty() {
            return Ok(Flow::Stopped(RunStatus::Completed));
        }

        // Deduplicating
        let dedup = self.dedup.filter_new(discovered).await;
        report.skipped = dedup.duplicates;
        self.checkpoint(record_id, report).await;
        if dedup.fresh.is_empty() {
            tracing::info!("all discovered articles are duplicates");
            return Ok(Flow::Stopped(RunStatus::Completed));
        }

        if max_articles == 0 {
            tracing::info!("max_articles is 0; nothing to ingest");
            return Ok(Flow::Stopped(RunStatus::Completed));
        }

        let fresh_count = dedup.fresh.len();
        let prepared = self
            .prepare_content(dedup.fresh, max_articles.saturating_mul(2))
            .await;
        if prepared.is_empty() {
            tracing::warn!("could not fetch content for any discovered article");
            report.skipped += fresh_count;
            report.errors.push(NO_CONTENT_MESSAGE.to_owned());
            return Ok(Flow::Stopped(RunStatus::Completed));
        }

        // AssessingQuality
        let passing = if options.skip_quality_check {
            tracing::info!("skipping quality assessment");
            prepared
        } else {
            self.assess(prepared, options.quality_threshold, report).await
        };
        report.passed_quality = passing.len();
        self.checkpoint(record_id, report).await;

        // Ingesting
        let to_ingest: Vec<Prepared> = passing.into_iter().take(max_articles).collect();
        let attempted = to_ingest.len();
        for article in to_ingest {
            let url = article.result.url.clone();
            match self
                .articles
                .ingest(self.ingest_input(article, options.dry_run, provider.name(), run_id))
                .await
            {
                Ok(IngestOutcome::DryRun(dry)) => {
                    report.ranking_changes += dry.predicted_changes.len();
                }
                Ok(IngestOutcome::Ingested {
                    article,
                    ranking_changes,
                }) => {
                    report.ingested_ids.push(article.id);
                    report.ingested += 1;
                    report.ranking_changes += ranking_changes;
                }
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "failed to ingest article");
                    report.errors.push(format!("Failed to ingest {url}: {e}"));
                    continue;
                }
            }
            report.cost_usd += ANALYSIS_COST_PER_ARTICLE_USD;
            self.checkpoint(record_id, report).await;
        }
        if options.dry_run {
            report.ingested = attempted;
        }

        Ok(Flow::Finished)
    }

    /// Bodies for up to `limit` candidates. Candidates with no usable body
    /// are dropped.
    async fn prepare_content(&self, candidates: Vec<SearchResult>, limit: usize) -> Vec<Prepared> {
        let mut prepared = Vec::new();
        for mut result in candidates.into_iter().take(limit) {
            let prefetched = result
                .content
                .take()
                .filter(|c| c.chars().count() > MIN_PREFETCHED_CHARS);
            let content = match prefetched {
                Some(content) => content,
                None => match self.fetcher.fetch(&result.url).await {
                    Ok(content) => content,
                    Err(e) => {
                        tracing::warn!(url = %result.url, error = %e, "failed to fetch article content");
                        continue;
                    }
                },
            };
            prepared.push(Prepared { result, content });
        }
        tracing::info!(count = prepared.len(), "prepared article content");
        prepared
    }

    async fn assess(
        &self,
        prepared: Vec<Prepared>,
        threshold: Option<f64>,
        report: &mut RunReport,
    ) -> Vec<Prepared> {
        let to_assess: Vec<ArticleToAssess> = prepared
            .iter()
            .map(|p| ArticleToAssess {
                title: p.result.title.clone(),
                content: p.content.clone(),
                source: p.result.source.clone(),
                url: Some(p.result.url.clone()),
                published_at: p
                    .result
                    .published_date
                    .as_deref()
                    .and_then(crate::articles::parse_published_date),
            })
            .collect();
        let min_average = threshold.unwrap_or_else(|| self.quality.min_average());
        let outcomes = self.quality.batch_assess_with(&to_assess, min_average).await;

        report.cost_usd += outcomes
            .iter()
            .map(|o| o.assessment().estimated_cost)
            .sum::<f64>();

        let degraded: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| match o {
                AssessmentOutcome::Degraded { reason, .. } => Some(reason.as_str()),
                AssessmentOutcome::Ok(_) => None,
            })
            .collect();
        report.degraded = degraded.len();
        if let Some(first) = degraded.first() {
            tracing::warn!(
                degraded = degraded.len(),
                assessed = outcomes.len(),
                reason = %first,
                "quality assessment fell back to rejection"
            );
            // No article got a real verdict.
            if degraded.len() == outcomes.len() {
                report.errors.push(format!(
                    "Quality assessment unavailable for all {} articles: {first}",
                    outcomes.len()
                ));
            }
        }
        prepared
            .into_iter()
            .zip(outcomes)
            .filter(|(_, outcome)| outcome.should_ingest())
            .map(|(p, _)| p)
            .collect()
    }

    fn ingest_input(
        &self,
        article: Prepared,
        dry_run: bool,
        provider: &str,
        run_id: &str,
    ) -> IngestInput {
        IngestInput {
            kind: IngestKind::Url,
            input: article.result.url,
            dry_run,
            content: Some(article.content),
            metadata: ArticleMetadata {
                published_date: article
                    .result
                    .published_date
                    .as_deref()
                    .and_then(crate::articles::parse_published_date),
                source_name: Some(article.result.source),
                ingested_by: Some(AUTOMATED_ACTOR.to_owned()),
                discovery_source: Some(provider.to_owned()),
                run_id: Some(run_id.to_owned()),
                ..ArticleMetadata::default()
            },
        }
    }

    /// Describe a same-type run still marked `running` that started today
    /// (UTC), if any. A failed lookup does not block the run.
    async fn overlapping_run(&self, run_type: RunType) -> Option<String> {
        let today = Utc::now().date_naive().and_hms_opt(0, 0, 0)?.and_utc();
        match self.store.find_running_ingestion_run(run_type, today).await {
            Ok(Some(run)) => Some(format!(
                "A {run_type} run ({}) has been running since {}",
                run.id, run.started_at
            )),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not check for overlapping runs");
                None
            }
        }
    }

    async fn checkpoint(&self, record_id: Option<Uuid>, report: &RunReport) {
        let Some(id) = record_id else { return };
        if let Err(e) = self
            .store
            .update_ingestion_run(id, &report.to_update(RunStatus::Running))
            .await
        {
            tracing::warn!(run_id = %id, error = %e, "failed to record run progress");
        }
    }
}

fn finish(run_id: String, status: RunStatus, report: RunReport, started: Instant) -> IngestionResult {
    IngestionResult {
        run_id,
        status,
        articles_discovered: report.discovered,
        articles_passed_quality: report.passed_quality,
        articles_ingested: report.ingested,
        articles_skipped: report.skipped,
        articles_skipped_semantic: 0,
        articles_degraded: report.degraded,
        ranking_changes: report.ranking_changes,
        estimated_cost_usd: report.cost(),
        errors: report.errors,
        ingested_article_ids: report.ingested_ids,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}
