//! End-to-end pipeline tests over `MemoryStore` with scripted capabilities.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use toolrank_core::{IngestionType, RunStatus, RunType};
use toolrank_db::{ArticlePatch, MemoryStore, NewArticle, NewIngestionRun, Store};
use toolrank_ingest::{
    ArticleService, ContentAnalyzer, DiscoveryDeduplicator, IngestError, IngestInput,
    IngestOutcome, IngestionOrchestrator, QualityGate, RankingChangeLedger, RunOptions,
    VersionRequest,
};
use toolrank_llm::{
    Generation, GenerationMetadata, GenerationParams, LanguageModel, LlmError, Message,
    RetryPolicy,
};
use toolrank_search::{
    ContentFetcher, FileUpload, SearchError, SearchProvider, SearchQuery, SearchResult,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Scripted capabilities
// ---------------------------------------------------------------------------

const QUALITY_COST: f64 = 0.001;

/// Answers quality prompts by looking for `GOOD` in the title and analysis
/// prompts with a fixed extraction, unless the body contains `BROKEN`.
#[derive(Default)]
struct ScriptedModel {
    analyses: AtomicUsize,
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(
        &self,
        messages: &[Message],
        _params: GenerationParams,
        _policy: RetryPolicy,
    ) -> Result<Generation, LlmError> {
        let prompt = &messages.last().expect("user message").content;
        let (content, cost) = if prompt.starts_with("Evaluate this article") {
            let title_line = prompt.lines().find(|l| l.starts_with("Title:")).unwrap_or("");
            let scores = if title_line.contains("GOOD") {
                (8, 8, 9)
            } else {
                (4, 5, 6)
            };
            let body = serde_json::json!({
                "qualityScore": scores.0,
                "relevanceScore": scores.1,
                "credibilityScore": scores.2,
                "reasoning": "scripted",
                "suggestedCategories": ["news"]
            });
            (body.to_string(), QUALITY_COST)
        } else if prompt.contains("BROKEN") {
            ("I could not analyze this article.".to_owned(), 0.0)
        } else {
            let n = self.analyses.fetch_add(1, Ordering::SeqCst);
            (analysis_json(&format!("Cursor ships agents {n}")), 0.0)
        };
        Ok(Generation {
            content,
            metadata: GenerationMetadata {
                model: "scripted".to_owned(),
                prompt_tokens: 0,
                completion_tokens: 0,
                total_tokens: 0,
                estimated_cost: cost,
                duration_ms: 0,
                attempts: 1,
            },
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// A model that is down for the whole run.
struct DownModel;

#[async_trait]
impl LanguageModel for DownModel {
    async fn generate(
        &self,
        _messages: &[Message],
        _params: GenerationParams,
        _policy: RetryPolicy,
    ) -> Result<Generation, LlmError> {
        Err(LlmError::Timeout { timeout_ms: 30_000 })
    }

    fn model_id(&self) -> &str {
        "down"
    }
}

fn analysis_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "summary": "Cursor launched a background agent.",
        "source": "example.com",
        "published_date": "2026-10-15",
        "category": "Code Assistant",
        "tags": ["agents"],
        "tool_mentions": [
            { "tool": "cursor ai", "context": "mentioned in a roundup", "sentiment": 0.8, "relevance": 0.9 },
            { "tool": "Acme Synthesizer", "context": "a new autonomous rival to devin", "sentiment": 0.3, "relevance": 0.4 }
        ],
        "company_mentions": [
            { "company": "Anysphere", "context": "makes Cursor", "tools": ["Cursor"] }
        ],
        "overall_sentiment": 0.756,
        "importance_score": 8,
        "key_insights": ["agents"]
    })
    .to_string()
}

struct StaticSearch {
    results: Vec<SearchResult>,
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        Ok(self.results.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Serves a body for any URL not in `missing`, recording each request.
#[derive(Default)]
struct ScriptedFetcher {
    missing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ContentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SearchError> {
        self.calls.lock().expect("lock").push(url.to_owned());
        if self.missing.contains(url) {
            return Err(SearchError::UnexpectedStatus {
                status: 404,
                url: url.to_owned(),
            });
        }
        Ok(long_body(url))
    }
}

fn long_body(marker: &str) -> String {
    format!("{marker} ").repeat(40)
}

fn result(url: &str, title: &str, content: Option<String>) -> SearchResult {
    SearchResult {
        title: title.to_owned(),
        url: url.to_owned(),
        description: "desc".to_owned(),
        source: "example.com".to_owned(),
        published_date: Some("2026-10-15".to_owned()),
        content,
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    store: Arc<MemoryStore>,
    fetcher: Arc<ScriptedFetcher>,
    service: Arc<ArticleService>,
}

impl Harness {
    fn new() -> Self {
        Self::with_fetcher(ScriptedFetcher::default())
    }

    fn with_fetcher(fetcher: ScriptedFetcher) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.seed_ranked_tool("Cursor", 4, 0.855);
        store.seed_ranked_tool("GitHub Copilot", 1, 0.95);
        let fetcher = Arc::new(fetcher);
        let llm: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::default());
        let service = Arc::new(ArticleService::new(
            store.clone(),
            ContentAnalyzer::new(llm),
            fetcher.clone(),
        ));
        Self {
            store,
            fetcher,
            service,
        }
    }

    fn orchestrator(&self, results: Option<Vec<SearchResult>>) -> IngestionOrchestrator {
        let llm: Arc<dyn LanguageModel> = Arc::new(ScriptedModel::default());
        self.orchestrator_with_gate(results, QualityGate::new(llm))
    }

    fn orchestrator_with_gate(
        &self,
        results: Option<Vec<SearchResult>>,
        gate: QualityGate,
    ) -> IngestionOrchestrator {
        let orchestrator = IngestionOrchestrator::new(
            self.store.clone(),
            self.fetcher.clone(),
            gate,
            Arc::clone(&self.service),
        );
        match results {
            Some(results) => orchestrator.with_provider(Arc::new(StaticSearch { results })),
            None => orchestrator,
        }
    }

    async fn seed_article(&self, url: &str) -> Uuid {
        self.store
            .create_article(&NewArticle {
                slug: toolrank_core::slugify(url),
                title: url.to_owned(),
                summary: None,
                content: Some("old".to_owned()),
                content_markdown: None,
                ingestion_type: IngestionType::Url,
                source_url: Some(url.to_owned()),
                source_name: None,
                file_name: None,
                file_type: None,
                author: None,
                published_date: None,
                tags: Vec::new(),
                category: None,
                importance_score: 5,
                sentiment_score: Decimal::ZERO,
                tool_mentions: serde_json::json!([]),
                company_mentions: serde_json::json!([]),
                rankings_snapshot: None,
                ingested_by: "seed".to_owned(),
            })
            .await
            .expect("seed article")
            .id
    }

    async fn ingest_text(&self, body: &str) -> Uuid {
        match self.service.ingest(IngestInput::text(body)).await.expect("ingest") {
            IngestOutcome::Ingested { article, .. } => article.id,
            IngestOutcome::DryRun(_) => panic!("expected a stored article"),
        }
    }
}

/// 10 results: 2 already stored, 5 of the remaining 8 pass quality.
fn ten_results() -> Vec<SearchResult> {
    (0..10)
        .map(|i| {
            let title = if (2..7).contains(&i) {
                format!("GOOD story {i}")
            } else {
                format!("meh story {i}")
            };
            result(
                &format!("https://news.example.com/{i}"),
                &title,
                Some(long_body("prefetched")),
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn end_to_end_run_completes() {
    let h = Harness::new();
    h.seed_article("https://news.example.com/0").await;
    h.seed_article("https://news.example.com/1").await;

    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Completed, "errors: {:?}", result.errors);
    assert_eq!(result.articles_discovered, 10);
    assert_eq!(result.articles_skipped, 2);
    assert_eq!(result.articles_passed_quality, 5);
    assert_eq!(result.articles_ingested, 5);
    assert_eq!(result.articles_skipped_semantic, 0);
    assert_eq!(result.ranking_changes, 5, "one ranked tool per article");
    assert_eq!(result.ingested_article_ids.len(), 5);
    // 8 assessments at 0.001 plus 5 ingests at 0.003
    assert_eq!(result.estimated_cost_usd, Decimal::new(230, 4));
    assert!(h.fetcher.calls.lock().unwrap().is_empty(), "prefetched content is used");

    let run_id: Uuid = result.run_id.parse().expect("run id is a uuid");
    let run = h.store.get_ingestion_run(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, "completed");
    assert_eq!(run.articles_ingested, 5);
    assert!(run.completed_at.is_some());
    assert_eq!(h.store.article_count(), 7);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let h = Harness::new();

    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions {
            dry_run: true,
            ..RunOptions::default()
        })
        .await;

    assert!(result.run_id.starts_with("dry-run-"));
    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.articles_ingested, 5, "would-be ingested count");
    assert_eq!(result.ranking_changes, 5, "predicted changes are counted");
    assert!(result.ingested_article_ids.is_empty());
    assert_eq!(h.store.article_count(), 0);
    assert!(h.store.list_ingestion_runs(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_provider_fails() {
    let h = Harness::new();
    let result = h.orchestrator(None).trigger_run(RunOptions::default()).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.errors[0].contains("No search API configured"));
    let runs = h.store.list_ingestion_runs(10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, "failed");
}

#[tokio::test]
async fn overlapping_run_is_refused() {
    let h = Harness::new();
    h.store
        .create_ingestion_run(&NewIngestionRun {
            run_type: RunType::DailyNews,
            search_query: None,
        })
        .await
        .unwrap();

    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert!(result.run_id.is_empty());
    assert_eq!(h.store.list_ingestion_runs(10).await.unwrap().len(), 1);

    // A different run type is not blocked.
    let manual = h
        .orchestrator(Some(Vec::new()))
        .trigger_run(RunOptions {
            run_type: RunType::Manual,
            ..RunOptions::default()
        })
        .await;
    assert_eq!(manual.status, RunStatus::Completed);
}

#[tokio::test]
async fn all_duplicates_complete_with_nothing_ingested() {
    let h = Harness::new();
    h.seed_article("https://news.example.com/a").await;

    let result = h
        .orchestrator(Some(vec![result(
            "https://news.example.com/a",
            "GOOD",
            Some(long_body("x")),
        )]))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.articles_skipped, 1);
    assert_eq!(result.articles_ingested, 0);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn unfetchable_content_completes_with_note() {
    let missing: HashSet<String> = ["https://a.example/1", "https://a.example/2"]
        .into_iter()
        .map(str::to_owned)
        .collect();
    let h = Harness::with_fetcher(ScriptedFetcher {
        missing,
        ..ScriptedFetcher::default()
    });

    let result = h
        .orchestrator(Some(vec![
            result("https://a.example/1", "GOOD 1", Some("too short".to_owned())),
            result("https://a.example/2", "GOOD 2", None),
        ]))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.articles_skipped, 2);
    assert_eq!(
        result.errors,
        ["Could not fetch content for any discovered articles"]
    );
    assert_eq!(h.fetcher.calls.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn per_article_failure_is_partial() {
    let h = Harness::new();
    let results = vec![
        result("https://p.example/ok", "GOOD ok", Some(long_body("fine"))),
        result("https://p.example/bad", "GOOD bad", Some(long_body("BROKEN"))),
    ];

    let result = h
        .orchestrator(Some(results))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::PartiallyFailed);
    assert_eq!(result.articles_ingested, 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Failed to ingest https://p.example/bad"));

    let run_id: Uuid = result.run_id.parse().unwrap();
    let run = h.store.get_ingestion_run(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, "completed", "partial runs persist as completed");
    assert_eq!(run.error_log.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn every_article_failing_is_failed() {
    let h = Harness::new();
    let result = h
        .orchestrator(Some(vec![result(
            "https://p.example/bad",
            "GOOD bad",
            Some(long_body("BROKEN")),
        )]))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.articles_ingested, 0);
}

#[tokio::test]
async fn skip_quality_check_and_max_articles() {
    let h = Harness::new();
    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions {
            skip_quality_check: true,
            max_articles: Some(3),
            ..RunOptions::default()
        })
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.articles_passed_quality, 6, "2 x max_articles prepared");
    assert_eq!(result.articles_ingested, 3);
    assert_eq!(result.estimated_cost_usd, Decimal::new(90, 4));
}

#[tokio::test]
async fn quality_model_outage_is_reported() {
    let h = Harness::new();
    h.seed_article("https://news.example.com/0").await;
    h.seed_article("https://news.example.com/1").await;

    let result = h
        .orchestrator_with_gate(Some(ten_results()), QualityGate::new(Arc::new(DownModel)))
        .trigger_run(RunOptions::default())
        .await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.articles_passed_quality, 0);
    assert_eq!(result.articles_degraded, 8);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Quality assessment unavailable for all 8 articles"));

    let run_id: Uuid = result.run_id.parse().expect("run id is a uuid");
    let run = h.store.get_ingestion_run(run_id).await.unwrap().unwrap();
    assert_eq!(run.status, "failed");
    assert_eq!(run.articles_degraded, 8);
}

#[tokio::test]
async fn zero_max_articles_completes_without_work() {
    let h = Harness::new();
    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions {
            max_articles: Some(0),
            ..RunOptions::default()
        })
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.articles_discovered, 10);
    assert_eq!(result.articles_passed_quality, 0);
    assert_eq!(result.articles_ingested, 0);
}

#[tokio::test]
async fn unbounded_max_articles_does_not_overflow() {
    let h = Harness::new();
    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions {
            max_articles: Some(usize::MAX),
            dry_run: true,
            ..RunOptions::default()
        })
        .await;

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.articles_passed_quality, 5);
    assert_eq!(result.articles_ingested, 5);
}

#[tokio::test]
async fn quality_threshold_override_applies_to_one_run() {
    let h = Harness::new();
    // "meh" stories average 5; relevance 5 still fails the relevance floor.
    let result = h
        .orchestrator(Some(ten_results()))
        .trigger_run(RunOptions {
            quality_threshold: Some(4.0),
            dry_run: true,
            ..RunOptions::default()
        })
        .await;
    assert_eq!(result.articles_passed_quality, 5);
}

// ---------------------------------------------------------------------------
// Dedup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dedup_keeps_only_unknown_urls() {
    let h = Harness::new();
    h.seed_article("https://x.example/A").await;
    h.seed_article("https://x.example/B").await;

    let dedup = DiscoveryDeduplicator::new(h.store.clone());
    let outcome = dedup
        .filter_new(vec![
            result("https://x.example/A", "A", None),
            result("https://x.example/C", "C", None),
        ])
        .await;

    let urls: Vec<_> = outcome.fresh.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, ["https://x.example/C"]);
    assert_eq!(outcome.duplicates, 1);
}

#[tokio::test]
async fn dedup_fails_open() {
    let h = Harness::new();
    h.seed_article("https://x.example/A").await;
    h.store.fail_on("find_existing_source_urls");

    let outcome = DiscoveryDeduplicator::new(h.store.clone())
        .filter_new(vec![result("https://x.example/A", "A", None)])
        .await;
    assert_eq!(outcome.fresh.len(), 1);
    assert_eq!(outcome.duplicates, 0);
}

// ---------------------------------------------------------------------------
// Articles and ledger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ingest_stores_article_changes_and_catalog_entries() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor launched a background agent today.").await;

    let article = h.service.get(id).await.unwrap().unwrap();
    assert_eq!(article.slug, "cursor-ships-agents-0");
    assert_eq!(article.importance_score, 8);
    assert_eq!(article.sentiment_score, Some(Decimal::new(76, 2)));
    assert!(article.is_processed);
    assert!(article.rankings_snapshot.is_some());

    let changes = h.service.ledger().changes_for_article(id).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].tool_name, "Cursor");
    assert_eq!(changes[0].change_type, "increase");
    assert_eq!(changes[0].change_reason, "Article ingestion: Cursor ships agents 0");

    let tools = h.store.known_tools().await.unwrap();
    assert!(tools.iter().any(|t| t.name == "Acme Synthesizer"), "new tool auto-created");
    let companies = h.store.known_companies().await.unwrap();
    assert!(companies.iter().any(|c| c.name == "Anysphere"));

    let logs = h.service.processing_logs(id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "ingest");
    assert_eq!(logs[0].status, "completed");
    assert_eq!(logs[0].rankings_changed, 1);
}

#[tokio::test]
async fn dry_run_ingest_previews_without_writes() {
    let h = Harness::new();
    let outcome = h
        .service
        .ingest(IngestInput::url("https://example.com/post").dry_run(true))
        .await
        .unwrap();

    let IngestOutcome::DryRun(dry) = outcome else {
        panic!("expected a dry-run result");
    };
    assert_eq!(dry.predicted_changes.len(), 1);
    assert_eq!(dry.predicted_changes[0].predicted_rank, 3);
    assert_eq!(dry.new_tools.len(), 1);
    assert_eq!(dry.new_tools[0].category, "autonomous-agent");
    assert_eq!(dry.summary.total_tools_affected, 1);
    assert!(dry.article.content.ends_with("..."));
    assert_eq!(h.store.article_count(), 0);
    assert_eq!(h.fetcher.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn file_ingest_records_name_and_type() {
    let h = Harness::new();
    let upload = FileUpload::new("launch.md", b"# Cursor\n\nships a background agent".to_vec());
    let outcome = h.service.ingest(IngestInput::file(upload)).await.unwrap();

    let IngestOutcome::Ingested { article, .. } = outcome else {
        panic!("expected a stored article");
    };
    assert_eq!(article.ingestion_type, "file");
    assert_eq!(article.file_name.as_deref(), Some("launch.md"));
    assert_eq!(article.file_type.as_deref(), Some("text/markdown"));
    assert_eq!(article.source_url, None);
    assert_eq!(
        article.content.as_deref(),
        Some("# Cursor\n\nships a background agent")
    );
    assert!(h.fetcher.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsupported_file_is_rejected_before_analysis() {
    let h = Harness::new();
    let upload = FileUpload::new("deck.pdf", b"%PDF-1.7".to_vec());
    let err = h.service.ingest(IngestInput::file(upload)).await.unwrap_err();

    assert!(matches!(err, IngestError::Validation(ref m) if m.contains("application/pdf")));
    assert_eq!(h.store.article_count(), 0);
}

#[tokio::test]
async fn colliding_titles_get_numbered_slugs() {
    let h = Harness::new();
    h.store
        .create_article(&NewArticle {
            slug: "cursor-ships-agents-0".to_owned(),
            ..new_article_stub()
        })
        .await
        .unwrap();
    h.store
        .create_article(&NewArticle {
            slug: "cursor-ships-agents-0-1".to_owned(),
            ..new_article_stub()
        })
        .await
        .unwrap();

    let id = h.ingest_text("body").await;
    let article = h.service.get(id).await.unwrap().unwrap();
    assert_eq!(article.slug, "cursor-ships-agents-0-2");
}

#[tokio::test]
async fn slug_taken_after_the_check_moves_to_next_suffix() {
    let h = Harness::new();
    h.store
        .create_article(&NewArticle {
            slug: "cursor-ships-agents-0".to_owned(),
            ..new_article_stub()
        })
        .await
        .unwrap();
    h.store.stale_slug_checks();

    let id = h.ingest_text("body").await;

    let article = h.service.get(id).await.unwrap().unwrap();
    assert_eq!(article.slug, "cursor-ships-agents-0-1");
    assert_eq!(h.store.article_count(), 2);
}

fn new_article_stub() -> NewArticle {
    NewArticle {
        slug: String::new(),
        title: "stub".to_owned(),
        summary: None,
        content: None,
        content_markdown: None,
        ingestion_type: IngestionType::Text,
        source_url: None,
        source_name: None,
        file_name: None,
        file_type: None,
        author: None,
        published_date: None,
        tags: Vec::new(),
        category: None,
        importance_score: 5,
        sentiment_score: Decimal::ZERO,
        tool_mentions: serde_json::json!([]),
        company_mentions: serde_json::json!([]),
        rankings_snapshot: None,
        ingested_by: "seed".to_owned(),
    }
}

#[tokio::test]
async fn rollback_is_idempotent() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;

    assert_eq!(h.service.rollback(id).await.unwrap(), 1);
    assert_eq!(h.service.rollback(id).await.unwrap(), 0);

    let changes = h.service.ledger().changes_for_article(id).await.unwrap();
    assert!(changes.iter().all(|c| c.rolled_back && c.rolled_back_at.is_some()));
    let impact = h.service.ledger().impact(id).await.unwrap();
    assert_eq!(impact.tools_affected, 0);
}

#[tokio::test]
async fn rollback_leaves_other_articles_alone() {
    let h = Harness::new();
    let first = h.ingest_text("one").await;
    let second = h.ingest_text("two").await;

    h.service.rollback(first).await.unwrap();

    let ledger = h.service.ledger();
    let recent = ledger.recent_changes(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].article_id, second);
    assert_eq!(ledger.impact(second).await.unwrap().improved, 1);
}

#[tokio::test]
async fn soft_delete_hides_but_keeps_row() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;

    assert_eq!(h.service.delete(id, false).await.unwrap(), 1);

    assert!(h.service.get(id).await.unwrap().is_none());
    assert!(h
        .service
        .list(&toolrank_db::ArticleFilter::default())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(h.store.article_status(id).as_deref(), Some("deleted"));
    assert_eq!(h.store.article_count(), 1);

    let logs = h.store.processing_logs_for_article(id).await.unwrap();
    assert!(logs.iter().any(|l| l.action == "delete" && l.status == "completed"));

    assert!(matches!(
        h.service.delete(id, false).await,
        Err(IngestError::ArticleNotFound(_))
    ));
}

#[tokio::test]
async fn hard_delete_removes_everything() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;

    h.service.delete(id, true).await.unwrap();

    assert_eq!(h.store.article_count(), 0);
    assert!(h.store.ranking_changes_for_article(id).await.unwrap().is_empty());
    assert!(h.store.processing_logs_for_article(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn soft_deleted_article_can_still_be_hard_deleted() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;
    assert_eq!(h.service.delete(id, false).await.unwrap(), 1);

    assert_eq!(h.service.delete(id, true).await.unwrap(), 0);

    assert_eq!(h.store.article_count(), 0);
    assert!(h.store.ranking_changes_for_article(id).await.unwrap().is_empty());
    assert!(matches!(
        h.service.delete(id, true).await,
        Err(IngestError::ArticleNotFound(_))
    ));
}

#[tokio::test]
async fn recalculate_replaces_changes() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;

    let outcome = h.service.recalculate(id).await.unwrap();
    assert_eq!(outcome.rankings_changed, 1);

    let changes = h.service.ledger().changes_for_article(id).await.unwrap();
    assert_eq!(changes.len(), 2);
    assert!(changes[0].change_reason.starts_with("Recalculation: "));
    assert!(!changes[0].rolled_back);
    assert!(changes[1].rolled_back);

    let logs = h.service.processing_logs(id).await.unwrap();
    assert!(logs.iter().any(|l| l.action == "recalculate" && l.status == "completed"));
}

#[tokio::test]
async fn update_edits_text_only() {
    let h = Harness::new();
    let id = h.ingest_text("Cursor news").await;

    let row = h
        .service
        .update(
            id,
            ArticlePatch {
                title: Some("Edited".to_owned()),
                tags: Some(vec!["edited".to_owned()]),
                ..ArticlePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(row.title, "Edited");
    assert_eq!(row.tags, ["edited"]);
    assert_eq!(
        h.service.ledger().changes_for_article(id).await.unwrap().len(),
        1
    );

    assert!(matches!(
        h.service.update(Uuid::new_v4(), ArticlePatch::default()).await,
        Err(IngestError::ArticleNotFound(_))
    ));
}

#[tokio::test]
async fn failed_commit_marks_log_failed() {
    let h = Harness::new();
    h.store.fail_on("insert_ranking_changes");

    let err = h
        .service
        .ingest(IngestInput::text("Cursor news"))
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Persistence(_)));

    let article = h
        .service
        .list(&toolrank_db::ArticleFilter::default())
        .await
        .unwrap()
        .pop()
        .expect("article row was created before the failure");
    let logs = h.service.processing_logs(article.id).await.unwrap();
    assert_eq!(logs[0].status, "failed");
    assert!(logs[0].error_message.is_some());
}

#[tokio::test]
async fn versions_chain_and_increment() {
    let h = Harness::new();
    let ledger = RankingChangeLedger::new(h.store.clone());

    let first = ledger.create_version(VersionRequest::default()).await.unwrap();
    let second = ledger
        .create_version(VersionRequest {
            changes_summary: Some("weekly".to_owned()),
            ..VersionRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(first.version, "1.0.0");
    assert_eq!(second.version, "1.0.1");
    assert_eq!(second.previous_version_id, Some(first.id));
    assert_eq!(
        second.rankings_snapshot.as_array().map(Vec::len),
        Some(2),
        "both seeded tools are in the snapshot"
    );
    assert_eq!(ledger.latest_version().await.unwrap().unwrap().id, second.id);
    assert_eq!(ledger.list_versions(10).await.unwrap().len(), 2);
}
