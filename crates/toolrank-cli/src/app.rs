//! Composition root: every component is built once here and shared by `Arc`.

use std::sync::Arc;

use async_trait::async_trait;
use toolrank_core::AppConfig;
use toolrank_db::{PgStore, Store};
use toolrank_ingest::{
    ArticleService, ContentAnalyzer, IngestionOrchestrator, QualityGate, RankingChangeLedger,
};
use toolrank_llm::{
    Generation, GenerationParams, LanguageModel, LlmError, Message, OpenRouterClient, RetryPolicy,
};
use toolrank_search::{
    BraveClient, ContentFetcher, HttpContentFetcher, SearchProvider, TavilyClient,
};

pub(crate) struct App {
    pub config: Arc<AppConfig>,
    pub pool: sqlx::PgPool,
    pub store: Arc<dyn Store>,
    pub articles: Arc<ArticleService>,
    pub orchestrator: Arc<IngestionOrchestrator>,
}

impl App {
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn build(config: AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let store: Arc<dyn Store> = Arc::new(PgStore::new(pool.clone()));
        let llm = language_model(&config)?;
        let policy = RetryPolicy {
            max_attempts: config.llm_max_attempts,
            timeout_ms: config.llm_timeout_ms,
        };
        let fetcher: Arc<dyn ContentFetcher> = Arc::new(HttpContentFetcher::new(
            config.fetch_timeout_secs,
            &config.user_agent,
        )?);

        let analyzer = ContentAnalyzer::new(Arc::clone(&llm)).with_retry_policy(policy);
        let articles = Arc::new(ArticleService::new(
            Arc::clone(&store),
            analyzer,
            Arc::clone(&fetcher),
        ));

        let quality = QualityGate::new(llm)
            .with_min_average(config.quality_min_average)
            .with_retry_policy(policy);
        let mut orchestrator = IngestionOrchestrator::new(
            Arc::clone(&store),
            fetcher,
            quality,
            Arc::clone(&articles),
        )
        .with_search(config.search_query.clone(), config.search_days)
        .with_default_max_articles(config.max_articles);
        for provider in search_providers(&config)? {
            orchestrator = orchestrator.with_provider(provider);
        }

        Ok(Self {
            config,
            pool,
            store,
            articles,
            orchestrator: Arc::new(orchestrator),
        })
    }

    pub fn ledger(&self) -> &RankingChangeLedger {
        self.articles.ledger()
    }
}

fn language_model(config: &AppConfig) -> anyhow::Result<Arc<dyn LanguageModel>> {
    match config.openrouter_api_key.as_deref() {
        Some(key) => Ok(Arc::new(OpenRouterClient::new(key, &config.llm_model)?)),
        None => {
            tracing::debug!("OPENROUTER_API_KEY is not set; analysis commands will fail");
            Ok(Arc::new(UnconfiguredModel))
        }
    }
}

/// Tavily first, then Brave. The orchestrator uses the first entry.
fn search_providers(config: &AppConfig) -> anyhow::Result<Vec<Arc<dyn SearchProvider>>> {
    let mut providers: Vec<Arc<dyn SearchProvider>> = Vec::new();
    if let Some(key) = config.tavily_api_key.as_deref() {
        providers.push(Arc::new(TavilyClient::new(key, config.fetch_timeout_secs)?));
    }
    if let Some(key) = config.brave_search_api_key.as_deref() {
        providers.push(Arc::new(BraveClient::new(key, config.fetch_timeout_secs)?));
    }
    Ok(providers)
}

/// Stands in for the model when no key is configured, so commands that never
/// call it (list, delete, rollback) still run.
pub(crate) struct UnconfiguredModel;

#[async_trait]
impl LanguageModel for UnconfiguredModel {
    async fn generate(
        &self,
        _messages: &[Message],
        _params: GenerationParams,
        _policy: RetryPolicy,
    ) -> Result<Generation, LlmError> {
        Err(LlmError::NotConfigured(
            "OPENROUTER_API_KEY is not set".to_owned(),
        ))
    }

    fn model_id(&self) -> &str {
        "unconfigured"
    }
}
