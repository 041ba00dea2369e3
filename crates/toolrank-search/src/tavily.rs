//! Tavily news search client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc, Weekday};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::provider::{dedup_by_url, source_from_url, SearchProvider, SearchQuery, SearchResult};
use crate::queries::{tavily_supplementary, TAVILY_PRIMARY_QUERY};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";
const SUPPLEMENTARY_MAX_RESULTS: u32 = 10;
const DESCRIPTION_CHARS: usize = 500;

pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    search_depth: &'static str,
    max_results: u32,
    include_answer: bool,
    include_raw_content: bool,
    topic: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    days: Option<u32>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyItem>,
}

#[derive(Deserialize)]
struct TavilyItem {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    published_date: Option<String>,
}

impl From<TavilyItem> for SearchResult {
    fn from(item: TavilyItem) -> Self {
        let description = item
            .content
            .as_deref()
            .map(|c| c.chars().take(DESCRIPTION_CHARS).collect())
            .unwrap_or_default();
        Self {
            title: item
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_owned()),
            source: source_from_url(&item.url).unwrap_or_else(|| "unknown".to_owned()),
            url: item.url,
            description,
            published_date: item.published_date,
            content: item.content,
        }
    }
}

impl TavilyClient {
    /// # Errors
    ///
    /// Returns [`SearchError::NotConfigured`] for a blank key, or
    /// [`SearchError::Http`] if the client cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotConfigured`] for a blank key, or
    /// [`SearchError::Http`] if the client cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, SearchError> {
        if api_key.trim().is_empty() {
            return Err(SearchError::NotConfigured("TAVILY_API_KEY"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
        })
    }

    /// Runs the primary query followed by the two supplementary queries for
    /// `weekday`, then drops repeated URLs.
    ///
    /// # Errors
    ///
    /// Returns the first [`SearchError`] from any of the three requests.
    pub async fn search_for_weekday(
        &self,
        query: &SearchQuery,
        weekday: Weekday,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let primary = query.query.as_deref().unwrap_or(TAVILY_PRIMARY_QUERY);
        let mut results = self
            .execute(primary, "advanced", query.max_results, query.days)
            .await?;

        for supplementary in tavily_supplementary(weekday) {
            let extra = self
                .execute(supplementary, "basic", SUPPLEMENTARY_MAX_RESULTS, query.days)
                .await?;
            results.extend(extra);
        }

        let total = results.len();
        let deduplicated = dedup_by_url(results);
        tracing::info!(
            total,
            deduplicated = deduplicated.len(),
            "tavily search completed"
        );
        Ok(deduplicated)
    }

    async fn execute(
        &self,
        query: &str,
        search_depth: &'static str,
        max_results: u32,
        days: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let request = TavilyRequest {
            api_key: &self.api_key,
            query,
            search_depth,
            max_results,
            include_answer: false,
            include_raw_content: false,
            topic: "news",
            days: (days > 0).then_some(days),
        };

        tracing::debug!(
            query = %query.chars().take(100).collect::<String>(),
            search_depth,
            max_results,
            "executing tavily search"
        );

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(SearchError::Api {
                provider: "tavily",
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: TavilyResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
                context: "tavily search".to_owned(),
                source: e,
            })?;

        Ok(parsed.results.into_iter().map(SearchResult::from).collect())
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        self.search_for_weekday(query, Utc::now().weekday()).await
    }

    fn name(&self) -> &'static str {
        "tavily"
    }
}
