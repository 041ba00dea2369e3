//! Brave web search client.
//!
//! Brave is the fallback discovery provider. Unlike Tavily it never fails the
//! whole search: each query that errors is logged and contributes nothing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Utc, Weekday};
use reqwest::Client;
use serde::Deserialize;

use crate::error::SearchError;
use crate::provider::{dedup_by_url, source_from_url, SearchProvider, SearchQuery, SearchResult};
use crate::queries::{brave_freshness, brave_supplementary, BRAVE_ANALYST_QUERY};

const DEFAULT_BASE_URL: &str = "https://api.search.brave.com/res/v1";
const MAX_COUNT: u32 = 20;

pub struct BraveClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveItem>,
}

#[derive(Deserialize)]
struct BraveItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    page_age: Option<String>,
    #[serde(default)]
    meta_url: Option<BraveMetaUrl>,
}

#[derive(Deserialize)]
struct BraveMetaUrl {
    #[serde(default)]
    hostname: Option<String>,
}

impl From<BraveItem> for SearchResult {
    fn from(item: BraveItem) -> Self {
        let url = item.url.unwrap_or_default();
        let source = item
            .meta_url
            .and_then(|m| m.hostname)
            .map(|h| h.strip_prefix("www.").map_or_else(|| h.clone(), str::to_owned))
            .or_else(|| source_from_url(&url))
            .unwrap_or_else(|| "Unknown".to_owned());
        Self {
            title: item
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_owned()),
            url,
            description: item.description.unwrap_or_default(),
            source,
            published_date: item.page_age,
            content: None,
        }
    }
}

impl BraveClient {
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
            return Err(SearchError::NotConfigured("BRAVE_SEARCH_API_KEY"));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            endpoint: format!("{}/web/search", base_url.trim_end_matches('/')),
        })
    }

    /// Runs the primary query and the supplementary query for `weekday`.
    pub async fn search_for_weekday(
        &self,
        query: &SearchQuery,
        weekday: Weekday,
    ) -> Vec<SearchResult> {
        let freshness = brave_freshness(query.days);
        let count = query.max_results.clamp(1, MAX_COUNT);
        let primary = query.query.as_deref().unwrap_or(BRAVE_ANALYST_QUERY);

        let mut results = Vec::new();
        for q in [primary, brave_supplementary(weekday)] {
            match self.execute(q, freshness, count).await {
                Ok(found) => results.extend(found),
                Err(err) => tracing::error!(
                    query = %q.chars().take(100).collect::<String>(),
                    error = %err,
                    "brave search query failed"
                ),
            }
        }

        let deduplicated = dedup_by_url(results);
        tracing::info!(
            total = deduplicated.len(),
            freshness,
            "brave search completed"
        );
        deduplicated
    }

    async fn execute(
        &self,
        query: &str,
        freshness: &str,
        count: u32,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[
                ("q", query),
                ("freshness", freshness),
                ("count", &count.to_string()),
                ("result_filter", "web"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Api {
                provider: "brave",
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        let parsed: BraveResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
                context: "brave search".to_owned(),
                source: e,
            })?;

        let Some(web) = parsed.web else {
            tracing::warn!("brave response carried no web results");
            return Ok(Vec::new());
        };

        Ok(web
            .results
            .into_iter()
            .map(SearchResult::from)
            .filter(|r| !r.url.is_empty())
            .collect())
    }
}

#[async_trait]
impl SearchProvider for BraveClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError> {
        Ok(self.search_for_weekday(query, Utc::now().weekday()).await)
    }

    fn name(&self) -> &'static str {
        "brave_search"
    }
}
