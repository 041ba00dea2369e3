//! Capability traits for article discovery and content retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A news search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Overrides the provider's built-in primary query when set.
    pub query: Option<String>,
    /// Look-back window in days.
    pub days: u32,
    pub max_results: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: None,
            days: 1,
            max_results: 20,
        }
    }
}

/// A discovered article candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    /// Publisher host name without a leading `www.`.
    pub source: String,
    pub published_date: Option<String>,
    /// Body text the provider already extracted, if any.
    pub content: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run the provider's news search, deduplicated by URL.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] when the provider cannot be reached or answers
    /// with an error.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, SearchError>;

    /// Short provider name recorded with ingested articles.
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its readable text.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on network failure, a non-success status, or
    /// a page with no readable text.
    async fn fetch(&self, url: &str) -> Result<String, SearchError>;
}

/// Keeps the first occurrence of each URL, preserving order.
pub(crate) fn dedup_by_url(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = std::collections::HashSet::new();
    results
        .into_iter()
        .filter(|r| seen.insert(r.url.clone()))
        .collect()
}

/// Host name of `url` with a leading `www.` removed.
pub(crate) fn source_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> SearchResult {
        SearchResult {
            title: "t".to_owned(),
            url: url.to_owned(),
            description: String::new(),
            source: String::new(),
            published_date: None,
            content: None,
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let out = dedup_by_url(vec![
            result("https://a.com/1"),
            result("https://b.com/2"),
            result("https://a.com/1"),
        ]);
        let urls: Vec<_> = out.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["https://a.com/1", "https://b.com/2"]);
    }

    #[test]
    fn source_strips_www() {
        assert_eq!(
            source_from_url("https://www.theverge.com/ai/123").as_deref(),
            Some("theverge.com")
        );
        assert_eq!(
            source_from_url("https://techcrunch.com/x").as_deref(),
            Some("techcrunch.com")
        );
    }

    #[test]
    fn source_of_garbage_is_none() {
        assert_eq!(source_from_url("not a url"), None);
    }
}
