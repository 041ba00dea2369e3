//! Drop discovered articles whose URL is already stored.

use std::sync::Arc;

use toolrank_db::Store;
use toolrank_search::SearchResult;

/// Result of a dedup pass.
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub fresh: Vec<SearchResult>,
    pub duplicates: usize,
}

pub struct DiscoveryDeduplicator {
    store: Arc<dyn Store>,
}

impl DiscoveryDeduplicator {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Keep candidates whose URL is not the `source_url` of a stored article.
    ///
    /// URLs are compared exactly. If the store lookup fails every candidate is
    /// kept.
    pub async fn filter_new(&self, candidates: Vec<SearchResult>) -> DedupOutcome {
        if candidates.is_empty() {
            return DedupOutcome::default();
        }

        let urls: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
        let existing = match self.store.find_existing_source_urls(&urls).await {
            Ok(existing) => existing,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    candidates = candidates.len(),
                    "duplicate lookup failed, keeping all candidates"
                );
                return DedupOutcome {
                    fresh: candidates,
                    duplicates: 0,
                };
            }
        };

        let total = candidates.len();
        let fresh: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|c| !existing.contains(&c.url))
            .collect();
        let duplicates = total - fresh.len();
        tracing::info!(total, duplicates, fresh = fresh.len(), "deduplicated discoveries");

        DedupOutcome { fresh, duplicates }
    }
}
