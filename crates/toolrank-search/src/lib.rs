//! Article discovery for toolrank.
//!
//! [`SearchProvider`] finds candidate news articles (Tavily preferred, Brave
//! as fallback) and [`ContentFetcher`] retrieves readable text for candidates
//! the provider did not pre-fetch. [`ContentExtractor`] reads text out of
//! uploaded files.

pub mod brave;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod provider;
pub mod queries;
pub mod tavily;

pub use brave::BraveClient;
pub use error::SearchError;
pub use extractor::{guess_mime_type, ContentExtractor, FileExtractor, FileUpload};
pub use fetcher::{html_to_text, HttpContentFetcher, MAX_CONTENT_CHARS};
pub use provider::{ContentFetcher, SearchProvider, SearchQuery, SearchResult};
pub use tavily::TavilyClient;
