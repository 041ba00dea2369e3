//! Plain-text article fetcher.
//!
//! Strips scripts, styles, and tags from the page HTML and collapses
//! whitespace. This is intentionally crude; pages that render client-side
//! come back nearly empty and are reported as [`SearchError::EmptyContent`].

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::error::SearchError;
use crate::provider::ContentFetcher;

/// Maximum characters of text returned per page.
pub const MAX_CONTENT_CHARS: usize = 8_000;

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style>").expect("valid regex"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Reduces an HTML document to whitespace-normalized text, capped at
/// [`MAX_CONTENT_CHARS`].
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let without_styles = STYLE_RE.replace_all(&without_scripts, "");
    let without_tags = TAG_RE.replace_all(&without_styles, " ");
    let collapsed = WS_RE.replace_all(&without_tags, " ");
    collapsed.trim().chars().take(MAX_CONTENT_CHARS).collect()
}

pub struct HttpContentFetcher {
    client: Client,
}

impl HttpContentFetcher {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ContentFetcher for HttpContentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SearchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let html = response.text().await?;
        let text = html_to_text(&html);
        if text.is_empty() {
            return Err(SearchError::EmptyContent {
                url: url.to_owned(),
            });
        }
        Ok(text)
    }
}
