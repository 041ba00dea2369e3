use thiserror::Error;

/// Errors returned by language-model clients.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    /// A single attempt exceeded its time budget.
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The response body did not match the expected envelope.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response envelope parsed but carried no message content.
    #[error("response contained no content")]
    EmptyContent,

    /// No API key was configured for the provider.
    #[error("language model is not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    /// Returns `true` for errors worth retrying after a back-off delay:
    /// timeouts, connection failures, HTTP 429 and 5xx.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            LlmError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Timeout { .. } => true,
            LlmError::Deserialize { .. } | LlmError::EmptyContent | LlmError::NotConfigured(_) => {
                false
            }
        }
    }
}
