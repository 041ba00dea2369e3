use thiserror::Error;
use toolrank_db::DbError;
use toolrank_llm::LlmError;
use toolrank_search::SearchError;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Language-model output did not have the expected shape or ranges.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required capability (search, language model) is not configured.
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// Fetch, search, or language-model failure after retries.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    #[error("article {0} not found")]
    ArticleNotFound(uuid::Uuid),

    #[error("persistence error: {0}")]
    Persistence(#[from] DbError),
}

impl From<LlmError> for IngestError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured(msg) => IngestError::CapabilityUnavailable(msg),
            other => IngestError::TransientIo(other.to_string()),
        }
    }
}

impl From<SearchError> for IngestError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NotConfigured(what) => IngestError::CapabilityUnavailable(what.to_owned()),
            err @ (SearchError::UnsupportedFileType { .. }
            | SearchError::EmptyFile(_)
            | SearchError::InvalidEncoding(_)) => IngestError::Validation(err.to_string()),
            other => IngestError::TransientIo(other.to_string()),
        }
    }
}
