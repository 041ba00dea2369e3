use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} API error [{status}]: {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no readable text at {url}")]
    EmptyContent { url: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("unsupported file type {mime_type} for {file_name}")]
    UnsupportedFileType { file_name: String, mime_type: String },

    #[error("{0} contains no readable text")]
    EmptyFile(String),

    #[error("{0} is not valid UTF-8")]
    InvalidEncoding(String),
}
