//! Shared domain types and configuration for toolrank.
//!
//! Everything here is free of I/O: lifecycle enums with their persisted
//! string forms, the structured article analysis produced by the language
//! model, ranking reference data, and the environment-driven [`AppConfig`].

pub mod analysis;
pub mod app_config;
pub mod config;
pub mod rankings;
pub mod status;

use thiserror::Error;

pub use analysis::{AnalysisResult, CompanyMention, RankingImpacts, ToolMention};
pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use rankings::{KnownCompany, KnownTool, ToolRanking};
pub use status::{
    ArticleStatus, ChangeType, IngestionType, ProcessingAction, ProcessingStatus, RunStatus,
    RunType,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Error returned when a persisted string does not name a known enum variant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Generate a URL-safe slug: lowercase, runs of non-alphanumerics collapsed to
/// a single `-`, leading and trailing dashes removed.
#[must_use]
pub fn slugify(input: &str) -> String {
    input
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
