//! Capability trait and request/response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// How hard a single `generate` call tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Budget for each individual attempt.
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationMetadata {
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
    /// USD.
    pub estimated_cost: f64,
    pub duration_ms: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub content: String,
    pub metadata: GenerationMetadata,
}

/// A chat-style text generator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] once the retry policy is exhausted or on the first
    /// non-retriable failure.
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
        policy: RetryPolicy,
    ) -> Result<Generation, LlmError>;

    fn model_id(&self) -> &str;
}
