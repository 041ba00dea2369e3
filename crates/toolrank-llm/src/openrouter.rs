//! HTTP client for the OpenRouter chat-completions API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::model::{
    Generation, GenerationMetadata, GenerationParams, LanguageModel, Message, RetryPolicy,
};
use crate::pricing::estimate_cost;
use crate::retry::{retry_with_backoff, BACKOFF_BASE_MS};

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Client for OpenRouter.
///
/// Use [`OpenRouterClient::new`] for production or
/// [`OpenRouterClient::with_base_url`] to point at a mock server in tests.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    backoff_base_ms: u64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default, Clone, Copy)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenRouterClient {
    /// Creates a client pointed at the production OpenRouter API.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NotConfigured`] if `api_key` is blank, or
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, model: &str) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NotConfigured`] if `api_key` is blank, or
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, LlmError> {
        if api_key.trim().is_empty() {
            return Err(LlmError::NotConfigured(
                "OPENROUTER_API_KEY is empty".to_owned(),
            ));
        }

        // Per-attempt timeouts come from the RetryPolicy; this is a backstop.
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("toolrank/0.1 (news-ingestion)")
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            backoff_base_ms: BACKOFF_BASE_MS,
        })
    }

    /// Overrides the back-off base delay. Tests use 0 to avoid sleeping.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    async fn execute(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<(String, Usage), LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("X-Title", "toolrank")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body).map_or_else(
                |_| body.chars().take(200).collect(),
                |envelope| envelope.error.message,
            );
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                context: "chat completion".to_owned(),
                source: e,
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok((content, parsed.usage.unwrap_or_default()))
    }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
    async fn generate(
        &self,
        messages: &[Message],
        params: GenerationParams,
        policy: RetryPolicy,
    ) -> Result<Generation, LlmError> {
        let started = Instant::now();
        let result =
            retry_with_backoff(policy, self.backoff_base_ms, || self.execute(messages, params))
                .await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(((content, usage), attempts)) => {
                let estimated_cost =
                    estimate_cost(&self.model, usage.prompt_tokens, usage.completion_tokens);
                tracing::info!(
                    model = %self.model,
                    tokens = usage.total_tokens,
                    cost = format!("{estimated_cost:.4}"),
                    duration_ms,
                    attempts,
                    "openrouter generation succeeded"
                );
                Ok(Generation {
                    content,
                    metadata: GenerationMetadata {
                        model: self.model.clone(),
                        prompt_tokens: usage.prompt_tokens,
                        completion_tokens: usage.completion_tokens,
                        total_tokens: usage.total_tokens,
                        estimated_cost,
                        duration_ms,
                        attempts,
                    },
                })
            }
            Err(err) => {
                tracing::error!(
                    model = %self.model,
                    duration_ms,
                    error = %err,
                    "openrouter generation failed"
                );
                Err(err)
            }
        }
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
