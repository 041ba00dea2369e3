//! Language-model capability for toolrank.
//!
//! [`LanguageModel`] is the seam the quality gate and content analyzer call.
//! [`OpenRouterClient`] implements it over the OpenRouter chat-completions
//! API with per-attempt timeouts, exponential back-off, and token-based cost
//! estimation.

pub mod error;
pub mod json;
pub mod model;
pub mod openrouter;
pub mod pricing;

mod retry;

pub use error::LlmError;
pub use json::strip_code_fence;
pub use model::{
    Generation, GenerationMetadata, GenerationParams, LanguageModel, Message, RetryPolicy, Role,
};
pub use openrouter::OpenRouterClient;
pub use pricing::estimate_cost;
