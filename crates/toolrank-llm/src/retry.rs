//! Retry with exponential back-off and jitter for language-model calls.
//!
//! Each attempt runs under its own timeout. Non-retriable errors (bad
//! envelope, empty content, 4xx other than 429) are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;
use crate::model::RetryPolicy;

pub(crate) const BACKOFF_BASE_MS: u64 = 1_000;
const MAX_DELAY_MS: u64 = 10_000;

/// Runs `operation` up to `policy.max_attempts` times.
///
/// Back-off before attempt `n + 1` is `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`, capped
/// at 10 s. Returns the value together with the number of attempts made.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<(T, u32), LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let outcome =
            match tokio::time::timeout(Duration::from_millis(policy.timeout_ms), operation()).await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout {
                    timeout_ms: policy.timeout_ms,
                }),
            };

        match outcome {
            Ok(value) => return Ok((value, attempt)),
            Err(err) => {
                if !err.is_retriable() || attempt >= max_attempts {
                    return Err(err);
                }
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms,
                    error = %err,
                    "language model transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
