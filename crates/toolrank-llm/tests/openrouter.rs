//! Integration tests for `OpenRouterClient` using wiremock HTTP mocks.

use toolrank_llm::{GenerationParams, LanguageModel, LlmError, Message, OpenRouterClient, RetryPolicy};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> OpenRouterClient {
    OpenRouterClient::with_base_url("test-key", "anthropic/claude-sonnet-4", base_url)
        .expect("client construction should not fail")
        .with_backoff_base_ms(0)
}

fn params() -> GenerationParams {
    GenerationParams {
        temperature: 0.3,
        max_tokens: 1000,
    }
}

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        timeout_ms: 5_000,
    }
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "gen-1",
        "choices": [
            { "message": { "role": "assistant", "content": content } }
        ],
        "usage": {
            "prompt_tokens": 1000,
            "completion_tokens": 200,
            "total_tokens": 1200
        }
    })
}

#[tokio::test]
async fn generate_returns_content_and_usage() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"ok\":true}")))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let generation = client
        .generate(&[Message::user("hello")], params(), policy(3))
        .await
        .expect("generation should succeed");

    assert_eq!(generation.content, "{\"ok\":true}");
    assert_eq!(generation.metadata.model, "anthropic/claude-sonnet-4");
    assert_eq!(generation.metadata.prompt_tokens, 1000);
    assert_eq!(generation.metadata.completion_tokens, 200);
    assert_eq!(generation.metadata.total_tokens, 1200);
    assert_eq!(generation.metadata.attempts, 1);
    // 1000 × $3/M + 200 × $15/M
    assert!((generation.metadata.estimated_cost - 0.006).abs() < 1e-9);
}

#[tokio::test]
async fn server_error_is_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("done")))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let generation = client
        .generate(&[Message::user("hello")], params(), policy(3))
        .await
        .expect("second attempt should succeed");

    assert_eq!(generation.content, "done");
    assert_eq!(generation.metadata.attempts, 2);
}

#[tokio::test]
async fn rate_limit_exhausts_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": { "message": "Rate limit exceeded", "code": 429 }
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .generate(&[Message::user("hello")], params(), policy(2))
        .await
        .expect_err("should fail after two attempts");

    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .generate(&[Message::user("hello")], params(), policy(3))
        .await
        .expect_err("400 should fail");

    assert!(matches!(err, LlmError::Api { status: 400, .. }));
}

#[tokio::test]
async fn missing_content_is_empty_content_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client
        .generate(&[Message::user("hello")], params(), policy(3))
        .await
        .expect_err("empty choices should fail");

    assert!(matches!(err, LlmError::EmptyContent));
}

#[test]
fn blank_api_key_is_rejected() {
    let result = OpenRouterClient::with_base_url("  ", "anthropic/claude-sonnet-4", "http://x");
    assert!(matches!(result, Err(LlmError::NotConfigured(_))));
}
