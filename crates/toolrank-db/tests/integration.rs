//! Offline tests for pool configuration and row types.
//! These tests do not require a live database connection.

use rust_decimal::Decimal;
use toolrank_core::{AppConfig, Environment, RunStatus};
use toolrank_db::{IngestionRunUpdate, PoolConfig};
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        openrouter_api_key: None,
        llm_model: "anthropic/claude-sonnet-4".to_string(),
        llm_max_attempts: 3,
        llm_timeout_ms: 30_000,
        tavily_api_key: None,
        brave_search_api_key: None,
        search_query: None,
        search_days: 1,
        fetch_timeout_secs: 10,
        user_agent: "ua".to_string(),
        max_articles: 20,
        quality_min_average: 7.0,
        daily_schedule: "0 0 6 * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn run_update_carries_partial_failure_for_persistence() {
    let update = IngestionRunUpdate {
        status: RunStatus::PartiallyFailed,
        articles_discovered: 10,
        articles_passed_quality: 5,
        articles_ingested: 4,
        articles_skipped: 2,
        articles_degraded: 0,
        ranking_changes: 7,
        estimated_cost_usd: Decimal::new(120, 4),
        errors: vec!["fetch failed".to_string()],
        ingested_article_ids: vec![Uuid::nil()],
    };

    assert_eq!(update.status.persisted(), RunStatus::Completed);
    assert_eq!(update.estimated_cost_usd.to_string(), "0.0120");
}
