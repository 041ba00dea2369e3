use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset for optional keys.
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_score = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !(0.0..=10.0).contains(&value) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is outside 0..=10"),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("TOOLRANK_ENV", "development"));
    let log_level = or_default("TOOLRANK_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("TOOLRANK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TOOLRANK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TOOLRANK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let openrouter_api_key = optional("OPENROUTER_API_KEY");
    let llm_model = or_default("TOOLRANK_LLM_MODEL", "anthropic/claude-sonnet-4");
    let llm_max_attempts = parse_u32("TOOLRANK_LLM_MAX_ATTEMPTS", "3")?;
    let llm_timeout_ms = parse_u64("TOOLRANK_LLM_TIMEOUT_MS", "30000")?;

    let tavily_api_key = optional("TAVILY_API_KEY");
    let brave_search_api_key = optional("BRAVE_SEARCH_API_KEY");
    let search_query = optional("TOOLRANK_SEARCH_QUERY");
    let search_days = parse_u32("TOOLRANK_SEARCH_DAYS", "1")?;

    let fetch_timeout_secs = parse_u64("TOOLRANK_FETCH_TIMEOUT_SECS", "10")?;
    let user_agent = or_default(
        "TOOLRANK_USER_AGENT",
        "Mozilla/5.0 (compatible; toolrank/0.1)",
    );

    let max_articles = parse_usize("TOOLRANK_MAX_ARTICLES", "20")?;
    let quality_min_average = parse_score("TOOLRANK_QUALITY_MIN_AVERAGE", "7.0")?;
    let daily_schedule = or_default("TOOLRANK_DAILY_SCHEDULE", "0 0 6 * * *");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        openrouter_api_key,
        llm_model,
        llm_max_attempts,
        llm_timeout_ms,
        tavily_api_key,
        brave_search_api_key,
        search_query,
        search_days,
        fetch_timeout_secs,
        user_agent,
        max_articles,
        quality_min_average,
        daily_schedule,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
