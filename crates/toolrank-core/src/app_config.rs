#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub openrouter_api_key: Option<String>,
    pub llm_model: String,
    pub llm_max_attempts: u32,
    pub llm_timeout_ms: u64,
    pub tavily_api_key: Option<String>,
    pub brave_search_api_key: Option<String>,
    /// Replaces the built-in primary discovery query when set.
    pub search_query: Option<String>,
    pub search_days: u32,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
    pub max_articles: usize,
    pub quality_min_average: f64,
    /// Cron expression for the scheduled daily run.
    pub daily_schedule: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "openrouter_api_key",
                &self.openrouter_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_max_attempts", &self.llm_max_attempts)
            .field("llm_timeout_ms", &self.llm_timeout_ms)
            .field(
                "tavily_api_key",
                &self.tavily_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "brave_search_api_key",
                &self.brave_search_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("search_query", &self.search_query)
            .field("search_days", &self.search_days)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_articles", &self.max_articles)
            .field("quality_min_average", &self.quality_min_average)
            .field("daily_schedule", &self.daily_schedule)
            .finish()
    }
}
