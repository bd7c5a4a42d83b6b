use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Default number of items returned by a recommendation request
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Default number of events returned by the history view
    #[serde(default = "default_history_limit")]
    pub history_limit: i64,
}

fn default_database_url() -> String {
    "sqlite:news_recommender.db".to_string()
}

fn default_recommendation_limit() -> usize {
    10
}

fn default_history_limit() -> i64 {
    50
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
