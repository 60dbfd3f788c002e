use std::path::PathBuf;

use anyhow::ensure;
use recommender::EngineConfig;
use serde::Deserialize;

/// Server configuration loaded once from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the serialized similarity artifact
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Result size when a request has no `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Largest `limit` a request may ask for
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,

    /// Rating-count threshold when a request has no `minRatingCount`
    #[serde(default = "default_min_rating_count")]
    pub default_min_rating_count: u32,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("app/models/recommendation_model.json")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_limit() -> usize {
    EngineConfig::default().default_limit
}

fn default_max_limit() -> usize {
    EngineConfig::default().max_limit
}

fn default_min_rating_count() -> u32 {
    EngineConfig::default().default_min_rating_count
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present)
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject defaults that the engine itself would refuse
    pub fn validate(&self) -> anyhow::Result<()> {
        let engine = self.engine_config();
        ensure!(engine.max_limit >= 1, "MAX_LIMIT must be at least 1");
        ensure!(
            (1..=engine.max_limit).contains(&engine.default_limit),
            "DEFAULT_LIMIT must be between 1 and MAX_LIMIT ({})",
            engine.max_limit
        );
        ensure!(
            engine.default_min_rating_count >= engine.min_rating_floor,
            "DEFAULT_MIN_RATING_COUNT must be at least {}",
            engine.min_rating_floor
        );
        Ok(())
    }

    /// Request bounds handed to the engine
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            default_min_rating_count: self.default_min_rating_count,
            ..EngineConfig::default()
        }
    }

    /// `host:port` to bind the listener to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            host: default_host(),
            port: default_port(),
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            default_min_rating_count: default_min_rating_count(),
        }
    }
}
