//! Configuration loading
//!
//! Loads configuration from `~/.config/neo/neo.toml` (or `NEO_CONFIG` env),
//! then applies environment overrides for secrets and deployment knobs.

use crate::errors::{NeoError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// NeoWs only serves feed windows of up to seven days.
pub const MAX_FEED_WINDOW_DAYS: u32 = 7;

/// Root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NeoConfig {
    /// Path to the SQLite store
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Maximum pooled SQLite connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// NeoWs feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Narrative (chat-completions) settings
    #[serde(default)]
    pub narrative: NarrativeConfig,

    /// HTTP read API settings
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_db_path() -> String {
    "asteroids.db".to_string()
}

fn default_pool_size() -> u32 {
    4
}

/// NeoWs feed configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    #[serde(default = "default_feed_api_base")]
    pub api_base: String,

    /// `DEMO_KEY` works but is heavily rate limited
    #[serde(default = "default_feed_api_key")]
    pub api_key: String,

    /// Days before today included in an ingestion run
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    #[serde(default = "default_feed_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_feed_api_base() -> String {
    "https://api.nasa.gov/neo/rest/v1".to_string()
}

fn default_feed_api_key() -> String {
    "DEMO_KEY".to_string()
}

fn default_window_days() -> u32 {
    MAX_FEED_WINDOW_DAYS
}

fn default_feed_timeout_secs() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_base: default_feed_api_base(),
            api_key: default_feed_api_key(),
            window_days: default_window_days(),
            timeout_secs: default_feed_timeout_secs(),
        }
    }
}

/// Narrative generator configuration
#[derive(Debug, Deserialize, Clone)]
pub struct NarrativeConfig {
    #[serde(default = "default_narrative_api_base")]
    pub api_base: String,

    /// Empty means "not configured"; report generation then fails with 500
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_narrative_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_narrative_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_narrative_timeout_secs() -> u64 {
    120
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_base: default_narrative_api_base(),
            api_key: String::new(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_narrative_timeout_secs(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://localhost:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:3000",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl Default for NeoConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            pool_size: default_pool_size(),
            feed: FeedConfig::default(),
            narrative: NarrativeConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl NeoConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "NEO_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "neo.toml";

    /// Load configuration
    ///
    /// Resolution order:
    /// 1. explicit `path` argument
    /// 2. `NEO_CONFIG` environment variable
    /// 3. `~/.config/neo/neo.toml`
    ///
    /// An explicit path must exist. A missing implicit file yields the
    /// defaults. Environment overrides are applied before validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(path) => Self::read_unvalidated(path)?,
            None => {
                let path = Self::resolve_config_path();
                if path.exists() {
                    Self::read_unvalidated(&path)?
                } else {
                    tracing::info!(path = %path.display(), "config not found, using defaults");
                    Self::default()
                }
            }
        };

        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let cfg = Self::read_unvalidated(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg = Self::deserialize(contents)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn read_unvalidated(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            NeoError::config_with_source(format!("failed to read config at {}", path.display()), e)
        })?;

        Self::deserialize(&contents)
    }

    fn deserialize(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| NeoError::config_with_source("failed to parse config", e))
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognised keys: `NASA_API_KEY` (or `API_KEY`), `OPENAI_API_KEY`
    /// (or `OPEN_AI_KEY`), `NEO_DB_PATH`, `NEO_BIND`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|&key| lookup(key))
                .find(|value| !value.trim().is_empty())
        };

        if let Some(key) = first(&["NASA_API_KEY", "API_KEY"]) {
            self.feed.api_key = key;
        }
        if let Some(key) = first(&["OPENAI_API_KEY", "OPEN_AI_KEY"]) {
            self.narrative.api_key = key;
        }
        if let Some(path) = first(&["NEO_DB_PATH"]) {
            self.db_path = path;
        }
        if let Some(bind) = first(&["NEO_BIND"]) {
            self.server.bind = bind;
        }
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("neo")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        if self.pool_size == 0 {
            return Err(NeoError::config("pool_size must be at least 1"));
        }

        if self.feed.window_days > MAX_FEED_WINDOW_DAYS {
            return Err(NeoError::config(format!(
                "feed.window_days = {} exceeds the NeoWs limit of {MAX_FEED_WINDOW_DAYS}",
                self.feed.window_days
            )));
        }

        if !(0.0..=2.0).contains(&self.narrative.temperature) {
            return Err(NeoError::config(format!(
                "narrative.temperature = {} must be within 0.0..=2.0",
                self.narrative.temperature
            )));
        }

        Ok(())
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> PathBuf {
        let path = &self.db_path;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(stripped);
        }
        PathBuf::from(path)
    }
}
