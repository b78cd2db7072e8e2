use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Model used when `GEMINI_MODEL` is not set.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
/// Public Gemini REST endpoint used when `GEMINI_BASE_URL` is not set.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_SUMMARY_LANGUAGE: &str = "Turkish";
const DEFAULT_SUMMARY_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BATCH_CONCURRENCY: usize = 1;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the article summarizer.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the Gemini service. When absent the summarizer starts in the unavailable state.
    pub gemini_api_key: Option<String>,
    /// Gemini model identifier, echoed back as `model_used`.
    pub gemini_model: String,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,
    /// Natural language the summary fields are written in.
    pub summary_language: String,
    /// Wall-clock limit for one summarization call, in seconds.
    pub summary_timeout_secs: u64,
    /// Number of documents processed concurrently within one batch.
    pub batch_concurrency: usize,
    /// Maximum accepted HTTP request body, in bytes.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self {
            gemini_api_key: load_env_optional("GEMINI_API_KEY"),
            gemini_model: load_env_optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: load_env_optional("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            summary_language: load_env_optional("SUMMARY_LANGUAGE")
                .unwrap_or_else(|| DEFAULT_SUMMARY_LANGUAGE.to_string()),
            summary_timeout_secs: parse_optional("SUMMARY_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_SUMMARY_TIMEOUT_SECS),
            batch_concurrency: parse_optional("BATCH_CONCURRENCY")?
                .unwrap_or(DEFAULT_BATCH_CONCURRENCY),
            max_upload_bytes: parse_optional("MAX_UPLOAD_BYTES")?
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            server_port: parse_optional("SERVER_PORT")?,
        }
        .validated()
    }

    /// Per-call timeout applied to the summarization service.
    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.summary_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("SUMMARY_TIMEOUT_SECS".into()));
        }
        if self.batch_concurrency == 0 {
            return Err(ConfigError::InvalidValue("BATCH_CONCURRENCY".into()));
        }
        Ok(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            summary_language: DEFAULT_SUMMARY_LANGUAGE.to_string(),
            summary_timeout_secs: DEFAULT_SUMMARY_TIMEOUT_SECS,
            batch_concurrency: DEFAULT_BATCH_CONCURRENCY,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            server_port: None,
        }
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        model = %config.gemini_model,
        base_url = %config.gemini_base_url,
        api_key_present = config.gemini_api_key.is_some(),
        timeout_secs = config.summary_timeout_secs,
        batch_concurrency = config.batch_concurrency,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
