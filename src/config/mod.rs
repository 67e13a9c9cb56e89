use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub mod defaults;
pub mod duration_serde;

use defaults::*;
use duration_serde::duration;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for every path outside `/api` and `/health`
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_logo_base_url")]
    pub logo_base_url: String,
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    #[serde(default = "default_logo_timeout", with = "duration")]
    pub logo_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Number of holders requested per rich list
    #[serde(default = "default_rich_list_limit")]
    pub rich_list_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_logo_store_path")]
    pub logo_store_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Upper bound on response cache entries (least recently used evicted first).
    /// Unset keeps every entry for the lifetime of the process.
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// How many logos of one page are resolved at the same time
    #[serde(default = "default_logo_concurrency")]
    pub logo_concurrency: usize,
}

// Web defaults
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_static_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATIC_DIR)
}

// Upstream defaults
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_logo_base_url() -> String {
    DEFAULT_LOGO_BASE_URL.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
}

fn default_logo_timeout() -> Duration {
    Duration::from_millis(DEFAULT_LOGO_TIMEOUT_MS)
}

fn default_user_agent() -> String {
    format!("ledgerglow/{}", env!("CARGO_PKG_VERSION"))
}

fn default_rich_list_limit() -> u32 {
    DEFAULT_RICH_LIST_LIMIT
}

// Storage defaults
fn default_logo_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOGO_STORE_PATH)
}

// Aggregator defaults
fn default_logo_concurrency() -> usize {
    DEFAULT_LOGO_CONCURRENCY
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            logo_base_url: default_logo_base_url(),
            request_timeout: default_request_timeout(),
            logo_timeout: default_logo_timeout(),
            user_agent: default_user_agent(),
            rich_list_limit: default_rich_list_limit(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            logo_store_path: default_logo_store_path(),
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            logo_concurrency: default_logo_concurrency(),
        }
    }
}

impl Config {
    pub fn load_from_file(config_file: &str) -> Result<Self> {
        let config: Self = if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            toml::from_str(&contents)?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            default_config
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the services cannot start with
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("upstream.api_base_url", &self.upstream.api_base_url),
            ("upstream.logo_base_url", &self.upstream.logo_base_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                AppError::configuration(format!("{field} '{value}' is not a valid URL: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::configuration(format!(
                    "{field} '{value}' must use http or https"
                )));
            }
        }

        if self.aggregator.logo_concurrency == 0 {
            return Err(AppError::configuration(
                "aggregator.logo_concurrency must be at least 1",
            ));
        }

        if self.cache.max_entries == Some(0) {
            return Err(AppError::configuration(
                "cache.max_entries must be at least 1 when set",
            ));
        }

        Ok(())
    }
}
