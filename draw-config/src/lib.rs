//! Environment and CLI configuration loading for the draw pipeline,
//! following the same `from_env` + `clap::Parser` split used by the
//! teacher's server configuration loader.

pub mod error;
pub mod source;

use std::time::Duration;

pub use error::ConfigError;
pub use source::{ParserId, SourceConfig};

use clap::Parser;

/// Tunables for the jittered exponential backoff helper shared by the
/// writer's retry wrapper and the LLM client (spec.md section 7).
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub base: Duration,
    pub ceiling: Duration,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            ceiling: Duration::from_secs(10),
            max_attempts: 4,
        }
    }
}

/// Cache TTLs for the key classes in spec.md section 6.2.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtlConfig {
    pub seen_issue: Duration,
    pub lock_issue: Duration,
    pub prediction_lock: Duration,
    pub winrate: Duration,
    /// TTL for the `excel:lottery:{N}`/`excel:stats:{days}` response
    /// cache. `CacheManager` already invalidates these key classes on
    /// draw commit; nothing writes them yet since the read API that
    /// would populate them is out of scope.
    pub excel: Duration,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            seen_issue: Duration::from_secs(3_600),
            lock_issue: Duration::from_secs(3),
            prediction_lock: Duration::from_secs(300),
            winrate: Duration::from_secs(300),
            excel: Duration::from_secs(180),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub llm_endpoint: String,
    pub llm_api_key: String,
    pub sources: Vec<SourceConfig>,
    pub retry: RetryConfig,
    pub cache_ttl: CacheTtlConfig,
    /// Bootstrap scan cap for the Omission Engine (spec.md section 9,
    /// "Miss-streak bootstrap cap").
    pub omission_bootstrap_cap: u32,
    pub omission_bootstrap_page_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = require_var("DATABASE_URL")?;
        let redis_url = require_var("REDIS_URL")?;
        let llm_endpoint = require_var("LLM_ENDPOINT")?;
        let llm_api_key = require_var("LLM_API_KEY")?;

        let sources_json = std::env::var("SOURCES_JSON").unwrap_or_else(|_| "[]".to_string());
        let sources: Vec<SourceConfig> =
            serde_json::from_str(&sources_json).map_err(ConfigError::InvalidSources)?;

        let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let omission_bootstrap_cap = std::env::var("OMISSION_BOOTSTRAP_CAP")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10_000);
        let omission_bootstrap_page_size = std::env::var("OMISSION_BOOTSTRAP_PAGE_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);

        Ok(Self {
            database_url,
            redis_url,
            server_host,
            server_port,
            llm_endpoint,
            llm_api_key,
            sources,
            retry: RetryConfig::default(),
            cache_ttl: CacheTtlConfig::default(),
            omission_bootstrap_cap,
            omission_bootstrap_page_size,
        })
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Command-line overrides layered on top of `Config::from_env`.
#[derive(Parser, Debug)]
#[command(name = "draw-server")]
#[command(about = "Draw ingestion, enrichment, and prediction pipeline")]
pub struct Args {
    #[arg(long, env = "SERVER_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "SERVER_HOST")]
    pub host: Option<String>,
}

impl Args {
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(port) = self.port {
            config.server_port = port;
        }
        if let Some(host) = self.host.clone() {
            config.server_host = host;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_defaults_match_spec() {
        let r = RetryConfig::default();
        assert_eq!(r.base, Duration::from_secs(2));
        assert_eq!(r.ceiling, Duration::from_secs(10));
    }
}
