//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SCRAPEDB_*)
//! 2. TOML config file (if SCRAPEDB_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SCRAPEDB_*)
/// 2. TOML config file (if SCRAPEDB_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory of the sled page database.
    ///
    /// Set via SCRAPEDB_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Root directory of the sharded blob tree.
    ///
    /// Set via SCRAPEDB_BLOB_DIR environment variable.
    #[serde(default = "default_blob_dir")]
    pub blob_dir: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via SCRAPEDB_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pacing interval between requests, in milliseconds. Callers enforce it.
    ///
    /// Set via SCRAPEDB_SLEEP_INTERVAL_MS environment variable.
    #[serde(default = "default_sleep_interval_ms")]
    pub sleep_interval_ms: u64,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SCRAPEDB_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// SOCKS5 proxy, as `host:port` or `socks5://host:port`.
    ///
    /// Set via SCRAPEDB_SOCKS_PROXY environment variable.
    #[serde(default)]
    pub socks_proxy: Option<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./scrapedb/db")
}

fn default_blob_dir() -> PathBuf {
    PathBuf::from("./scrapedb/blobs")
}

fn default_user_agent() -> String {
    "ScrapeDB".into()
}

fn default_sleep_interval_ms() -> u64 {
    1_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            blob_dir: default_blob_dir(),
            user_agent: default_user_agent(),
            sleep_interval_ms: default_sleep_interval_ms(),
            timeout_ms: default_timeout_ms(),
            socks_proxy: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pacing interval as Duration.
    pub fn sleep_interval(&self) -> Duration {
        Duration::from_millis(self.sleep_interval_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SCRAPEDB_`
    /// 2. TOML file from `SCRAPEDB_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SCRAPEDB_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SCRAPEDB_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./scrapedb/db"));
        assert_eq!(config.blob_dir, PathBuf::from("./scrapedb/blobs"));
        assert_eq!(config.user_agent, "ScrapeDB");
        assert_eq!(config.sleep_interval_ms, 1_000);
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.socks_proxy.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.sleep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "scrapedb.toml",
                r#"
                user_agent = "FromFile"
                sleep_interval_ms = 250
                "#,
            )?;
            jail.set_env("SCRAPEDB_CONFIG_FILE", "scrapedb.toml");
            jail.set_env("SCRAPEDB_USER_AGENT", "FromEnv");
            jail.set_env("SCRAPEDB_SOCKS_PROXY", "127.0.0.1:9050");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.user_agent, "FromEnv");
            assert_eq!(config.sleep_interval_ms, 250);
            assert_eq!(config.socks_proxy.as_deref(), Some("127.0.0.1:9050"));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SCRAPEDB_TIMEOUT_MS", "10");

            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
            Ok(())
        });
    }
}
