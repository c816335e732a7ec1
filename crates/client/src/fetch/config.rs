//! Spider configuration and HTTP client construction.

use std::time::Duration;

use reqwest::{Client, Proxy};
use scrapedb_core::{AppConfig, ConfigError, Error};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "ScrapeDB";

/// Configuration for a [`Spider`](super::Spider).
#[derive(Debug, Clone)]
pub struct SpiderConfig {
    /// Caller-provided HTTP client (default: a plain client)
    pub client: Option<Client>,

    /// SOCKS5 proxy as `host:port` or `socks5://host:port` (default: none)
    pub socks_proxy: Option<String>,

    /// Pacing interval; stored for callers, never enforced (default: 1s)
    pub sleep_interval: Duration,

    /// User agent string (default: "ScrapeDB")
    pub user_agent: String,

    /// Whole-request timeout for built clients (default: none)
    pub timeout: Option<Duration>,
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            client: None,
            socks_proxy: None,
            sleep_interval: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl From<&AppConfig> for SpiderConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            client: None,
            socks_proxy: config.socks_proxy.clone(),
            sleep_interval: config.sleep_interval(),
            user_agent: config.user_agent.clone(),
            timeout: Some(config.timeout()),
        }
    }
}

impl SpiderConfig {
    /// Check the configuration and produce the HTTP client to use.
    pub(crate) fn build_client(&self) -> Result<Client, Error> {
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        match (&self.client, &self.socks_proxy) {
            (Some(_), Some(_)) => Err(invalid("client", "cannot be combined with socks_proxy")),
            (Some(client), None) => Ok(client.clone()),
            (None, Some(proxy)) => self.socks_client(proxy),
            (None, None) => {
                let mut builder = Client::builder().use_rustls_tls();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder
                    .build()
                    .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
            }
        }
    }

    fn socks_client(&self, proxy: &str) -> Result<Client, Error> {
        let proxy_url = socks_url(proxy)?;
        let proxy = Proxy::all(&proxy_url).map_err(|e| invalid("socks_proxy", &e.to_string()))?;

        let idle_per_host = std::thread::available_parallelism().map_or(1, |n| n.get()) + 1;

        let mut builder = Client::builder()
            .proxy(proxy)
            .use_rustls_tls()
            .pool_max_idle_per_host(idle_per_host)
            .pool_idle_timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10));

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::debug!(proxy = %proxy_url, idle_per_host, "building SOCKS client");

        builder
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
    }
}

/// Normalize a proxy setting to a `socks5://` or `socks5h://` URL.
fn socks_url(proxy: &str) -> Result<String, Error> {
    let proxy = proxy.trim();
    if proxy.is_empty() {
        return Err(invalid("socks_proxy", "must not be blank"));
    }

    match proxy.split_once("://") {
        None => Ok(format!("socks5://{proxy}")),
        Some(("socks5" | "socks5h", rest)) if !rest.is_empty() => Ok(proxy.to_string()),
        Some((scheme, _)) => Err(invalid("socks_proxy", &format!("unsupported proxy scheme: {scheme}"))),
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_field(result: Result<Client, Error>) -> Option<String> {
        match result {
            Err(Error::Config(ConfigError::Invalid { field, .. })) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_spider_config_default() {
        let config = SpiderConfig::default();
        assert!(config.client.is_none());
        assert!(config.socks_proxy.is_none());
        assert_eq!(config.sleep_interval, Duration::from_secs(1));
        assert_eq!(config.user_agent, "ScrapeDB");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_from_app_config() {
        let app = AppConfig {
            user_agent: "MyUserAgent".into(),
            sleep_interval_ms: 3_600_000,
            socks_proxy: Some("127.0.0.1:9050".into()),
            ..Default::default()
        };
        let config = SpiderConfig::from(&app);
        assert_eq!(config.user_agent, "MyUserAgent");
        assert_eq!(config.sleep_interval, Duration::from_secs(3600));
        assert_eq!(config.socks_proxy.as_deref(), Some("127.0.0.1:9050"));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_socks_url() {
        assert_eq!(socks_url("127.0.0.1:9050").unwrap(), "socks5://127.0.0.1:9050");
        assert_eq!(socks_url("socks5h://proxy:1080").unwrap(), "socks5h://proxy:1080");
        assert!(socks_url("http://proxy:8080").is_err());
        assert!(socks_url("socks5://").is_err());
        assert!(socks_url(" ").is_err());
    }

    #[tokio::test]
    async fn test_build_default_client() {
        assert!(SpiderConfig::default().build_client().is_ok());
    }

    #[tokio::test]
    async fn test_build_socks_client() {
        let config = SpiderConfig { socks_proxy: Some("127.0.0.1:9050".into()), ..Default::default() };
        assert!(config.build_client().is_ok());
    }

    #[test]
    fn test_reject_empty_user_agent() {
        let config = SpiderConfig { user_agent: String::new(), ..Default::default() };
        assert_eq!(invalid_field(config.build_client()).as_deref(), Some("user_agent"));
    }

    #[tokio::test]
    async fn test_reject_client_with_proxy() {
        let config = SpiderConfig {
            client: Some(Client::new()),
            socks_proxy: Some("127.0.0.1:9050".into()),
            ..Default::default()
        };
        assert_eq!(invalid_field(config.build_client()).as_deref(), Some("client"));
    }

    #[test]
    fn test_reject_http_proxy() {
        let config = SpiderConfig { socks_proxy: Some("http://proxy:8080".into()), ..Default::default() };
        assert_eq!(invalid_field(config.build_client()).as_deref(), Some("socks_proxy"));
    }
}
