//! probe-proxy entry point.
//!
//! Fetches one page through a SOCKS5 proxy into a throwaway store and checks
//! the body. Any failure exits non-zero; the scratch directory is removed
//! either way. Logging goes to stderr so stdout carries only the verdict.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use scrapedb_client::{Spider, SpiderConfig};
use scrapedb_core::{AppConfig, Store};
use tracing_subscriber::EnvFilter;

/// Fetch a page through a SOCKS5 proxy and check the response.
#[derive(Debug, Parser)]
#[command(name = "probe-proxy", version)]
struct Args {
    /// SOCKS5 proxy, as host:port or socks5://host:port
    proxy: String,

    /// Page to fetch through the proxy
    #[arg(long, default_value = "https://google.com/")]
    url: String,

    /// Text the response body must contain
    #[arg(long, default_value = "google")]
    expect: String,

    /// Staleness window for the cache lookup, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    stale_after_ms: u64,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json);

    let scratch = tempfile::Builder::new()
        .prefix("probe-proxy-")
        .tempdir()
        .context("failed to create scratch directory")?;

    check_proxy(&args, scratch.path()).await?;

    println!("ok");
    Ok(())
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn check_proxy(args: &Args, scratch: &Path) -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let spider_config = SpiderConfig { socks_proxy: Some(args.proxy.clone()), ..SpiderConfig::from(&config) };

    let store = Store::open(scratch.join("blobs"), scratch.join("db")).context("failed to open scratch store")?;
    let spider = Spider::new(store.clone(), spider_config).context("failed to configure spider")?;

    tracing::info!(proxy = %args.proxy, url = %args.url, "checking proxy");

    let fetched = spider
        .request_page("test", &args.url, Duration::from_millis(args.stale_after_ms))
        .await;

    drop(spider);
    store.close().context("failed to close scratch store")?;

    let fetched = fetched.with_context(|| format!("failed to fetch {} through {}", args.url, args.proxy))?;
    if !contains(&fetched.data, args.expect.as_bytes()) {
        bail!(
            "response from {} does not contain {:?}:\n{}",
            args.url,
            args.expect,
            String::from_utf8_lossy(&fetched.data)
        );
    }

    tracing::info!(bytes = fetched.data.len(), "proxy ok");
    Ok(())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}
