//! Cache-aware fetch pipeline.
//!
//! ### Cache policy
//! - A page is served from the store while `fetched_at + stale_after` is in
//!   the future (both sides UTC). Otherwise it is refetched and replaced.
//! - Errors are returned as-is; retrying is the caller's business.
//!
//! ### Blobs
//! - Named after the URL's last path segment, which must have at least
//!   three characters. Checked before any request goes out.
//! - The body is streamed to the blob store, never held in memory. A body
//!   that fails midway leaves the previous blob and its record untouched.
//! - The page record for a blob holds the decimal byte count.

pub mod config;
pub mod url;

use std::io;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures_util::TryStreamExt;
use reqwest::{Client, Response, header};
use scrapedb_core::{Error, Page, Store};
use tokio_util::io::StreamReader;

pub use config::{DEFAULT_USER_AGENT, SpiderConfig};

/// Result of [`Spider::request_page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    /// Response body, from the network or the cache
    pub data: Vec<u8>,
    /// Whether `data` came from the cache
    pub cached: bool,
}

/// Result of [`Spider::request_blob`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobFetch {
    /// Bytes written to the blob store; 0 on a cache hit
    pub bytes_written: u64,
    /// Whether the blob was already fresh
    pub cached: bool,
}

/// Fetches pages and blobs, serving fresh copies from the store.
#[derive(Debug, Clone)]
pub struct Spider {
    http: Client,
    store: Store,
    sleep_interval: Duration,
    user_agent: String,
}

impl Spider {
    /// Create a spider over `store`, validating `config` once.
    pub fn new(store: Store, config: SpiderConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self { http, store, sleep_interval: config.sleep_interval, user_agent: config.user_agent })
    }

    /// Pacing interval callers should wait between requests.
    pub fn sleep_interval(&self) -> Duration {
        self.sleep_interval
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Fetch `url` as a page of `kind`, unless a fresh copy is cached.
    pub async fn request_page(&self, kind: &str, url: &str, stale_after: Duration) -> Result<PageFetch, Error> {
        if let Some(page) = self.fresh_page(kind, url, stale_after)? {
            tracing::debug!(kind, url, bytes = page.data.len(), "page cache hit");
            return Ok(PageFetch { data: page.data, cached: true });
        }

        let start = Instant::now();
        let response = self.get(url).await?;
        let status = response.status();

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("failed to read response: {e}")))?
            .to_vec();

        self.store.pages().update(kind, url, &data)?;

        tracing::debug!(
            kind,
            url,
            status = status.as_u16(),
            bytes = data.len(),
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched page"
        );

        Ok(PageFetch { data, cached: false })
    }

    /// Download `url` into the blob store, unless a fresh copy is recorded under `kind`.
    pub async fn request_blob(&self, kind: &str, url: &str, stale_after: Duration) -> Result<BlobFetch, Error> {
        if self.fresh_page(kind, url, stale_after)?.is_some() {
            tracing::debug!(kind, url, "blob cache hit");
            return Ok(BlobFetch { bytes_written: 0, cached: true });
        }

        let filename = url::blob_filename(url)?;

        let start = Instant::now();
        let response = self.get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus { url: url.to_string(), status: status.as_u16() });
        }

        let body = response.bytes_stream().map_err(io::Error::other);
        let mut reader = StreamReader::new(Box::pin(body));
        let bytes_written = self
            .store
            .blobs()
            .write_async(&filename, &mut reader)
            .await
            .map_err(body_error)?;

        self.store
            .pages()
            .update(kind, url, bytes_written.to_string().as_bytes())?;

        tracing::debug!(
            kind,
            url,
            filename = %filename,
            bytes = bytes_written,
            fetch_ms = start.elapsed().as_millis() as u64,
            "fetched blob"
        );

        Ok(BlobFetch { bytes_written, cached: false })
    }

    /// The cached page for `(kind, url)` if it is still fresh.
    fn fresh_page(&self, kind: &str, url: &str, stale_after: Duration) -> Result<Option<Page>, Error> {
        match self.store.pages().get(kind, url) {
            Ok(page) if page.is_fresh(stale_after, Utc::now()) => Ok(Some(page)),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get(&self, url: &str) -> Result<Response, Error> {
        let parsed = url::parse(url)?;

        self.http
            .get(parsed)
            .header(header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("network error: {e}")))
    }
}

/// Body read failures surface through the blob copy as I/O errors; report
/// them as transport errors rather than storage errors.
fn body_error(err: Error) -> Error {
    match err {
        Error::Io(e) if e.get_ref().is_some_and(|inner| inner.is::<reqwest::Error>()) => {
            Error::Transport(format!("failed to read response: {e}"))
        }
        other => other,
    }
}
