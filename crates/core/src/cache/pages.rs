//! Page record operations.
//!
//! Provides get, update and prefix scan over page records stored in sled
//! under `kind-path` keys.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::codec;
use super::key::{page_key, scan_prefix};
use crate::Error;

/// The last successfully fetched payload for a `(kind, path)` identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub fetched_at: DateTime<Utc>,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl Page {
    /// Whether `fetched_at + stale_after` is still after `now`.
    ///
    /// A window too large to represent never expires.
    pub fn is_fresh(&self, stale_after: Duration, now: DateTime<Utc>) -> bool {
        match TimeDelta::from_std(stale_after) {
            Ok(window) => self
                .fetched_at
                .checked_add_signed(window)
                .is_none_or(|expires| expires > now),
            Err(_) => true,
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    // An empty payload may have been written as `null`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD.decode(encoded).map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

/// Page records keyed by `(kind, path)`.
#[derive(Clone, Debug)]
pub struct PageStore {
    db: sled::Db,
}

impl PageStore {
    pub(crate) fn new(db: sled::Db) -> Self {
        Self { db }
    }

    pub(crate) fn db(&self) -> &sled::Db {
        &self.db
    }

    /// Get the page stored for `(kind, path)`.
    ///
    /// Returns `Error::NotFound` on a miss and `Error::Decode` when the
    /// stored bytes are corrupt.
    pub fn get(&self, kind: &str, path: &str) -> Result<Page, Error> {
        let key = page_key(kind, path);
        match self.db.get(&key)? {
            Some(value) => codec::decode(&value),
            None => Err(Error::NotFound(String::from_utf8_lossy(&key).into_owned())),
        }
    }

    /// Replace the page for `(kind, path)` with `data`, stamped with the current UTC time.
    pub fn update(&self, kind: &str, path: &str, data: &[u8]) -> Result<(), Error> {
        let page = Page { fetched_at: Utc::now(), data: data.to_vec() };
        let value = codec::encode(&page)?;
        self.db.insert(page_key(kind, path), value)?;
        Ok(())
    }

    /// Stream every path stored under `kind`, in key order.
    ///
    /// Iteration runs on a blocking worker and hands paths over one at a
    /// time. `cancel` is checked before each path is emitted.
    pub async fn scan(&self, cancel: CancellationToken, kind: &str) -> PageScan {
        let (tx, rx) = mpsc::channel(1);
        let db = self.db.clone();
        let kind = kind.to_string();

        let producer = tokio::task::spawn_blocking(move || {
            let result = produce_paths(&db, &kind, &cancel, &tx);
            if let Err(e) = &result {
                tracing::warn!(kind = %kind, error = %e, "page scan ended early");
            }
            result
        });

        PageScan { rx, producer }
    }
}

fn produce_paths(
    db: &sled::Db, kind: &str, cancel: &CancellationToken, tx: &mpsc::Sender<String>,
) -> Result<(), Error> {
    let prefix = scan_prefix(kind);

    for key in db.scan_prefix(prefix.as_bytes()).keys() {
        if cancel.is_cancelled() {
            tracing::debug!(kind, "page scan cancelled");
            break;
        }

        let key = key?;
        let path = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
        if tx.blocking_send(path).is_err() {
            break;
        }
    }

    Ok(())
}

/// A lazy, non-restartable sequence of paths produced by [`PageStore::scan`].
///
/// The sequence ends when the prefix is exhausted, the scan is cancelled,
/// or the store fails. Store failures never appear as elements; they are
/// reported by [`PageScan::finish`].
#[derive(Debug)]
pub struct PageScan {
    rx: mpsc::Receiver<String>,
    producer: JoinHandle<Result<(), Error>>,
}

impl PageScan {
    /// Receive the next path, or `None` once the sequence is exhausted.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop the scan and report how the producer ended.
    pub async fn finish(mut self) -> Result<(), Error> {
        self.rx.close();
        match self.producer.await {
            Ok(result) => result,
            Err(e) => Err(Error::Io(std::io::Error::other(format!("scan worker failed: {e}")))),
        }
    }

    /// Drain the remaining paths, then report how the producer ended.
    pub async fn try_collect(mut self) -> Result<Vec<String>, Error> {
        let mut paths = Vec::new();
        while let Some(path) = self.recv().await {
            paths.push(path);
        }
        self.finish().await?;
        Ok(paths)
    }
}
