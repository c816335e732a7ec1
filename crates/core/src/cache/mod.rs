//! Sled-backed page cache and filesystem blob store.
//!
//! This module provides persistent storage for fetched resources:
//!
//! - Page records under `kind-path` keys, as gzip-compressed JSON
//! - Cancellable prefix scans over one kind
//! - Blobs sharded three directories deep by leading filename characters

pub mod blobs;
pub mod codec;
pub mod key;
pub mod pages;
pub mod store;

pub use crate::Error;

pub use blobs::BlobStore;
pub use key::page_key;
pub use pages::{Page, PageScan, PageStore};
pub use store::Store;
