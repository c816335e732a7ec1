//! Client code for scrapedb.
//!
//! This crate provides the Spider: a cache-aware HTTP fetcher that serves
//! fresh pages from the store and commits new fetches back into it.

pub mod fetch;

pub use fetch::{BlobFetch, PageFetch, Spider, SpiderConfig};
pub use fetch::url::{UrlError, blob_filename};
