//! Core types and storage for scrapedb.
//!
//! This crate provides:
//! - Page store over an embedded sled database, with gzip-compressed JSON records
//! - Blob store sharded by filename on the local filesystem
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{BlobStore, Page, PageScan, PageStore, Store};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
