//! Unified error types for scrapedb.
//!
//! Every failing operation returns one of these to its immediate caller.
//! Nothing here is retried; staleness windows are the freshness mechanism.

use crate::config::ConfigError;

/// Unified error types for the page store, blob store and spider.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No record for the requested key or blob. Expected on a cache miss.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Stored record could not be decompressed or deserialized.
    #[error("DECODE_ERROR: {0}")]
    Decode(String),

    /// Blob filename too short to shard, or not a plain file name.
    #[error("INVALID_FILENAME: {0}")]
    InvalidFilename(String),

    /// URL could not be parsed.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Network, DNS, TLS or body read failure.
    #[error("TRANSPORT_ERROR: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP_STATUS: {url} returned {status}")]
    HttpStatus { url: String, status: u16 },

    /// Key-value store operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Storage(#[from] sled::Error),

    /// Filesystem operation failed.
    #[error("STORAGE_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration rejected at load or construction time.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// True for a cache miss, as opposed to corruption or I/O failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("page-https://test.com/a".to_string());
        assert!(err.to_string().contains("NOT_FOUND"));
        assert!(err.to_string().contains("page-https://test.com/a"));
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus { url: "https://test.com/blob.pdf".into(), status: 404 };
        assert_eq!(err.to_string(), "HTTP_STATUS: https://test.com/blob.pdf returned 404");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::Decode("x".into()).is_not_found());
        assert!(!Error::Io(std::io::Error::other("disk")).is_not_found());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: Error = ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() }.into();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().starts_with("CONFIG_ERROR"));
    }
}
