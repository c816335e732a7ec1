//! URL helpers for blob naming and request validation.

use scrapedb_core::Error;
use scrapedb_core::cache::blobs::SHARD_DEPTH;

/// Error type for URL handling failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("'{0}' is too short for a blob name")]
    FilenameTooShort(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::FilenameTooShort(_) => Error::InvalidFilename(err.to_string()),
            UrlError::InvalidUrl(_) | UrlError::UnsupportedScheme(_) => Error::InvalidUrl(err.to_string()),
        }
    }
}

/// Parse a request URL, accepting only http and https.
pub fn parse(input: &str) -> Result<url::Url, UrlError> {
    let parsed = url::Url::parse(input.trim()).map_err(|e| UrlError::InvalidUrl(format!("{input}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Blob filename for a URL: its last path segment.
///
/// Query and fragment are ignored. The segment is used as-is, without
/// percent-decoding, so it never contains a path separator.
pub fn blob_filename(input: &str) -> Result<String, UrlError> {
    let parsed = parse(input)?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    if segment.chars().count() < SHARD_DEPTH {
        return Err(UrlError::FilenameTooShort(segment.to_string()));
    }

    Ok(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_and_https() {
        assert_eq!(parse("https://example.com/a").unwrap().scheme(), "https");
        assert_eq!(parse("http://example.com/a").unwrap().scheme(), "http");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(parse("  https://example.com/a  ").unwrap().as_str(), "https://example.com/a");
    }

    #[test]
    fn test_parse_unsupported_scheme() {
        let result = parse("file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(s)) if s == "file"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(parse("not a url"), Err(UrlError::InvalidUrl(_))));
        assert!(matches!(parse(""), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_blob_filename_last_segment() {
        assert_eq!(blob_filename("https://example.com/files/report.pdf").unwrap(), "report.pdf");
        assert_eq!(blob_filename("https://example.com/my-blob").unwrap(), "my-blob");
    }

    #[test]
    fn test_blob_filename_ignores_query_and_fragment() {
        assert_eq!(blob_filename("https://example.com/a/data.csv?v=2#top").unwrap(), "data.csv");
    }

    #[test]
    fn test_blob_filename_keeps_percent_encoding() {
        assert_eq!(blob_filename("https://example.com/a%2Fb.txt").unwrap(), "a%2Fb.txt");
    }

    #[test]
    fn test_blob_filename_too_short() {
        assert!(matches!(blob_filename("https://example.com/ab"), Err(UrlError::FilenameTooShort(s)) if s == "ab"));
        assert!(matches!(blob_filename("https://example.com/"), Err(UrlError::FilenameTooShort(s)) if s.is_empty()));
        assert!(matches!(blob_filename("https://example.com/dir/"), Err(UrlError::FilenameTooShort(_))));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = UrlError::FilenameTooShort("ab".into()).into();
        assert!(matches!(err, Error::InvalidFilename(_)));

        let err: Error = UrlError::UnsupportedScheme("ftp".into()).into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }
}
