//! Compressed JSON framing for stored values.
//!
//! Values are serialized to JSON and then gzip-compressed. Decoding
//! reverses both steps; any failure along the way is an `Error::Decode`.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::pages::Page;
use crate::Error;

/// Serialize `value` to JSON and gzip the result.
pub fn encode_json<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    let json = serde_json::to_vec(value).map_err(|e| Error::Decode(format!("serialize: {e}")))?;

    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Gunzip `bytes` and deserialize the JSON inside.
pub fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let mut json = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut json)
        .map_err(|e| Error::Decode(format!("decompress: {e}")))?;

    serde_json::from_slice(&json).map_err(|e| Error::Decode(format!("deserialize: {e}")))
}

/// Encode a page record for storage.
pub fn encode(page: &Page) -> Result<Vec<u8>, Error> {
    encode_json(page)
}

/// Decode a stored page record.
pub fn decode(bytes: &[u8]) -> Result<Page, Error> {
    decode_json(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_page() -> Page {
        Page { fetched_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(), data: b"<html>hello</html>".to_vec() }
    }

    #[test]
    fn test_round_trip() {
        let page = sample_page();
        let bytes = encode(&page).unwrap();
        assert_eq!(decode(&bytes).unwrap(), page);
    }

    #[test]
    fn test_output_is_gzip() {
        let bytes = encode(&sample_page()).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_json_field_names() {
        let bytes = encode(&sample_page()).unwrap();
        let value: serde_json::Value = decode_json(&bytes).unwrap();
        assert_eq!(value["fetchedAt"], "2024-03-01T12:30:00Z");
        assert_eq!(value["data"], "PGh0bWw+aGVsbG88L2h0bWw+");
    }

    #[test]
    fn test_binary_data_survives() {
        let page = Page { fetched_at: Utc::now(), data: (0..=255u8).collect() };
        assert_eq!(decode(&encode(&page).unwrap()).unwrap().data, page.data);
    }

    #[test]
    fn test_decode_garbage() {
        let result = decode(b"definitely not gzip");
        assert!(matches!(result, Err(Error::Decode(msg)) if msg.starts_with("decompress")));
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = encode(&sample_page()).unwrap();
        let result = decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape() {
        let bytes = encode_json(&serde_json::json!({ "unrelated": true })).unwrap();
        let result = decode(&bytes);
        assert!(matches!(result, Err(Error::Decode(msg)) if msg.starts_with("deserialize")));
    }
}
