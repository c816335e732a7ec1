//! Logical key encoding for page records.
//!
//! Keys are `kind + "-" + path` with no escaping, so every key of one kind
//! sorts contiguously under the `kind-` prefix. A kind that itself contains
//! `-` can alias another `(kind, path)` pair; callers pick kinds accordingly.

/// Separator between kind and path.
pub const SEPARATOR: char = '-';

/// Compute the store key for a page identity.
pub fn page_key(kind: &str, path: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(kind.len() + 1 + path.len());
    key.extend_from_slice(kind.as_bytes());
    key.push(SEPARATOR as u8);
    key.extend_from_slice(path.as_bytes());
    key
}

/// Prefix shared by every key of `kind`.
pub fn scan_prefix(kind: &str) -> String {
    format!("{kind}{SEPARATOR}")
}
