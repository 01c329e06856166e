//! Content addressing for the verification cache.
//!
//! Two submissions that differ only by case or whitespace must land on the same record,
//! so hashing always goes through [`normalize_text`] first.

use sha2::{Digest, Sha256};

/// Lowercases, trims, and collapses every whitespace run to a single space.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// SHA-256 of the normalized text, as 64 lowercase hex characters.
#[inline]
pub fn content_hash(text: &str) -> String {
    hash_normalized(&normalize_text(text))
}

/// SHA-256 of an already-normalized string.
#[inline]
pub fn hash_normalized(normalized: &str) -> String {
    let digest = Sha256::digest(normalized.as_bytes());
    format!("{:x}", digest)
}

/// Returns `true` if `hash` looks like a value produced by [`content_hash`].
pub fn is_content_hash(hash: &str) -> bool {
    hash.len() == 64
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}
