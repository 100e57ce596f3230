//! Content digests.
//!
//! A skill's identity is the SHA-256 of its manifest bytes, hex encoded. No
//! normalisation is applied: a CRLF/LF difference is a different skill.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::Result;

/// Length of a hex-encoded digest.
pub const DIGEST_LEN: usize = 64;

/// Digest of a manifest buffer.
#[must_use]
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of a manifest file on disk.
pub fn digest_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(digest_bytes(&bytes))
}

/// Whether `value` has the shape of a digest produced by [`digest_bytes`].
#[must_use]
pub fn is_digest(value: &str) -> bool {
    value.len() == DIGEST_LEN && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Shortened digest for human output.
#[must_use]
pub fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
