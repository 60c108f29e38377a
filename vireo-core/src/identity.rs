//! Digest helpers shared across the cache workspace

use sha2::{Digest, Sha256};

/// SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Hex-encoded SHA-256 digest of a string.
///
/// Used by the key directory to shorten keys that would exceed the
/// backend's key-length ceiling while keeping them deterministic.
pub fn sha256_hex(input: &str) -> String {
    hex::encode(compute_content_hash(input.as_bytes()))
}
