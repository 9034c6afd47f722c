//! Preview identifier hashing.
//!
//! A preview environment is named after the first 8 hex characters of the
//! SHA-256 digest of its caller-supplied id. That is a 32-bit space; two ids
//! can collide once enough previews exist, and no attempt is made to detect it.

use sha2::{Digest, Sha256};

/// Length of the hashed preview id, in hex characters.
pub const PREVIEW_HASH_LEN: usize = 8;

/// Hasher for preview environment identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreviewIdHasher;

impl PreviewIdHasher {
    /// Creates a new preview id hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes the full hex SHA-256 digest of a preview id.
    #[must_use]
    pub fn full_hash(&self, preview_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(preview_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Computes the 8 character hashed preview id.
    #[must_use]
    pub fn hash(&self, preview_id: &str) -> String {
        self.short_hash(&self.full_hash(preview_id))
    }

    /// Truncates a hex digest to the preview hash length.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(PREVIEW_HASH_LEN).collect()
    }
}
