//! # Hashing
//!
//! The fragment checksum is the tail of a single SHA-256 over the payload.

use sha2::{Digest, Sha256};

use crate::config::{CHECKSUM_LENGTH, DIGEST_LENGTH};

/// Computes the SHA-256 digest of `data`.
///
/// # Example
///
/// ```
/// use pushtx_core::hash::sha256;
///
/// let digest = sha256(b"push it");
/// assert_eq!(digest.len(), 32);
/// ```
pub fn sha256(data: &[u8]) -> [u8; DIGEST_LENGTH] {
    Sha256::digest(data).into()
}

/// Fragment checksum: the last [`CHECKSUM_LENGTH`] bytes of `SHA-256(data)`.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let digest = sha256(data);
    let mut tail = [0u8; CHECKSUM_LENGTH];
    tail.copy_from_slice(&digest[DIGEST_LENGTH - CHECKSUM_LENGTH..]);
    tail
}
