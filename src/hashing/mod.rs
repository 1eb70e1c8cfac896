//! Title fingerprints.
//!
//! The exact cache is keyed by the full 32-byte BLAKE3 digest of the normalized
//! title. Callers are expected to normalize first; [`fingerprint_raw`] does both.

use crate::normalize::normalize_title;

/// BLAKE3 digest of an already-normalized title.
#[inline]
pub fn fingerprint(normalized: &str) -> [u8; 32] {
    *blake3::hash(normalized.as_bytes()).as_bytes()
}

/// Normalizes `raw` and returns its fingerprint.
#[inline]
pub fn fingerprint_raw(raw: Option<&str>) -> [u8; 32] {
    fingerprint(&normalize_title(raw))
}

/// Lower-case hex rendering of a fingerprint (used for file names and logs).
pub fn key_hash_hex(hash: &[u8; 32]) -> String {
    blake3::Hash::from_bytes(*hash).to_hex().to_string()
}

/// Parses a 64-character hex string back into a fingerprint.
pub fn key_hash_from_hex(hex: &str) -> Option<[u8; 32]> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}

/// First 8 bytes of the title digest, for places that want a `u64` id.
#[inline]
pub fn fingerprint_u64(normalized: &str) -> u64 {
    let hash = fingerprint(normalized);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(bytes)
}
