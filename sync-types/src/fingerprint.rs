//! Content fingerprints for sync payloads.
//!
//! A [`Fingerprint`] is a SHA-256 digest over the exact serialized bytes that
//! would be transmitted. Equal fingerprints are treated as equal payloads, so
//! this must stay a cryptographic digest and never become a checksum.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Digest of a serialized sync payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Compute the fingerprint of a payload.
    pub fn of(payload: &[u8]) -> Self {
        let digest = Sha256::digest(payload);
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Create a Fingerprint from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() == FINGERPRINT_LEN {
            let mut arr = [0u8; FINGERPRINT_LEN];
            arr.copy_from_slice(bytes);
            Some(Self(arr))
        } else {
            None
        }
    }

    /// Get the raw bytes of this Fingerprint.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_string()[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let payload = b"alice,bob,carol";
        assert_eq!(Fingerprint::of(payload), Fingerprint::of(payload));
    }

    #[test]
    fn one_byte_difference_changes_fingerprint() {
        let a = Fingerprint::of(b"contacts: alice, bob");
        let b = Fingerprint::of(b"contacts: alice, bop");
        assert_ne!(a, b);
    }

    #[test]
    fn distinct_payloads_have_distinct_fingerprints() {
        let payloads: Vec<Vec<u8>> = (0u16..256).map(|i| i.to_be_bytes().to_vec()).collect();
        let mut seen = std::collections::HashSet::new();
        for payload in &payloads {
            assert!(seen.insert(Fingerprint::of(payload)));
        }
    }

    #[test]
    fn fingerprint_matches_known_sha256() {
        // SHA-256("abc")
        let fp = Fingerprint::of(b"abc");
        assert_eq!(
            fp.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn fingerprint_bytes_roundtrip() {
        let fp = Fingerprint::of(b"payload");
        assert_eq!(Fingerprint::from_bytes(fp.as_bytes()), Some(fp));
    }

    #[test]
    fn fingerprint_from_invalid_length_fails() {
        assert!(Fingerprint::from_bytes(&[0u8; 16]).is_none());
        assert!(Fingerprint::from_bytes(&[0u8; 33]).is_none());
    }

    #[test]
    fn debug_is_abbreviated() {
        let fp = Fingerprint::of(b"abc");
        assert_eq!(format!("{:?}", fp), "Fingerprint(ba7816bf)");
    }
}
