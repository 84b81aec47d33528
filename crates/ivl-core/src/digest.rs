//! # Content Digests — Domain-Separated SHA-256
//!
//! Defines [`Digest`], the 32-byte commitment type used for Merkle roots,
//! record hashes, and action-log cursors, together with the two hashing
//! functions every digest in the system flows through:
//!
//! - [`leaf_hash`]: `SHA256(0x00 || bytes)` — record digesting and leaf
//!   values.
//! - [`node_hash`]: `SHA256(0x01 || left || right)` — interior tree nodes.
//!
//! ## Security Invariant
//!
//! The domain byte makes the leaf and node hash images disjoint: an invoice
//! record digest can never be reinterpreted as a computed interior node, and
//! vice versa. Verified roots depend on this split never changing.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as _, Sha256};

use crate::error::LedgerError;

/// Hash domain tag for leaf values and record digests.
const DOMAIN_LEAF: u8 = 0x00;

/// Hash domain tag for interior tree nodes.
const DOMAIN_NODE: u8 = 0x01;

/// A 32-byte cryptographic commitment.
///
/// Serializes as a lowercase hex string for JSON interoperability. Ordering
/// is byte-lexicographic, which only matters for use as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Create a digest from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32-byte digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a digest from a 64-character hex string.
    pub fn from_hex(hex: &str) -> Result<Self, LedgerError> {
        let hex = hex.trim().to_lowercase();
        if hex.len() != 64 {
            return Err(LedgerError::Encoding(format!(
                "digest hex must be 64 chars, got {}",
                hex.len()
            )));
        }
        let mut out = [0u8; 32];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let s = std::str::from_utf8(chunk)
                .map_err(|e| LedgerError::Encoding(format!("invalid hex: {e}")))?;
            out[i] = u8::from_str_radix(s, 16)
                .map_err(|e| LedgerError::Encoding(format!("invalid hex at {i}: {e}")))?;
        }
        Ok(Self(out))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix: String = self.0[..4].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "Digest({prefix}...)")
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Compute a leaf-domain digest: `SHA256(0x00 || bytes)`.
///
/// This is the digest path for invoice records, cart items, and every other
/// value that can occupy a Merkle leaf.
pub fn leaf_hash(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([DOMAIN_LEAF]);
    hasher.update(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Digest(out)
}

/// Compute an interior node digest: `SHA256(0x01 || left || right)`.
///
/// Fixed arity 2; this is the only way parent nodes are formed, both when
/// building trees and when replaying witnesses.
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update([DOMAIN_NODE]);
    hasher.update(left.0);
    hasher.update(right.0);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    Digest(out)
}

/// The digest stored in an empty Merkle slot: `SHA256(0x00)`.
///
/// This is `zero[0]` of the zero-subtree cascade. It is the leaf-domain
/// digest of the empty payload, so no record digest can equal it.
pub fn empty_leaf() -> Digest {
    leaf_hash(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_hash_deterministic() {
        assert_eq!(leaf_hash(b"invoice"), leaf_hash(b"invoice"));
        assert_ne!(leaf_hash(b"invoice"), leaf_hash(b"invoices"));
    }

    #[test]
    fn test_domain_separation() {
        // A node over two empty leaves must differ from any leaf digest of
        // the concatenated bytes.
        let e = empty_leaf();
        let node = node_hash(&e, &e);
        let mut concat = Vec::new();
        concat.extend_from_slice(e.as_bytes());
        concat.extend_from_slice(e.as_bytes());
        assert_ne!(node, leaf_hash(&concat));
    }

    #[test]
    fn test_empty_leaf_known_vector() {
        // SHA256 of the single byte 0x00, verified against
        // Python hashlib.sha256(b"\x00").hexdigest().
        assert_eq!(
            empty_leaf().to_hex(),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let d = leaf_hash(b"roundtrip");
        let hex = d.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Digest::from_hex(&hex).unwrap(), d);
        assert_eq!(Digest::from_hex(&hex.to_uppercase()).unwrap(), d);
    }

    #[test]
    fn test_from_hex_rejects_malformed() {
        assert!(Digest::from_hex("aabb").is_err());
        assert!(Digest::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let d = leaf_hash(b"serde");
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_display_and_debug() {
        let d = leaf_hash(b"x");
        assert_eq!(format!("{d}"), d.to_hex());
        assert!(format!("{d:?}").starts_with("Digest("));
    }
}
