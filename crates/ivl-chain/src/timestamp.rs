//! Time-authority-signed action timestamps.
//!
//! The operator supplies the timestamps inside invoice records; a
//! [`SignedActionTimestamp`] is the independent countersignature tying the
//! action's hash to an instant the time authority actually attested. The
//! chain refuses creates and claims whose record timestamps disagree with
//! the countersigned instant.

use serde::{Deserialize, Serialize};

use ivl_core::{Digest, Timestamp};
use ivl_crypto::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

/// A (action hash, instant) pair signed by the time authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedActionTimestamp {
    /// Hash of the action record the instant applies to.
    pub action_hash: Digest,
    /// The attested instant.
    pub timestamp: Timestamp,
    /// Time-authority signature over `action_hash || timestamp`.
    pub signature: Ed25519Signature,
}

impl SignedActionTimestamp {
    /// Sign the binding of `action_hash` to `timestamp`.
    pub fn new(action_hash: Digest, timestamp: Timestamp, authority: &Ed25519KeyPair) -> Self {
        let signature = authority.sign(&Self::message(&action_hash, timestamp));
        Self {
            action_hash,
            timestamp,
            signature,
        }
    }

    /// Check the signature against the time authority's public key.
    pub fn verify(&self, authority: &Ed25519PublicKey) -> bool {
        authority.verify(&Self::message(&self.action_hash, self.timestamp), &self.signature)
    }

    /// Signed payload: hash (32) || seconds (4 BE).
    fn message(action_hash: &Digest, timestamp: Timestamp) -> [u8; 36] {
        let mut message = [0u8; 36];
        message[..32].copy_from_slice(action_hash.as_bytes());
        message[32..].copy_from_slice(&timestamp.to_be_bytes());
        message
    }
}
