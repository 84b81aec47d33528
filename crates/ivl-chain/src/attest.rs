//! # Attestation Boundary
//!
//! The [`Attestor`] trait is the seam between the transition chain and
//! whatever proving backend vouches for a transition output. The chain only
//! needs two capabilities: produce an attestation for an output, and check
//! an output/attestation pair. Both are pure from the chain's view.
//!
//! [`MockAttestor`] is the transparent implementation: the attestation is a
//! deterministic digest of the output's canonical encoding. It provides no
//! soundness (anyone who can hash can attest) but exercises the full trait
//! surface, so a real backend slots in without touching the chain code.

use ivl_core::{leaf_hash, Digest, LedgerError};

use crate::chain::TransitionOutput;

/// A backend that vouches for transition outputs.
pub trait Attestor: Send + Sync {
    /// The attestation type carried in each chain link.
    type Attestation: Clone + Send + Sync;

    /// Produce an attestation for `output`.
    fn attest(&self, output: &TransitionOutput) -> Result<Self::Attestation, LedgerError>;

    /// Check that `attestation` covers exactly `output`.
    fn verify(&self, output: &TransitionOutput, attestation: &Self::Attestation) -> bool;
}

/// Transparent attestor: the attestation is a digest of the output.
///
/// Deterministic and unforgeable only against accidental corruption, not
/// against an adversary. Intended for tests and for deployments where the
/// chain's signatures are the actual trust boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAttestor;

impl Attestor for MockAttestor {
    type Attestation = Digest;

    fn attest(&self, output: &TransitionOutput) -> Result<Self::Attestation, LedgerError> {
        Ok(leaf_hash(&output.canonical_bytes()))
    }

    fn verify(&self, output: &TransitionOutput, attestation: &Self::Attestation) -> bool {
        leaf_hash(&output.canonical_bytes()) == *attestation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainState;
    use ivl_core::empty_leaf;

    fn sample_output() -> TransitionOutput {
        TransitionOutput {
            state: ChainState::init(empty_leaf()),
            nonce: 3,
            limit: 500,
            claim_amount: 0,
        }
    }

    #[test]
    fn test_mock_attestation_is_deterministic() {
        let output = sample_output();
        let a = MockAttestor.attest(&output).unwrap();
        let b = MockAttestor.attest(&output).unwrap();
        assert_eq!(a, b);
        assert!(MockAttestor.verify(&output, &a));
    }

    #[test]
    fn test_mock_attestation_rejects_tampered_output() {
        let output = sample_output();
        let attestation = MockAttestor.attest(&output).unwrap();

        let mut tampered = output;
        tampered.limit = 501;
        assert!(!MockAttestor.verify(&tampered, &attestation));

        let mut tampered = output;
        tampered.nonce += 1;
        assert!(!MockAttestor.verify(&tampered, &attestation));
    }
}
