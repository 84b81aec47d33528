//! # Chain State & Transition Chain
//!
//! [`ChainState`] is the minimal verifiable state — tree root plus
//! outstanding credit exposure — with pure create/claim transitions.
//! [`TransitionChain`] wraps it in the full protocol: every step checks the
//! predecessor link's attestation, the principal signatures that authorize
//! this particular step, and the timestamp countersignature where one is
//! required, then attests its own output and becomes the new head.
//!
//! Steps are atomic: any guard failure rejects the transition and the head
//! is unchanged; retry is the caller's concern.

use serde::{Deserialize, Serialize};
use tracing::info;

use ivl_core::{empty_leaf, Digest, LedgerError, Timestamp};
use ivl_crypto::{empty_root, Ed25519PublicKey, Ed25519Signature, MerkleWitness};
use ivl_ledger::Invoice;

use crate::attest::Attestor;
use crate::timestamp::SignedActionTimestamp;

/// Tree root plus the sum of created-but-unclaimed invoice amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    /// The invoice tree root this state commits to.
    pub root: Digest,
    /// Outstanding exposure: creates add, claims retire.
    pub used_limit: u32,
}

impl ChainState {
    /// A state anchored at `root` with no exposure.
    pub fn init(root: Digest) -> Self {
        Self {
            root,
            used_limit: 0,
        }
    }

    /// Write `invoice` into the empty slot the witness points at.
    ///
    /// Rejects a replay (the new root equals the current one, so the
    /// invoice is already in place) and a non-empty target slot.
    pub fn create(
        &self,
        invoice: &Invoice,
        witness: &MerkleWitness,
    ) -> Result<ChainState, LedgerError> {
        let new_root = witness.calculate_root(&invoice.hash());
        if new_root == self.root {
            return Err(LedgerError::DuplicatePendingCreate { id: invoice.id });
        }
        if witness.calculate_root(&empty_leaf()) != self.root {
            return Err(LedgerError::SlotOccupied { id: invoice.id });
        }
        Ok(Self {
            root: new_root,
            used_limit: self.used_limit.saturating_add(invoice.amount),
        })
    }

    /// Replace `invoice`'s leaf with its settled form, touched at
    /// `claimed_at`.
    ///
    /// The witness must prove the unsettled record at the current root;
    /// settling retires the invoice's exposure.
    pub fn claim(
        &self,
        invoice: &Invoice,
        claimed_at: Timestamp,
        witness: &MerkleWitness,
    ) -> Result<ChainState, LedgerError> {
        if invoice.settled {
            return Err(LedgerError::AlreadySettled { id: invoice.id });
        }
        if witness.calculate_root(&invoice.hash()) != self.root {
            return Err(LedgerError::InvoiceNotFound { id: invoice.id });
        }
        let new_root = witness.calculate_root(&invoice.access(claimed_at).claim().hash());
        if new_root == self.root {
            return Err(LedgerError::AlreadySettled { id: invoice.id });
        }
        Ok(Self {
            root: new_root,
            used_limit: self.used_limit.saturating_sub(invoice.amount),
        })
    }
}

/// The public result of one chain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutput {
    /// Post-step state.
    pub state: ChainState,
    /// Steps since the last limit grant (set-limit resets to 1).
    pub nonce: u32,
    /// The credit cap in force.
    pub limit: u32,
    /// Amount settled by this step; zero for non-claim steps.
    pub claim_amount: u32,
}

impl TransitionOutput {
    /// Fixed-width encoding the attestation covers:
    /// root (32) || used_limit (4 BE) || nonce (4 BE) || limit (4 BE) ||
    /// claim_amount (4 BE).
    pub fn canonical_bytes(&self) -> [u8; 48] {
        let mut bytes = [0u8; 48];
        bytes[..32].copy_from_slice(self.state.root.as_bytes());
        bytes[32..36].copy_from_slice(&self.state.used_limit.to_be_bytes());
        bytes[36..40].copy_from_slice(&self.nonce.to_be_bytes());
        bytes[40..44].copy_from_slice(&self.limit.to_be_bytes());
        bytes[44..48].copy_from_slice(&self.claim_amount.to_be_bytes());
        bytes
    }
}

/// One attested step, owning its whole predecessor chain.
#[derive(Debug, Clone)]
pub struct ChainLink<A> {
    /// The step this one extends; `None` only at genesis.
    pub prev: Option<Box<ChainLink<A>>>,
    /// This step's output.
    pub output: TransitionOutput,
    /// The backend's attestation over `output`.
    pub attestation: A,
}

/// The public keys authorized to drive a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principals {
    /// Signs every create and claim, and the genesis step.
    pub operator: Ed25519PublicKey,
    /// Countersigns action timestamps.
    pub time_authority: Ed25519PublicKey,
    /// Identifies the account whose limit is being granted.
    pub credit_account: Ed25519PublicKey,
    /// Signs limit grants for `credit_account`.
    pub credit_authority: Ed25519PublicKey,
}

/// A chain of attested transitions over one invoice tree.
#[derive(Debug)]
pub struct TransitionChain<T: Attestor> {
    principals: Principals,
    attestor: T,
    height: u32,
    head: Option<ChainLink<T::Attestation>>,
}

impl<T: Attestor> TransitionChain<T> {
    /// A chain over an empty tree of the given height, awaiting `init`.
    pub fn new(principals: Principals, attestor: T, height: u32) -> Result<Self, LedgerError> {
        // Height is validated up front so later steps cannot fail on it.
        empty_root(height)?;
        Ok(Self {
            principals,
            attestor,
            height,
            head: None,
        })
    }

    /// The principals this chain enforces.
    pub fn principals(&self) -> &Principals {
        &self.principals
    }

    /// The newest link, if any step has run.
    pub fn head(&self) -> Option<&ChainLink<T::Attestation>> {
        self.head.as_ref()
    }

    /// Genesis step: the operator signs the domain-separated zero value.
    pub fn init(
        &mut self,
        operator_signature: &Ed25519Signature,
    ) -> Result<TransitionOutput, LedgerError> {
        if self.head.is_some() {
            return Err(LedgerError::InvalidAttestation(
                "chain already has a genesis link".into(),
            ));
        }
        if !self
            .principals
            .operator
            .verify(empty_leaf().as_bytes(), operator_signature)
        {
            return Err(LedgerError::InvalidSignature { signer: "operator" });
        }
        let output = TransitionOutput {
            state: ChainState::init(empty_root(self.height)?),
            nonce: 1,
            limit: 0,
            claim_amount: 0,
        };
        self.push(output)
    }

    /// Grant `new_limit` to the credit account; resets the nonce.
    ///
    /// The credit authority signs `prev_nonce || credit_account ||
    /// new_limit`, so a grant is bound to the exact chain position it
    /// extends and cannot be replayed at a later nonce.
    pub fn set_limit(
        &mut self,
        new_limit: u32,
        authority_signature: &Ed25519Signature,
    ) -> Result<TransitionOutput, LedgerError> {
        let prev = self.verified_head()?;
        let message = Self::limit_message(prev.nonce, &self.principals.credit_account, new_limit);
        if !self
            .principals
            .credit_authority
            .verify(&message, authority_signature)
        {
            return Err(LedgerError::InvalidSignature {
                signer: "credit authority",
            });
        }
        let output = TransitionOutput {
            state: prev.state,
            nonce: 1,
            limit: new_limit,
            claim_amount: 0,
        };
        self.push(output)
    }

    /// Append an operator-signed, time-attested invoice creation.
    pub fn create_invoice(
        &mut self,
        invoice: &Invoice,
        witness: &MerkleWitness,
        operator_signature: &Ed25519Signature,
        timestamp: &SignedActionTimestamp,
    ) -> Result<TransitionOutput, LedgerError> {
        let prev = self.verified_head()?;
        let hash = invoice.hash();
        if !self.principals.operator.verify(hash.as_bytes(), operator_signature) {
            return Err(LedgerError::InvalidSignature { signer: "operator" });
        }
        if !timestamp.verify(&self.principals.time_authority) {
            return Err(LedgerError::InvalidSignature {
                signer: "time authority",
            });
        }
        if timestamp.action_hash != hash {
            return Err(LedgerError::InvalidAttestation(
                "timestamp countersigns a different action".into(),
            ));
        }
        if timestamp.timestamp != invoice.created_at {
            return Err(LedgerError::InvalidAttestation(
                "attested instant differs from the record's creation time".into(),
            ));
        }
        let outstanding = prev.state.used_limit;
        if outstanding.saturating_add(invoice.amount) > prev.limit {
            return Err(LedgerError::LimitExceeded {
                limit: prev.limit,
                outstanding,
                amount: invoice.amount,
            });
        }
        let output = TransitionOutput {
            state: prev.state.create(invoice, witness)?,
            nonce: prev.nonce + 1,
            limit: prev.limit,
            claim_amount: 0,
        };
        self.push(output)
    }

    /// Append an operator-signed, time-attested settlement.
    ///
    /// The timestamp countersigns the record *as touched at the attested
    /// instant*, which is the form the settled leaf derives from.
    pub fn claim_invoice(
        &mut self,
        invoice: &Invoice,
        witness: &MerkleWitness,
        operator_signature: &Ed25519Signature,
        timestamp: &SignedActionTimestamp,
    ) -> Result<TransitionOutput, LedgerError> {
        let prev = self.verified_head()?;
        if !self
            .principals
            .operator
            .verify(invoice.hash().as_bytes(), operator_signature)
        {
            return Err(LedgerError::InvalidSignature { signer: "operator" });
        }
        if !timestamp.verify(&self.principals.time_authority) {
            return Err(LedgerError::InvalidSignature {
                signer: "time authority",
            });
        }
        if timestamp.action_hash != invoice.access(timestamp.timestamp).hash() {
            return Err(LedgerError::InvalidAttestation(
                "timestamp countersigns a different settlement record".into(),
            ));
        }
        let output = TransitionOutput {
            state: prev.state.claim(invoice, timestamp.timestamp, witness)?,
            nonce: prev.nonce + 1,
            limit: prev.limit,
            claim_amount: invoice.amount,
        };
        self.push(output)
    }

    /// Walk head to genesis, re-checking every attestation.
    ///
    /// Returns the number of links verified. Iterative, so chain length is
    /// bounded by memory rather than stack depth.
    pub fn verify_chain(&self) -> Result<u32, LedgerError> {
        let mut current = self.head.as_ref();
        let mut verified = 0u32;
        while let Some(link) = current {
            if !self.attestor.verify(&link.output, &link.attestation) {
                return Err(LedgerError::InvalidAttestation(format!(
                    "attestation check failed {verified} links from the head"
                )));
            }
            verified += 1;
            current = link.prev.as_deref();
        }
        Ok(verified)
    }

    /// The head's output, after re-verifying its attestation.
    fn verified_head(&self) -> Result<TransitionOutput, LedgerError> {
        let head = self.head.as_ref().ok_or_else(|| {
            LedgerError::InvalidAttestation("chain has no genesis link".into())
        })?;
        if !self.attestor.verify(&head.output, &head.attestation) {
            return Err(LedgerError::InvalidAttestation(
                "head attestation check failed".into(),
            ));
        }
        Ok(head.output)
    }

    fn push(&mut self, output: TransitionOutput) -> Result<TransitionOutput, LedgerError> {
        let attestation = self.attestor.attest(&output)?;
        info!(
            nonce = output.nonce,
            root = %output.state.root,
            used_limit = output.state.used_limit,
            limit = output.limit,
            "appended chain link"
        );
        let prev = self.head.take().map(Box::new);
        self.head = Some(ChainLink {
            prev,
            output,
            attestation,
        });
        Ok(output)
    }

    /// Limit-grant payload: prev nonce (4 BE) || account key (32) ||
    /// new limit (4 BE).
    pub fn limit_message(
        prev_nonce: u32,
        credit_account: &Ed25519PublicKey,
        new_limit: u32,
    ) -> [u8; 40] {
        let mut message = [0u8; 40];
        message[..4].copy_from_slice(&prev_nonce.to_be_bytes());
        message[4..36].copy_from_slice(credit_account.as_bytes());
        message[36..].copy_from_slice(&new_limit.to_be_bytes());
        message
    }
}
