//! # Error Types — Structured Error Hierarchy
//!
//! One `thiserror` enum for every guard in the workspace. The variant names
//! are stable identifiers that callers and tests match on; each carries
//! enough context (invoice id, expected vs actual root, limit figures) to
//! reconstruct why the guard failed without re-deriving witnesses.
//!
//! ## Propagation Policy
//!
//! Errors are raised at the point of violation and surfaced synchronously to
//! the caller of the guarded operation. Nothing is swallowed or retried
//! inside the core; resubmitting with corrected inputs (e.g. a fresh witness
//! after the root changed) is the caller's decision.

use thiserror::Error;

use crate::digest::Digest;
use crate::identity::InvoiceId;

/// Every way a ledger or chain operation can be rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The target Merkle slot is not empty in the committed tree.
    #[error("slot for invoice {id} is already occupied in the committed tree")]
    SlotOccupied {
        /// The invoice whose create was rejected.
        id: InvoiceId,
    },

    /// A create for the same invoice hash is already pending in the log.
    #[error("a create for invoice {id} is already pending")]
    DuplicatePendingCreate {
        /// The invoice whose create was rejected.
        id: InvoiceId,
    },

    /// The credit limit cannot cover the outstanding exposure plus this amount.
    #[error("limit exceeded: limit {limit}, outstanding {outstanding}, requested {amount}")]
    LimitExceeded {
        /// The account's credit limit.
        limit: u32,
        /// Outstanding exposure including pending actions.
        outstanding: u32,
        /// The amount of the rejected invoice.
        amount: u32,
    },

    /// The invoice is already settled.
    #[error("invoice {id} is already settled")]
    AlreadySettled {
        /// The invoice whose claim was rejected.
        id: InvoiceId,
    },

    /// The invoice exists neither in the committed tree nor among pending creates.
    #[error("invoice {id} has not been created")]
    InvoiceNotFound {
        /// The invoice whose claim was rejected.
        id: InvoiceId,
    },

    /// A claim for the same invoice hash is already pending in the log.
    #[error("a claim for invoice {id} is already pending")]
    ClaimAlreadyPending {
        /// The invoice whose claim was rejected.
        id: InvoiceId,
    },

    /// A witness does not have `height - 1` nodes.
    #[error("witness length {actual} does not match tree height (expected {expected} nodes)")]
    InvalidWitnessLength {
        /// `height - 1` for the tree in question.
        expected: usize,
        /// The number of nodes supplied.
        actual: usize,
    },

    /// A leaf index beyond the tree's capacity.
    #[error("index {index} is out of range for {leaf_count} leaves")]
    IndexOutOfRange {
        /// The offending index.
        index: u64,
        /// The tree's leaf capacity.
        leaf_count: u64,
    },

    /// A principal's signature did not verify.
    #[error("invalid signature from {signer}")]
    InvalidSignature {
        /// Which principal's signature failed ("operator", "time authority", ...).
        signer: &'static str,
    },

    /// A transition's attestation did not verify.
    #[error("invalid attestation: {0}")]
    InvalidAttestation(String),

    /// A witness recomputed a root that does not match the expected one.
    #[error("stale root: expected {expected}, computed {actual}")]
    StaleRootMismatch {
        /// The root the operation was verified against.
        expected: Digest,
        /// The root the witness actually produced.
        actual: Digest,
    },

    /// A fold resumption cursor that is not a batch boundary of the log.
    #[error("unknown action-log cursor {cursor}")]
    UnknownCursor {
        /// The unrecognized cursor digest.
        cursor: Digest,
    },

    /// Hex/byte encoding failure.
    #[error("encoding error: {0}")]
    Encoding(String),
}
