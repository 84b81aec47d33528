//! # Per-Account Ledger State Machine
//!
//! A [`LedgerAccount`] holds the published root, the usage and limit
//! counters, and the action-log cursor marking what has already been folded
//! into the root. Its four operations are guarded pure transitions:
//!
//! - `create_invoice` / `claim_invoice` validate against the committed root
//!   *and* the pending range of the action log, then only append — they
//!   never touch the root.
//! - `commit` is the single operation that rewrites the root, by folding
//!   the pending range with witness chaining.
//! - `increase_limit` raises the credit cap; authorizing it is the calling
//!   boundary's concern.
//!
//! ## Credit Accounting
//!
//! `usage` models outstanding (unclaimed) exposure, not lifetime volume:
//! commits add an invoice's amount on create and subtract it on claim. The
//! create guard folds the same exposure over the pending range, so a
//! sequence of creates that would push `usage` past `limit` is rejected
//! before dispatch, never after — `usage <= limit` holds after every
//! successful commit.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ivl_core::{empty_leaf, Digest, InvoiceId, LedgerError};
use ivl_crypto::{empty_root, MerkleWitness};

use crate::invoice::Invoice;
use crate::log::{ActionCursor, ActionLog, InvoiceAction};

/// A notification emitted once per successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A create was dispatched.
    InvoiceCreated {
        /// The created invoice's identifier.
        id: InvoiceId,
    },
    /// A claim was dispatched.
    InvoiceClaimed {
        /// The claimed invoice's identifier.
        id: InvoiceId,
    },
    /// A pending range was folded into the published root.
    ActionsCommitted {
        /// The root after the fold.
        new_root: Digest,
    },
}

/// The minimal public surface an external verifier needs to validate a
/// commit against the trust anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedState {
    /// The committed tree root.
    pub root: Digest,
    /// Outstanding exposure across unclaimed committed invoices.
    pub usage: u32,
    /// The credit cap.
    pub limit: u32,
    /// Cursor of the last committed action.
    pub pending_cursor: Digest,
}

/// One logical invoice account: committed state plus its action log.
///
/// Single-writer: one committer dispatches and commits sequentially.
/// Read-only checks fold cursor-delimited snapshots of the log and may be
/// evaluated concurrently.
#[derive(Debug)]
pub struct LedgerAccount {
    height: u32,
    root: Digest,
    usage: u32,
    limit: u32,
    cursor: ActionCursor,
    log: ActionLog,
    events: Vec<LedgerEvent>,
}

impl LedgerAccount {
    /// A fresh account over an empty tree of the given height.
    pub fn new(height: u32, limit: u32) -> Result<Self, LedgerError> {
        Ok(Self {
            height,
            root: empty_root(height)?,
            usage: 0,
            limit,
            cursor: ActionCursor::genesis(),
            log: ActionLog::new(),
            events: Vec::new(),
        })
    }

    /// The committed root. Only `commit` changes it.
    pub fn root(&self) -> Digest {
        self.root
    }

    /// Outstanding committed exposure.
    pub fn usage(&self) -> u32 {
        self.usage
    }

    /// The credit cap.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Cursor of the last committed action.
    pub fn pending_cursor(&self) -> ActionCursor {
        self.cursor
    }

    /// The account's action log.
    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Events emitted so far, in order.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// The anchor-facing published state.
    pub fn published(&self) -> PublishedState {
        PublishedState {
            root: self.root,
            usage: self.usage,
            limit: self.limit,
            pending_cursor: *self.cursor.digest(),
        }
    }

    /// Dispatch a create for `invoice` at the empty slot `witness` points at.
    ///
    /// Guards, in order:
    /// 1. the witness proves the slot empty against the *committed* root —
    ///    new invoices always target a previously-empty slot;
    /// 2. no create with the same invoice hash is already pending;
    /// 3. outstanding exposure over the pending range plus this amount fits
    ///    under the limit.
    pub fn create_invoice(
        &mut self,
        invoice: Invoice,
        witness: MerkleWitness,
    ) -> Result<ActionCursor, LedgerError> {
        self.check_witness_height(&witness)?;

        if witness.calculate_root(&empty_leaf()) != self.root {
            return Err(LedgerError::SlotOccupied { id: invoice.id });
        }

        let pending = self.log.actions_from(&self.cursor)?;
        let hash = invoice.hash();

        let (already_pending, _) = pending.reduce(false, |found, action| {
            found || (action.is_create() && action.invoice().hash() == hash)
        });
        if already_pending {
            return Err(LedgerError::DuplicatePendingCreate { id: invoice.id });
        }

        let (outstanding, _) = pending.reduce(self.usage, fold_exposure);
        if outstanding.saturating_add(invoice.amount) > self.limit {
            return Err(LedgerError::LimitExceeded {
                limit: self.limit,
                outstanding,
                amount: invoice.amount,
            });
        }

        let id = invoice.id;
        debug!(invoice = %id, amount = invoice.amount, "dispatching create");
        let cursor = self.log.dispatch(InvoiceAction::Create { invoice, witness });
        self.events.push(LedgerEvent::InvoiceCreated { id });
        Ok(cursor)
    }

    /// Dispatch a claim for `invoice` at the slot `witness` points at.
    ///
    /// Guards, in order: the record must be unsettled; it must be present —
    /// committed at its hash or among pending creates; and no claim for the
    /// same hash may already be pending (double-dispatch protection until a
    /// commit consolidates it).
    pub fn claim_invoice(
        &mut self,
        invoice: Invoice,
        witness: MerkleWitness,
    ) -> Result<ActionCursor, LedgerError> {
        self.check_witness_height(&witness)?;

        if invoice.settled {
            return Err(LedgerError::AlreadySettled { id: invoice.id });
        }

        let hash = invoice.hash();
        let committed = witness.calculate_root(&hash) == self.root;

        let pending = self.log.actions_from(&self.cursor)?;
        let (create_pending, _) = pending.reduce(false, |found, action| {
            found || (action.is_create() && action.invoice().hash() == hash)
        });
        if !committed && !create_pending {
            return Err(LedgerError::InvoiceNotFound { id: invoice.id });
        }

        let (claim_pending, _) = pending.reduce(false, |found, action| {
            found || (action.is_claim() && action.invoice().hash() == hash)
        });
        if claim_pending {
            return Err(LedgerError::ClaimAlreadyPending { id: invoice.id });
        }

        let id = invoice.id;
        debug!(invoice = %id, amount = invoice.amount, "dispatching claim");
        let cursor = self.log.dispatch(InvoiceAction::Claim { invoice, witness });
        self.events.push(LedgerEvent::InvoiceClaimed { id });
        Ok(cursor)
    }

    /// Fold all pending actions into the committed root and usage.
    ///
    /// Each action's witness is evaluated against the running root produced
    /// by the prior actions in the fold — witnesses are only valid against
    /// the exact intermediate root they were computed for, which in the
    /// single-writer model is the previous action's resulting root in log
    /// order. Committing an empty range changes nothing.
    pub fn commit(&mut self) -> Result<Digest, LedgerError> {
        let pending = self.log.actions_from(&self.cursor)?;
        if pending.is_empty() {
            return Ok(self.root);
        }

        let (new_root, new_cursor) = pending.reduce(self.root, |_root, action| {
            let leaf = if action.is_create() {
                action.invoice().hash()
            } else {
                action.invoice().claim().hash()
            };
            action.witness().calculate_root(&leaf)
        });
        let (new_usage, _) = pending.reduce(self.usage, fold_exposure);

        info!(
            actions = pending.action_count(),
            root = %new_root,
            usage = new_usage,
            "committed pending actions"
        );
        self.root = new_root;
        self.usage = new_usage;
        self.cursor = new_cursor;
        self.events.push(LedgerEvent::ActionsCommitted { new_root });
        Ok(new_root)
    }

    /// Raise the credit cap. The signature/permission gate lives at the
    /// boundary that calls this.
    pub fn increase_limit(&mut self, amount: u32) {
        self.limit = self.limit.saturating_add(amount);
    }

    fn check_witness_height(&self, witness: &MerkleWitness) -> Result<(), LedgerError> {
        if witness.height() != self.height {
            return Err(LedgerError::InvalidWitnessLength {
                expected: self.height as usize - 1,
                actual: witness.nodes().len(),
            });
        }
        Ok(())
    }
}

/// Outstanding-exposure fold: creates add their amount, claims retire it.
fn fold_exposure(exposure: u32, action: &InvoiceAction) -> u32 {
    if action.is_create() {
        exposure.saturating_add(action.invoice().amount)
    } else {
        exposure.saturating_sub(action.invoice().amount)
    }
}
