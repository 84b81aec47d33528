//! # Action Log & Reducer
//!
//! The append-only log of dispatched-but-uncommitted operations. It is the
//! ledger's write-ahead log: `create_invoice` and `claim_invoice` only ever
//! append here, and `commit` folds a cursor-delimited range of it into the
//! published root.
//!
//! ## Cursor
//!
//! The log position is an [`ActionCursor`]: a digest chaining every action
//! up to that point (`cursor' = node_hash(cursor, action.digest())`). A
//! cursor is a fold resumption token — the account stores the cursor of the
//! last committed action, and every pending-range check folds from there.
//! Only batch boundaries are valid resumption points.
//!
//! ## Determinism
//!
//! [`ActionRange::reduce`] is a strict left fold in batch order, then
//! within-batch dispatch order, never reordered. This is load-bearing:
//! multiple callers fold the *same* pending range with *different*
//! accumulator types (a `bool` existence check, a `u32` exposure sum, a
//! `Digest` root rewrite) and all must agree on ordering to reach
//! consistent results. Folds are read-only; any number may run over one
//! snapshot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ivl_core::{leaf_hash, node_hash, Digest, LedgerError};
use ivl_crypto::MerkleWitness;

use crate::invoice::Invoice;

/// A dispatched, not-yet-committed mutation.
///
/// Owned by the log once dispatched; folding retires an action logically,
/// but the log never physically deletes — replay from any boundary cursor
/// stays possible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceAction {
    /// Create `invoice` at the empty slot the witness points at.
    Create {
        /// The invoice to be written.
        invoice: Invoice,
        /// Witness for the target slot, computed against the root this
        /// action expects (the previous action's resulting root in log
        /// order).
        witness: MerkleWitness,
    },
    /// Settle `invoice` at the slot the witness points at.
    Claim {
        /// The invoice being settled (still unsettled in this record).
        invoice: Invoice,
        /// Witness for the invoice's slot.
        witness: MerkleWitness,
    },
}

impl InvoiceAction {
    /// Dispatch-type tag byte used in the action digest.
    fn tag(&self) -> u8 {
        match self {
            Self::Create { .. } => 0,
            Self::Claim { .. } => 1,
        }
    }

    /// Whether this is a create.
    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }

    /// Whether this is a claim.
    pub fn is_claim(&self) -> bool {
        matches!(self, Self::Claim { .. })
    }

    /// The invoice this action concerns.
    pub fn invoice(&self) -> &Invoice {
        match self {
            Self::Create { invoice, .. } | Self::Claim { invoice, .. } => invoice,
        }
    }

    /// The witness attached at dispatch time.
    pub fn witness(&self) -> &MerkleWitness {
        match self {
            Self::Create { witness, .. } | Self::Claim { witness, .. } => witness,
        }
    }

    /// Digest chained into the cursor: tag byte plus the invoice digest.
    pub fn digest(&self) -> Digest {
        let mut bytes = [0u8; 33];
        bytes[0] = self.tag();
        bytes[1..].copy_from_slice(self.invoice().hash().as_bytes());
        leaf_hash(&bytes)
    }
}

/// A position in the action log: the digest chain over all prior actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionCursor(Digest);

impl ActionCursor {
    /// The cursor of an empty log.
    pub fn genesis() -> Self {
        Self(leaf_hash(b"action-log/genesis"))
    }

    /// The cursor after one more action.
    fn advance(&self, action: &InvoiceAction) -> Self {
        Self(node_hash(&self.0, &action.digest()))
    }

    /// The cursor's digest value (the anchor-published form).
    pub fn digest(&self) -> &Digest {
        &self.0
    }
}

impl std::fmt::Display for ActionCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A group of actions dispatched atomically together.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionBatch {
    actions: Vec<InvoiceAction>,
    /// Cursor after the batch's last action.
    end: ActionCursor,
}

/// The append-only, globally ordered action log.
#[derive(Debug, Clone)]
pub struct ActionLog {
    batches: Vec<ActionBatch>,
    head: ActionCursor,
    /// Batch-boundary cursors → index of the first batch after them.
    boundaries: HashMap<Digest, usize>,
}

impl ActionLog {
    /// An empty log positioned at the genesis cursor.
    pub fn new() -> Self {
        let head = ActionCursor::genesis();
        let mut boundaries = HashMap::new();
        boundaries.insert(*head.digest(), 0);
        Self {
            batches: Vec::new(),
            head,
            boundaries,
        }
    }

    /// Append a single action as its own batch.
    pub fn dispatch(&mut self, action: InvoiceAction) -> ActionCursor {
        self.dispatch_batch(vec![action])
    }

    /// Append a group of actions as one atomic batch.
    ///
    /// An empty group appends nothing and returns the unchanged head.
    pub fn dispatch_batch(&mut self, actions: Vec<InvoiceAction>) -> ActionCursor {
        if actions.is_empty() {
            return self.head;
        }
        let end = actions
            .iter()
            .fold(self.head, |cursor, action| cursor.advance(action));
        debug!(
            batch = self.batches.len(),
            actions = actions.len(),
            cursor = %end,
            "dispatched action batch"
        );
        self.batches.push(ActionBatch { actions, end });
        self.boundaries.insert(*end.digest(), self.batches.len());
        self.head = end;
        end
    }

    /// The cursor after the last dispatched action.
    pub fn head_cursor(&self) -> ActionCursor {
        self.head
    }

    /// Total number of dispatched actions.
    pub fn action_count(&self) -> usize {
        self.batches.iter().map(|b| b.actions.len()).sum()
    }

    /// The ordered batches dispatched after `from`, up to the head.
    ///
    /// # Errors
    ///
    /// `UnknownCursor` if `from` is not a batch boundary of this log.
    pub fn actions_from(&self, from: &ActionCursor) -> Result<ActionRange<'_>, LedgerError> {
        self.actions_between(from, &self.head)
    }

    /// The ordered batches in the explicit `[from, to)` snapshot.
    ///
    /// # Errors
    ///
    /// `UnknownCursor` if either cursor is not a batch boundary, or if `to`
    /// precedes `from` in dispatch order.
    pub fn actions_between(
        &self,
        from: &ActionCursor,
        to: &ActionCursor,
    ) -> Result<ActionRange<'_>, LedgerError> {
        let start = self.boundary(from)?;
        let end = self.boundary(to)?;
        if start > end {
            return Err(LedgerError::UnknownCursor {
                cursor: *to.digest(),
            });
        }
        Ok(ActionRange {
            batches: &self.batches[start..end],
            start: *from,
        })
    }

    fn boundary(&self, cursor: &ActionCursor) -> Result<usize, LedgerError> {
        self.boundaries
            .get(cursor.digest())
            .copied()
            .ok_or(LedgerError::UnknownCursor {
                cursor: *cursor.digest(),
            })
    }
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A read-only, cursor-delimited snapshot of the log.
///
/// Appends past the snapshot's end never affect it; the delimiters were
/// fixed when the range was taken.
#[derive(Debug, Clone, Copy)]
pub struct ActionRange<'a> {
    batches: &'a [ActionBatch],
    start: ActionCursor,
}

impl<'a> ActionRange<'a> {
    /// Whether the range holds no actions.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Number of actions in the range.
    pub fn action_count(&self) -> usize {
        self.batches.iter().map(|b| b.actions.len()).sum()
    }

    /// The cursor after the range's last action (the fold's resumption
    /// token); the range's start if the range is empty.
    pub fn end_cursor(&self) -> ActionCursor {
        self.batches.last().map_or(self.start, |b| b.end)
    }

    /// Iterate actions in batch order, then within-batch dispatch order.
    pub fn iter(&self) -> impl Iterator<Item = &'a InvoiceAction> {
        self.batches.iter().flat_map(|b| b.actions.iter())
    }

    /// Strict left fold over the range.
    ///
    /// `combine` must be pure; the fold never mutates the log, so any
    /// number of folds with different accumulator types can be evaluated
    /// over the same range and will all observe the same order.
    pub fn reduce<A>(
        &self,
        initial: A,
        mut combine: impl FnMut(A, &InvoiceAction) -> A,
    ) -> (A, ActionCursor) {
        let mut acc = initial;
        for action in self.iter() {
            acc = combine(acc, action);
        }
        (acc, self.end_cursor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::sample_invoice;
    use ivl_crypto::SparseMerkleTree;

    fn create_action(amount: u32) -> InvoiceAction {
        let tree = SparseMerkleTree::new(3).unwrap();
        InvoiceAction::Create {
            invoice: sample_invoice(amount),
            witness: tree.witness(0).unwrap(),
        }
    }

    fn claim_action(amount: u32) -> InvoiceAction {
        let tree = SparseMerkleTree::new(3).unwrap();
        InvoiceAction::Claim {
            invoice: sample_invoice(amount),
            witness: tree.witness(0).unwrap(),
        }
    }

    #[test]
    fn test_cursor_chain_is_order_sensitive() {
        let a = create_action(1);
        let b = create_action(2);

        let mut log1 = ActionLog::new();
        log1.dispatch(a.clone());
        log1.dispatch(b.clone());

        let mut log2 = ActionLog::new();
        log2.dispatch(b);
        log2.dispatch(a);

        assert_ne!(log1.head_cursor(), log2.head_cursor());
    }

    #[test]
    fn test_action_digest_separates_create_and_claim() {
        let invoice = sample_invoice(5);
        let tree = SparseMerkleTree::new(3).unwrap();
        let create = InvoiceAction::Create {
            invoice: invoice.clone(),
            witness: tree.witness(0).unwrap(),
        };
        let claim = InvoiceAction::Claim {
            invoice,
            witness: tree.witness(0).unwrap(),
        };
        assert_ne!(create.digest(), claim.digest());
    }

    #[test]
    fn test_empty_batch_is_a_no_op() {
        let mut log = ActionLog::new();
        let head = log.dispatch_batch(Vec::new());
        assert_eq!(head, ActionCursor::genesis());
        assert_eq!(log.action_count(), 0);
    }

    #[test]
    fn test_reduce_folds_in_dispatch_order() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(1));
        log.dispatch_batch(vec![create_action(2), claim_action(3)]);
        log.dispatch(create_action(4));

        let range = log.actions_from(&ActionCursor::genesis()).unwrap();
        let (amounts, end) = range.reduce(Vec::new(), |mut acc, action| {
            acc.push(action.invoice().amount);
            acc
        });
        assert_eq!(amounts, vec![1, 2, 3, 4]);
        assert_eq!(end, log.head_cursor());
    }

    #[test]
    fn test_multiple_folds_agree_over_one_range() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(10));
        log.dispatch(claim_action(3));
        log.dispatch(create_action(5));

        let range = log.actions_from(&ActionCursor::genesis()).unwrap();

        let (creates, end1) =
            range.reduce(0u32, |n, a| if a.is_create() { n + 1 } else { n });
        let (sum, end2) = range.reduce(0u32, |n, a| {
            if a.is_create() {
                n + a.invoice().amount
            } else {
                n
            }
        });
        let (any_claim, end3) = range.reduce(false, |s, a| s || a.is_claim());

        assert_eq!(creates, 2);
        assert_eq!(sum, 15);
        assert!(any_claim);
        assert_eq!(end1, end2);
        assert_eq!(end2, end3);
    }

    #[test]
    fn test_range_is_a_snapshot() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(1));
        let mid = log.head_cursor();
        log.dispatch(create_action(2));

        // A range delimited at `mid` never sees later appends.
        let range = log.actions_between(&ActionCursor::genesis(), &mid).unwrap();
        assert_eq!(range.action_count(), 1);
        assert_eq!(range.end_cursor(), mid);

        // Resuming from `mid` sees exactly the rest.
        let rest = log.actions_from(&mid).unwrap();
        assert_eq!(rest.action_count(), 1);
        assert_eq!(rest.end_cursor(), log.head_cursor());
    }

    #[test]
    fn test_unknown_cursor_rejected() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(1));

        let foreign = ActionCursor::genesis().advance(&create_action(99));
        let err = log.actions_from(&foreign).unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCursor { .. }));
    }

    #[test]
    fn test_out_of_order_range_rejected() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(1));
        let mid = log.head_cursor();
        log.dispatch(create_action(2));

        let err = log
            .actions_between(&log.head_cursor(), &mid)
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCursor { .. }));
    }

    #[test]
    fn test_empty_range_end_cursor_is_start() {
        let mut log = ActionLog::new();
        log.dispatch(create_action(1));
        let head = log.head_cursor();

        let range = log.actions_from(&head).unwrap();
        assert!(range.is_empty());
        assert_eq!(range.end_cursor(), head);
        let (acc, end) = range.reduce(7u32, |n, _| n + 1);
        assert_eq!(acc, 7);
        assert_eq!(end, head);
    }
}
