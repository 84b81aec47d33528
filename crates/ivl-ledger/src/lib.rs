//! # ivl-ledger — The Off-Chain Invoice Ledger Engine
//!
//! The authoritative invoice state lives off-chain in a sparse Merkle tree;
//! only the root and a pair of counters are meant for publication. This
//! crate provides the engine around that tree:
//!
//! - [`invoice`] — the immutable invoice record with its protocol-fixed
//!   digest encoding, and the cart sub-ledger's hash contract.
//! - [`log`] — the append-only action log: dispatched-but-uncommitted
//!   create/claim operations, addressed by a digest-chained cursor and
//!   folded with a generic, deterministic left fold.
//! - [`account`] — the per-account state machine tying it together:
//!   guarded `create_invoice` / `claim_invoice` that only append to the log,
//!   and `commit` — the single operation that rewrites the published root.
//!
//! ## Concurrency
//!
//! One writer per account. Folds borrow the log immutably over an explicit
//! cursor-delimited snapshot, so any number of read-only checks can run over
//! the same pending range; the borrow checker keeps them from racing a
//! dispatch. Accounts share nothing with each other.

pub mod account;
pub mod invoice;
pub mod log;

pub use account::{LedgerAccount, LedgerEvent, PublishedState};
pub use invoice::{Cart, CartItem, Invoice, CART_TREE_HEIGHT, INVOICE_TREE_HEIGHT};
pub use log::{ActionCursor, ActionLog, ActionRange, InvoiceAction};
