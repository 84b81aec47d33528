//! # ivl-core — Foundational Types for the Invoice Verifiable Ledger
//!
//! This crate is the bedrock of IVL. Every other crate in the workspace
//! depends on `ivl-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`Digest` newtype for all commitments.** Roots, record hashes, and
//!    action-log cursors are all 32-byte digests produced through the
//!    domain-separated hashing functions in [`digest`]. No bare byte arrays.
//!
//! 2. **Domain separation.** Leaf/record digests and interior tree nodes use
//!    distinct hash domains (`0x00` / `0x01`), so a record digest can never
//!    collide with a computed interior node.
//!
//! 3. **One error hierarchy.** All guard violations across the workspace
//!    surface as [`LedgerError`] with stable kinds and enough context to
//!    reconstruct why the guard failed.
//!
//! 4. **Fixed-width time.** [`Timestamp`] is a seconds-precision UTC instant
//!    stored as a `u32`, because timestamps participate in the protocol-fixed
//!    record encoding.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ivl-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use digest::{empty_leaf, leaf_hash, node_hash, Digest};
pub use error::LedgerError;
pub use identity::InvoiceId;
pub use temporal::Timestamp;
