//! # ivl-crypto — Cryptographic Machinery
//!
//! Provides the authenticated data structure and signature primitives for
//! the Invoice Verifiable Ledger:
//!
//! - **Ed25519** signing and verification for the operator, time-authority,
//!   and credit-authority principals.
//! - **Sparse Merkle tree** of fixed height with precomputed zero subtrees —
//!   the prover-side store.
//! - **Merkle witness** with a pure `calculate_root` — the verifier-side
//!   primitive the ledger and chain evaluate without tree access.
//!
//! ## Crate Policy
//!
//! - Depends only on `ivl-core` internally.
//! - No mocking of cryptographic operations in tests — all tests use real
//!   SHA-256 and real Ed25519.
//! - `unsafe` prohibited.

pub mod ed25519;
pub mod smt;
pub mod witness;

pub use ed25519::{Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
pub use smt::{empty_root, SparseMerkleTree};
pub use witness::{MerkleWitness, WitnessNode};
