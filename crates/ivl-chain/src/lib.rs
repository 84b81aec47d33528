//! # ivl-chain — Signed State-Transition Chain
//!
//! Each mutation of the invoice tree becomes an explicit link in a chain:
//! a [`TransitionOutput`] describing the post-state, bound to its
//! predecessor and covered by principal signatures plus an attestation.
//! A verifier replays the chain head-to-genesis without access to the
//! operator's internal ledger.
//!
//! ## Architecture
//!
//! - **Attestation** (`attest.rs`): the [`Attestor`] trait abstracts the
//!   proving backend; [`MockAttestor`] is the deterministic transparent
//!   implementation, interchangeable at compile time with a real one.
//! - **Timestamps** (`timestamp.rs`): [`SignedActionTimestamp`] binds an
//!   action hash to a time-authority-signed instant, so the operator cannot
//!   forge creation or settlement times.
//! - **Chain** (`chain.rs`): [`ChainState`] pure create/claim transitions,
//!   and [`TransitionChain`] driving the four steps (init, set-limit,
//!   create, claim) with their signature gates.
//!
//! ## Crate Policy
//!
//! Depends on `ivl-core`, `ivl-crypto`, and `ivl-ledger` internally.
//! Attestation verification is synchronous; generation happens behind the
//! trait and may block without holding any chain state.

pub mod attest;
pub mod chain;
pub mod timestamp;

pub use attest::{Attestor, MockAttestor};
pub use chain::{ChainLink, ChainState, Principals, TransitionChain, TransitionOutput};
pub use timestamp::SignedActionTimestamp;
