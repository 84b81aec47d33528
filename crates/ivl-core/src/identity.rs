//! # Invoice Identifiers
//!
//! Newtype wrapper for invoice identifiers. The wrapper prevents bare UUIDs
//! from leaking through signatures, and pins the identifier's 16-byte
//! contribution to the protocol-fixed record encoding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    /// Generate a new random invoice identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// The identifier's fixed-width (16-byte) canonical encoding.
    pub fn to_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invoice:{}", self.0)
    }
}
