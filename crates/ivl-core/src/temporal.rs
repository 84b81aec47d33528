//! # Temporal Types — Fixed-Width UTC Timestamps
//!
//! Defines [`Timestamp`], a seconds-precision UTC instant stored as a `u32`
//! of Unix seconds.
//!
//! Timestamps participate in the protocol-fixed invoice encoding, so their
//! width (4 bytes, big-endian) is part of the digest contract. Sub-second
//! precision and timezone offsets are rejected by construction: the only way
//! in is whole seconds since the epoch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// A UTC instant with seconds precision, stored as Unix seconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u32);

impl Timestamp {
    /// The current UTC time, truncated to seconds.
    ///
    /// Saturates at `u32::MAX` (February 2106); the protocol encoding is
    /// 4 bytes wide.
    pub fn now() -> Self {
        let secs = Utc::now().timestamp();
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Create a timestamp from Unix seconds.
    pub fn from_unix(secs: u32) -> Self {
        Self(secs)
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`, truncating
    /// sub-seconds.
    ///
    /// # Errors
    ///
    /// Rejects instants before the epoch or beyond the `u32` range.
    pub fn from_utc(dt: DateTime<Utc>) -> Result<Self, LedgerError> {
        u32::try_from(dt.timestamp())
            .map(Self)
            .map_err(|_| LedgerError::Encoding(format!("timestamp out of u32 range: {dt}")))
    }

    /// Unix seconds.
    pub fn as_secs(&self) -> u32 {
        self.0
    }

    /// The timestamp's fixed-width (4-byte big-endian) canonical encoding.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    /// Convert to a `chrono::DateTime<Utc>` for display and arithmetic.
    pub fn to_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(i64::from(self.0), 0).unwrap_or_default()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_utc().format("%Y-%m-%dT%H:%M:%SZ"))
    }
}
