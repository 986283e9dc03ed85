// crates/outbox-core/src/core/time.rs
// ============================================================================
// Module: Outbox Time Model
// Description: Canonical timestamp representation for queued operations.
// Purpose: Provide deterministic, replayable time values across Outbox records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Outbox uses explicit time values embedded in queued operations to keep
//! replay ordering deterministic. The core engine never reads wall-clock time
//! directly; hosts supply timestamps through the
//! [`crate::interfaces::Clock`] port.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp used for enqueue times and reconnect records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }

    /// Returns a signed ordering key for FIFO drain queries.
    ///
    /// Unix and logical values map onto the same signed axis; a queue instance
    /// is expected to use one kind consistently. Logical values beyond
    /// [`i64::MAX`] saturate.
    #[must_use]
    pub fn order_key(&self) -> i64 {
        match self {
            Self::UnixMillis(value) => *value,
            Self::Logical(value) => i64::try_from(*value).unwrap_or(i64::MAX),
        }
    }
}
