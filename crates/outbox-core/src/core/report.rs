// crates/outbox-core/src/core/report.rs
// ============================================================================
// Module: Outbox Sync Reports
// Description: Aggregate drain results and outbound UI-facing events.
// Purpose: Provide one notification per drain pass instead of per-item noise.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A drain pass produces exactly one [`SyncReport`] summarizing how many
//! records were replayed, retried, or exhausted. Reports and queue-state
//! changes reach the host through [`SyncEvent`] values delivered by a
//! [`crate::interfaces::Notifier`] sink; UI code observes events, it never
//! mutates the queue directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::operation::QueueName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Sync Report
// ============================================================================

/// Aggregate outcome of one drain pass.
///
/// # Invariants
/// - `attempted == synced + retried + exhausted`.
/// - `max_retry_count` is the highest retry count now carried by a record
///   returned to pending, used to schedule the follow-up pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// Records considered during the pass.
    pub attempted: u64,
    /// Records replayed successfully and deleted.
    pub synced: u64,
    /// Records returned to pending with an incremented retry count.
    pub retried: u64,
    /// Records that hit the retry cap and went terminal.
    pub exhausted: u64,
    /// Pending records remaining after the pass.
    pub pending_after: u64,
    /// Highest retry count among records returned to pending.
    pub max_retry_count: u32,
}

impl SyncReport {
    /// Returns whether the pass left retryable work behind.
    #[must_use]
    pub const fn has_retryable(&self) -> bool {
        self.retried > 0
    }
}

// ============================================================================
// SECTION: Sync Events
// ============================================================================

/// Outbound signal produced by the synchronization subsystem.
///
/// # Invariants
/// - Exactly one `SyncCompleted` is emitted per finished drain pass.
/// - Events are observations; consumers must not mutate queue state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// The number of pending records in a queue changed.
    PendingChanged {
        /// Queue whose pending count changed.
        queue: QueueName,
        /// Current pending count, for badge UI.
        pending: u64,
    },
    /// A drain pass finished with the given aggregate report.
    SyncCompleted {
        /// Queue that was drained.
        queue: QueueName,
        /// Aggregate pass outcome, for user-facing toasts.
        report: SyncReport,
    },
    /// A drain pass or a queue-state read was aborted by a store failure.
    SyncFailed {
        /// Queue whose pass or read failed.
        queue: QueueName,
        /// Failure detail for diagnostics.
        reason: String,
    },
    /// Connectivity was regained after a verified offline period.
    Reconnected {
        /// Transition time, for the transient reconnect banner.
        at: Timestamp,
    },
    /// Outcome of the best-effort background sync registration.
    BackgroundSync {
        /// Whether the platform accepted the named task.
        registered: bool,
        /// Failure detail when registration was declined.
        reason: Option<String>,
    },
}
