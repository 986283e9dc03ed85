// crates/outbox-core/src/runtime/enqueuer.rs
// ============================================================================
// Module: Outbox Mutation Enqueuer
// Description: Write path attempting immediate delivery with durable fallback.
// Purpose: Turn unreachable-network failures into queued acknowledgments.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`MutationEnqueuer`] is the write path used by application code. It
//! attempts the request immediately; on a 2xx it returns the server reply and
//! writes no durable state. When the network is unreachable it persists a
//! pending [`crate::core::QueuedOperation`] and returns a queued
//! acknowledgment instead of an error, so callers can show optimistic
//! feedback. A reachable server answering 4xx/5xx is surfaced as a rejection
//! and never queued: retrying a rejected request unchanged is not expected to
//! succeed.
//! Invariants:
//! - Rejected writes never reach the durable store.
//! - Store unavailability degrades explicitly: the original transport failure
//!   is surfaced to the caller, never silently swallowed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::operation::OperationId;
use crate::core::operation::QueueName;
use crate::core::operation::WriteRequest;
use crate::core::report::SyncEvent;
use crate::core::time::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::Notifier;
use crate::interfaces::QueueStore;
use crate::interfaces::ReplayTransport;
use crate::interfaces::StoreError;
use crate::interfaces::TransportError;
use crate::interfaces::TransportReply;

// ============================================================================
// SECTION: Enqueuer Errors
// ============================================================================

/// Errors surfaced to callers of the write path.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Rejected` carries the real server answer so form/UI code can show it.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// A reachable server rejected the write; not queued.
    #[error("server rejected write with status {status}")]
    Rejected {
        /// HTTP status returned by the server.
        status: u16,
        /// Response body with the rejection detail.
        body: Vec<u8>,
    },
    /// The request was invalid before any I/O.
    #[error("invalid write request: {0}")]
    Invalid(String),
    /// Transport failed and the durable queue was unavailable.
    #[error("write unreachable and not queued: {transport}; store: {store}")]
    QueueUnavailable {
        /// The original transport failure.
        transport: String,
        /// Why the durable store declined the fallback.
        store: String,
    },
    /// The durable store failed while persisting the fallback record.
    #[error("queue fallback failed: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Submit Outcome
// ============================================================================

/// Acknowledgment returned when a write was accepted into the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedAck {
    /// Identifier of the persisted record.
    pub id: OperationId,
    /// Queue namespace holding the record.
    pub queue: QueueName,
    /// Time the operation was queued.
    pub created_at: Timestamp,
}

/// Result of one submit call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The server accepted the write immediately.
    Delivered(TransportReply),
    /// The write was persisted for later replay.
    Queued(QueuedAck),
}

// ============================================================================
// SECTION: Mutation Enqueuer
// ============================================================================

/// Write path with durable fallback.
///
/// # Invariants
/// - Exactly one durable record is created per queued submit.
/// - Every successful enqueue emits one event: `PendingChanged` with the
///   fresh count, or `SyncFailed` when the count cannot be read.
pub struct MutationEnqueuer {
    /// Durable queue backing the fallback path.
    store: Arc<dyn QueueStore>,
    /// Transport used for the immediate attempt.
    transport: Arc<dyn ReplayTransport>,
    /// Time source for enqueue timestamps.
    clock: Arc<dyn Clock>,
    /// Outbound signal sink for pending-count badges.
    notifier: Arc<dyn Notifier>,
}

impl MutationEnqueuer {
    /// Creates an enqueuer over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn QueueStore>,
        transport: Arc<dyn ReplayTransport>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            notifier,
        }
    }

    /// Attempts the write immediately, queueing it when the network is
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Rejected`] for non-2xx server answers,
    /// [`EnqueueError::Invalid`] for requests rejected before I/O, and
    /// [`EnqueueError::QueueUnavailable`] when both the transport and the
    /// durable store are down.
    pub fn submit(&self, request: &WriteRequest) -> Result<SubmitOutcome, EnqueueError> {
        match self.transport.send(request) {
            Ok(reply) if reply.is_success() => Ok(SubmitOutcome::Delivered(reply)),
            Ok(reply) => Err(EnqueueError::Rejected {
                status: reply.status,
                body: reply.body,
            }),
            Err(TransportError::Invalid(reason)) => Err(EnqueueError::Invalid(reason)),
            Err(failure) => self.queue_fallback(request, &failure),
        }
    }

    /// Persists the request after a transport-level failure.
    fn queue_fallback(
        &self,
        request: &WriteRequest,
        failure: &TransportError,
    ) -> Result<SubmitOutcome, EnqueueError> {
        let created_at = self.clock.now();
        match self.store.enqueue(request, created_at) {
            Ok(record) => {
                // An unreadable count is reported as a failure, never as zero.
                let event = match self.store.pending_count() {
                    Ok(pending) => SyncEvent::PendingChanged {
                        queue: record.queue.clone(),
                        pending,
                    },
                    Err(failure) => SyncEvent::SyncFailed {
                        queue: record.queue.clone(),
                        reason: failure.to_string(),
                    },
                };
                // Sink failures must not fail an accepted write.
                let _ = self.notifier.notify(&event);
                Ok(SubmitOutcome::Queued(QueuedAck {
                    id: record.id,
                    queue: record.queue,
                    created_at: record.created_at,
                }))
            }
            Err(StoreError::Unavailable(reason)) => Err(EnqueueError::QueueUnavailable {
                transport: failure.to_string(),
                store: reason,
            }),
            Err(other) => Err(other.into()),
        }
    }
}
