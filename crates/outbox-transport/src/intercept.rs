// crates/outbox-transport/src/intercept.rs
// ============================================================================
// Module: Boundary Interceptor
// Description: Transport wrapper queueing writes that fail at the wire.
// Purpose: Catch failures outside the enqueuer's control path.
// Dependencies: outbox-core, serde, serde_json
// ============================================================================

//! ## Overview
//! [`InterceptTransport`] wraps any [`ReplayTransport`] and observes every
//! outgoing write request, including those issued by code that never touches
//! the mutation enqueuer. When the inner transport fails at the wire, the
//! request is cloned into the interceptor's own durable store (an independent
//! namespace with no ordering relation to the primary queue) and the caller
//! receives a synthetic `202 Accepted` reply, so promise-style call sites
//! resolve instead of erroring. The intercept store is drained by its own
//! engine, configured with an explicit purge-on-exhaustion terminal policy.
//! Control messages share this surface: queue clearing and version
//! activation arrive on the same channel as the interceptor's host.
//! Invariants:
//! - Requests rejected before I/O pass through as errors; only wire-level
//!   failures are queued.
//! - When the intercept store is unavailable, the original failure surfaces.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use outbox_core::SyncEvent;
use outbox_core::WriteRequest;
use outbox_core::interfaces::Clock;
use outbox_core::interfaces::Notifier;
use outbox_core::interfaces::QueueStore;
use outbox_core::interfaces::ReplayTransport;
use outbox_core::interfaces::StoreError;
use outbox_core::interfaces::TransportError;
use outbox_core::interfaces::TransportReply;
use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status code of the synthetic reply returned for queued requests.
pub const SYNTHETIC_QUEUED_STATUS: u16 = 202;

// ============================================================================
// SECTION: Control Messages
// ============================================================================

/// Control message handled on the interceptor's channel.
///
/// # Invariants
/// - Labels are stable wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Empty the intercept queue immediately.
    ClearQueue,
    /// Force-activate a new host version; acknowledged, no queue effect.
    Activate,
}

/// Acknowledgment returned for a handled control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAck {
    /// Records removed while handling the message.
    pub cleared: u64,
}

// ============================================================================
// SECTION: Intercept Transport
// ============================================================================

/// Transport wrapper queueing wire-level failures into its own store.
///
/// # Invariants
/// - Exactly one record is created per intercepted failure.
/// - Synthetic replies always carry [`SYNTHETIC_QUEUED_STATUS`].
pub struct InterceptTransport {
    /// Transport actually issuing the requests.
    inner: Arc<dyn ReplayTransport>,
    /// Durable store scoped to this interceptor.
    store: Arc<dyn QueueStore>,
    /// Time source for enqueue timestamps.
    clock: Arc<dyn Clock>,
    /// Outbound signal sink for pending-count changes.
    notifier: Arc<dyn Notifier>,
}

impl InterceptTransport {
    /// Creates an interceptor over the given collaborators.
    #[must_use]
    pub fn new(
        inner: Arc<dyn ReplayTransport>,
        store: Arc<dyn QueueStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            inner,
            store,
            clock,
            notifier,
        }
    }

    /// Handles a control message received on the interceptor's channel.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when queue clearing cannot be applied.
    pub fn handle_control(&self, message: ControlMessage) -> Result<ControlAck, StoreError> {
        match message {
            ControlMessage::ClearQueue => {
                let mut cleared = self.store.delete_completed()?;
                cleared += self.store.purge_failed()?;
                for record in self.store.load_pending()? {
                    self.store.delete(record.id)?;
                    cleared += 1;
                }
                let event = SyncEvent::PendingChanged {
                    queue: self.store.queue().clone(),
                    pending: 0,
                };
                // Sink failures never gate control handling.
                let _ = self.notifier.notify(&event);
                Ok(ControlAck { cleared })
            }
            ControlMessage::Activate => Ok(ControlAck { cleared: 0 }),
        }
    }

    /// Persists an intercepted request and synthesizes the queued reply.
    fn queue_intercepted(
        &self,
        request: &WriteRequest,
        failure: TransportError,
    ) -> Result<TransportReply, TransportError> {
        let created_at = self.clock.now();
        match self.store.enqueue(request, created_at) {
            Ok(record) => {
                let pending = self.store.pending_count().unwrap_or(0);
                let event = SyncEvent::PendingChanged {
                    queue: record.queue.clone(),
                    pending,
                };
                // Sink failures must not fail an accepted write.
                let _ = self.notifier.notify(&event);
                let ack = json!({
                    "queued": true,
                    "id": record.id,
                    "queue": record.queue.as_str(),
                });
                Ok(TransportReply {
                    status: SYNTHETIC_QUEUED_STATUS,
                    body: ack.to_string().into_bytes(),
                })
            }
            // Degraded host: surface the original wire failure unchanged.
            Err(StoreError::Unavailable(_)) => Err(failure),
            Err(other) => Err(TransportError::Unreachable(other.to_string())),
        }
    }
}

impl ReplayTransport for InterceptTransport {
    fn send(&self, request: &WriteRequest) -> Result<TransportReply, TransportError> {
        match self.inner.send(request) {
            Ok(reply) => Ok(reply),
            Err(TransportError::Invalid(reason)) => Err(TransportError::Invalid(reason)),
            Err(failure) => self.queue_intercepted(request, failure),
        }
    }
}
