// crates/outbox-core/src/interfaces/mod.rs
// ============================================================================
// Module: Outbox Interfaces
// Description: Backend-agnostic ports for storage, transport, and signals.
// Purpose: Define the contract surfaces used by the Outbox runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the synchronization runtime integrates with its host
//! without embedding backend-specific details: a durable queue store, an HTTP
//! replay transport, an injected connectivity probe, a clock, outbound signal
//! delivery, and the platform's deferred-background-task facility.
//! Implementations must fail closed on missing or invalid data; in
//! particular, a store that cannot be opened reports
//! [`StoreError::Unavailable`] so queueing degrades explicitly rather than
//! silently swallowing writes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::operation::OperationId;
use crate::core::operation::QueueName;
use crate::core::operation::QueuedOperation;
use crate::core::operation::WriteRequest;
use crate::core::report::SyncEvent;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Queue Store
// ============================================================================

/// Errors returned by durable queue stores.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `Unavailable` is the explicit capability signal for degraded hosts
///   (quota exceeded, storage unsupported); it must never be masked.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Durable storage is not available on this host.
    #[error("queue store unavailable: {0}")]
    Unavailable(String),
    /// Underlying database failure.
    #[error("queue store failure: {0}")]
    Db(String),
    /// No record exists with the given identifier.
    #[error("queued operation not found: {0}")]
    NotFound(OperationId),
    /// Invalid input or corrupt stored record.
    #[error("invalid queue store input: {0}")]
    Invalid(String),
}

/// Durable store holding queued write operations for one queue instance.
///
/// # Invariants
/// - `load_pending` returns records ordered by (`created_at`, `id`).
/// - Status transitions are single atomic updates keyed by record id.
/// - Only queue-owning code mutates records; observers use the count and
///   load methods.
pub trait QueueStore: Send + Sync {
    /// Returns the queue namespace this store belongs to.
    fn queue(&self) -> &QueueName;

    /// Persists a new pending operation and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the record cannot be persisted.
    fn enqueue(
        &self,
        request: &WriteRequest,
        created_at: Timestamp,
    ) -> Result<QueuedOperation, StoreError>;

    /// Loads all pending operations in replay order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn load_pending(&self) -> Result<Vec<QueuedOperation>, StoreError>;

    /// Transitions a record to `syncing`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn mark_syncing(&self, id: OperationId) -> Result<(), StoreError>;

    /// Transitions a record to `completed`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn mark_completed(&self, id: OperationId) -> Result<(), StoreError>;

    /// Returns a record to `pending` with an incremented retry count.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn mark_pending_retry(
        &self,
        id: OperationId,
        retry_count: u32,
        last_error: &str,
    ) -> Result<(), StoreError>;

    /// Transitions a record to terminal `failed`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn mark_failed(&self, id: OperationId, last_error: &str) -> Result<(), StoreError>;

    /// Deletes a single record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the record does not exist.
    fn delete(&self, id: OperationId) -> Result<(), StoreError>;

    /// Deletes all completed records and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the cleanup cannot be applied.
    fn delete_completed(&self) -> Result<u64, StoreError>;

    /// Deletes all failed records and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the purge cannot be applied.
    fn purge_failed(&self) -> Result<u64, StoreError>;

    /// Returns the number of pending records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn pending_count(&self) -> Result<u64, StoreError>;

    /// Returns the number of failed records retained for diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn failed_count(&self) -> Result<u64, StoreError>;

    /// Loads all failed records in replay order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be read.
    fn load_failed(&self) -> Result<Vec<QueuedOperation>, StoreError>;
}

// ============================================================================
// SECTION: Replay Transport
// ============================================================================

/// Errors raised when a request never produced an HTTP response.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - A reachable server answering 4xx/5xx is **not** a transport error; it is
///   an [`TransportReply`] with a non-success status.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response received: offline, DNS failure, connection refused.
    #[error("transport unreachable: {0}")]
    Unreachable(String),
    /// The per-attempt timeout elapsed before a response arrived.
    #[error("transport timeout: {0}")]
    Timeout(String),
    /// The request was rejected before any I/O (malformed URL, blocked scheme).
    #[error("invalid transport request: {0}")]
    Invalid(String),
}

/// HTTP response received from a reachable server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body, bounded by transport configuration.
    pub body: Vec<u8>,
}

impl TransportReply {
    /// Returns whether the reply carries a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Issues write requests over the network with their original shape.
pub trait ReplayTransport: Send + Sync {
    /// Sends the request and returns the server reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no HTTP response was received.
    fn send(&self, request: &WriteRequest) -> Result<TransportReply, TransportError>;
}

// ============================================================================
// SECTION: Connectivity Probe
// ============================================================================

/// Injected connectivity signal consulted by the network monitor.
///
/// # Invariants
/// - Implementations answer from host state; the runtime never reads ambient
///   globals, so probes can be simulated deterministically in tests.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns the current connectivity indication.
    fn is_online(&self) -> bool;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Supplies timestamps to the runtime.
///
/// # Invariants
/// - The runtime only reads time through this port, keeping replay ordering
///   and reconnect records deterministic under test clocks.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Errors emitted by outbound signal sinks.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Sink delivery failed.
    #[error("notify delivery failed: {0}")]
    DeliveryFailed(String),
    /// Log sink failed to write.
    #[error("notify log write failed: {0}")]
    LogWriteFailed(String),
}

/// Delivers sync events to the host.
///
/// # Invariants
/// - Delivery failures must never abort a drain pass; the runtime discards
///   sink errors after the attempt.
pub trait Notifier: Send + Sync {
    /// Delivers one event.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError>;
}

// ============================================================================
// SECTION: Background Scheduler
// ============================================================================

/// Handler invoked by a background scheduler to resume synchronization.
pub type SyncHandler = Arc<dyn Fn() + Send + Sync>;

/// Errors raised by background-task registration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The platform does not provide a deferred-task facility.
    #[error("background scheduling unsupported: {0}")]
    Unsupported(String),
    /// The platform declined the registration.
    #[error("background registration rejected: {0}")]
    Rejected(String),
}

/// Best-effort port to the platform's deferred-background-task facility.
///
/// # Invariants
/// - Registration is a hint: the platform may invoke the handler at a time of
///   its choosing, or never. Primary sync guarantees never depend on it.
pub trait BackgroundScheduler: Send + Sync {
    /// Registers a named task whose handler resumes synchronization.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] when the facility is unsupported or the
    /// registration is declined.
    fn register(&self, task_name: &str, handler: SyncHandler) -> Result<(), ScheduleError>;
}
