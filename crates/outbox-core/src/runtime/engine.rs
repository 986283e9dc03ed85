// crates/outbox-core/src/runtime/engine.rs
// ============================================================================
// Module: Outbox Sync Engine
// Description: Sequential drain passes replaying queued operations in order.
// Purpose: Apply per-record retry, terminal policy, and post-pass cleanup.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`SyncEngine`] drains one queue instance: it loads pending records in FIFO
//! order, replays each with its original method, URL, headers, and body,
//! classifies the outcome, and applies the configured retry and terminal
//! policies. Records are processed sequentially to preserve submission order
//! and to avoid overwhelming a just-recovered network.
//! Invariants:
//! - At most one record is `syncing` at a time per engine.
//! - Overlapping drain invocations collapse to one pass via an atomic guard.
//! - Exactly one aggregate `SyncCompleted` event is emitted per finished pass.
//! - On replay, a non-2xx answer counts as retryable: the caller is no longer
//!   present to re-validate, a deliberate asymmetry with the first attempt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use thiserror::Error;

use crate::core::operation::QueueName;
use crate::core::operation::QueuedOperation;
use crate::core::policy::QueuePolicy;
use crate::core::policy::TerminalPolicy;
use crate::core::report::SyncEvent;
use crate::core::report::SyncReport;
use crate::interfaces::Notifier;
use crate::interfaces::QueueStore;
use crate::interfaces::ReplayTransport;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Engine Errors
// ============================================================================

/// Errors aborting a drain pass.
///
/// # Invariants
/// - Transport failures never abort a pass; they are classified per record.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The durable store failed during the pass.
    #[error("drain pass store failure: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Drain Outcome
// ============================================================================

/// Result of one drain invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// A full pass ran and produced this report.
    Completed(SyncReport),
    /// Another pass was already in progress; this invocation did nothing.
    Skipped,
}

impl DrainOutcome {
    /// Returns the report when a pass actually ran.
    #[must_use]
    pub const fn report(&self) -> Option<&SyncReport> {
        match self {
            Self::Completed(report) => Some(report),
            Self::Skipped => None,
        }
    }
}

// ============================================================================
// SECTION: Sync Engine
// ============================================================================

/// Replay engine for one queue instance.
///
/// # Invariants
/// - The engine is the only writer of status transitions for its queue.
/// - Policy divergence between queues is explicit configuration, not code.
pub struct SyncEngine {
    /// Durable store being drained.
    store: Arc<dyn QueueStore>,
    /// Transport used for replay.
    transport: Arc<dyn ReplayTransport>,
    /// Outbound signal sink for aggregate notifications.
    notifier: Arc<dyn Notifier>,
    /// Retry budget and terminal policy for this queue.
    policy: QueuePolicy,
    /// Re-entrancy guard collapsing overlapping drains to one pass.
    draining: AtomicBool,
}

impl SyncEngine {
    /// Creates an engine over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn QueueStore>,
        transport: Arc<dyn ReplayTransport>,
        notifier: Arc<dyn Notifier>,
        policy: QueuePolicy,
    ) -> Self {
        Self {
            store,
            transport,
            notifier,
            policy,
            draining: AtomicBool::new(false),
        }
    }

    /// Returns the queue namespace this engine drains.
    #[must_use]
    pub fn queue(&self) -> &QueueName {
        self.store.queue()
    }

    /// Returns the policy configured for this queue.
    #[must_use]
    pub const fn policy(&self) -> &QueuePolicy {
        &self.policy
    }

    /// Returns the number of pending records awaiting replay.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] when the store cannot be read.
    pub fn pending_count(&self) -> Result<u64, SyncError> {
        Ok(self.store.pending_count()?)
    }

    /// Runs one drain pass, or skips when a pass is already in progress.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] when the durable store fails mid-pass.
    pub fn drain(&self) -> Result<DrainOutcome, SyncError> {
        if self.draining.swap(true, Ordering::SeqCst) {
            return Ok(DrainOutcome::Skipped);
        }
        let result = self.drain_pass();
        self.draining.store(false, Ordering::SeqCst);
        result.map(DrainOutcome::Completed)
    }

    /// Replays all currently-pending records sequentially.
    fn drain_pass(&self) -> Result<SyncReport, SyncError> {
        let pending = self.store.load_pending()?;
        let mut report = SyncReport::default();
        for record in pending {
            self.replay_record(&record, &mut report)?;
        }
        self.store.delete_completed()?;
        report.pending_after = self.store.pending_count()?;
        self.emit(&SyncEvent::SyncCompleted {
            queue: self.queue().clone(),
            report,
        });
        self.emit(&SyncEvent::PendingChanged {
            queue: self.queue().clone(),
            pending: report.pending_after,
        });
        Ok(report)
    }

    /// Replays a single record and applies the outcome transitions.
    fn replay_record(
        &self,
        record: &QueuedOperation,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        // A record already at the cap is terminal without another attempt.
        if record.retry_count >= self.policy.retry.max_retries {
            self.finish_terminal(record, "retry budget exhausted")?;
            report.attempted += 1;
            report.exhausted += 1;
            return Ok(());
        }
        report.attempted += 1;
        self.store.mark_syncing(record.id)?;
        let detail = match self.transport.send(&record.request) {
            Ok(reply) if reply.is_success() => {
                self.store.mark_completed(record.id)?;
                report.synced += 1;
                return Ok(());
            }
            Ok(reply) => format!("replay rejected with status {}", reply.status),
            Err(failure) => failure.to_string(),
        };
        let next_retry = record.retry_count + 1;
        if next_retry >= self.policy.retry.max_retries {
            self.finish_terminal(record, &detail)?;
            report.exhausted += 1;
        } else {
            self.store.mark_pending_retry(record.id, next_retry, &detail)?;
            report.retried += 1;
            report.max_retry_count = report.max_retry_count.max(next_retry);
        }
        Ok(())
    }

    /// Applies the configured terminal policy to an exhausted record.
    fn finish_terminal(&self, record: &QueuedOperation, detail: &str) -> Result<(), SyncError> {
        match self.policy.terminal {
            TerminalPolicy::RetainFailed => self.store.mark_failed(record.id, detail)?,
            TerminalPolicy::PurgeOnExhaustion => self.store.delete(record.id)?,
        }
        Ok(())
    }

    /// Delivers an event, discarding sink failures.
    fn emit(&self, event: &SyncEvent) {
        // Sink failures must not abort a drain pass.
        let _ = self.notifier.notify(event);
    }
}
