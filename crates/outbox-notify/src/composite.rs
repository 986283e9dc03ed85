// crates/outbox-notify/src/composite.rs
// ============================================================================
// Module: Composite Notifier
// Description: Fan-out notifier delivering each event to every sink.
// Purpose: Combine UI, channel, and log notifiers behind one handle.
// Dependencies: outbox-core, std
// ============================================================================

//! ## Overview
//! [`CompositeNotifier`] fans each event out to all configured sinks.
//! Delivery is best-effort per sink: every sink is attempted even when an
//! earlier one fails, and the first failure is reported afterward.
//! [`NullNotifier`] discards everything and exists for hosts that opt out of
//! signals entirely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use outbox_core::SyncEvent;
use outbox_core::interfaces::Notifier;
use outbox_core::interfaces::NotifyError;

// ============================================================================
// SECTION: Composite Notifier
// ============================================================================

/// Fan-out notifier delivering events to every configured sink.
///
/// # Invariants
/// - All sinks are attempted on every event regardless of earlier failures.
#[derive(Default)]
pub struct CompositeNotifier {
    /// Sinks receiving each event, in registration order.
    sinks: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    /// Creates an empty composite notifier.
    #[must_use]
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Adds a sink to the composite.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Returns the number of configured sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` when no sinks are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for CompositeNotifier {
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        let mut first_failure = None;
        for sink in &self.sinks {
            if let Err(err) = sink.notify(event) {
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Null Notifier
// ============================================================================

/// Notifier that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &SyncEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}
