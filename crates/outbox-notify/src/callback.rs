// crates/outbox-notify/src/callback.rs
// ============================================================================
// Module: Callback Notifier
// Description: Callback-based notifier for synchronous delivery.
// Purpose: Invoke a user-provided function with each sync event.
// Dependencies: outbox-core, std
// ============================================================================

//! ## Overview
//! [`CallbackNotifier`] delivers events by invoking a user-supplied function.
//! Hosts embedding the queue use this to bridge events into their own UI
//! signal layer (toasts, pending badges).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use outbox_core::SyncEvent;
use outbox_core::interfaces::Notifier;
use outbox_core::interfaces::NotifyError;

// ============================================================================
// SECTION: Callback Notifier
// ============================================================================

/// Callback-based event notifier.
#[derive(Clone)]
pub struct CallbackNotifier {
    /// Handler invoked with each event.
    handler: Arc<CallbackHandler>,
}

/// Callback handler signature used by the notifier.
type CallbackHandler = dyn Fn(&SyncEvent) -> Result<(), NotifyError> + Send + Sync;

impl CallbackNotifier {
    /// Creates a callback notifier from a handler function.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&SyncEvent) -> Result<(), NotifyError> + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }
}

impl Notifier for CallbackNotifier {
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        (self.handler)(event)
    }
}
