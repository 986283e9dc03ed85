// crates/outbox-notify/src/channel.rs
// ============================================================================
// Module: Channel Notifier
// Description: Channel-based notifier for asynchronous delivery.
// Purpose: Send sync events into a Tokio mpsc channel.
// Dependencies: outbox-core, tokio
// ============================================================================

//! ## Overview
//! [`ChannelNotifier`] delivers events by sending them into a
//! `tokio::sync::mpsc` channel. Delivery never blocks: a full or closed
//! channel surfaces as a delivery failure the caller is free to discard.
//! Invariants:
//! - Each successful delivery enqueues exactly one event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use outbox_core::SyncEvent;
use outbox_core::interfaces::Notifier;
use outbox_core::interfaces::NotifyError;
use tokio::sync::mpsc::Sender;

// ============================================================================
// SECTION: Channel Notifier
// ============================================================================

/// Channel-based event notifier.
///
/// # Invariants
/// - Delivery uses `try_send` and never waits on channel capacity.
#[derive(Debug)]
pub struct ChannelNotifier {
    /// Sender used to dispatch events.
    sender: Sender<SyncEvent>,
}

impl ChannelNotifier {
    /// Creates a channel notifier over the given sender.
    #[must_use]
    pub fn new(sender: Sender<SyncEvent>) -> Self {
        Self { sender }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        self.sender
            .try_send(event.clone())
            .map_err(|err| NotifyError::DeliveryFailed(err.to_string()))
    }
}
