// crates/outbox-notify/tests/notify.rs
// ============================================================================
// Module: Notifier Tests
// Description: Delivery behavior of the reference notifier implementations.
// Purpose: Validate callback, channel, log, composite, and null sinks.
// Dependencies: outbox-core, outbox-notify, serde_json, tokio
// ============================================================================

//! ## Overview
//! Tests the notifier implementations:
//! - Callback and channel notifiers deliver each event exactly once.
//! - Channel delivery never blocks; a full channel reports a failure.
//! - The log notifier writes one JSON line per event with a component label.
//! - The composite attempts every sink and reports the first failure.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::io;
use std::sync::Arc;
use std::sync::Mutex;

use outbox_core::Notifier;
use outbox_core::NotifyError;
use outbox_core::QueueName;
use outbox_core::SyncEvent;
use outbox_core::SyncReport;
use outbox_notify::CallbackNotifier;
use outbox_notify::ChannelNotifier;
use outbox_notify::CompositeNotifier;
use outbox_notify::LogNotifier;
use outbox_notify::NullNotifier;
use serde_json::Value;
use tokio::sync::mpsc;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// A representative pending-count event.
fn pending_event(pending: u64) -> SyncEvent {
    SyncEvent::PendingChanged {
        queue: QueueName::new("offline-writes").unwrap(),
        pending,
    }
}

/// A representative completed-pass event.
fn completed_event() -> SyncEvent {
    SyncEvent::SyncCompleted {
        queue: QueueName::new("offline-writes").unwrap(),
        report: SyncReport {
            attempted: 2,
            synced: 2,
            ..SyncReport::default()
        },
    }
}

/// Writer appending into a shared buffer for later inspection.
#[derive(Clone, Default)]
struct SharedBuffer {
    /// Accumulated output bytes.
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Returns the accumulated output as a string.
    fn contents(&self) -> String {
        String::from_utf8(self.bytes.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that fails every write.
struct BrokenWriter;

impl io::Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Notifier that fails every delivery with the given reason.
struct FailingNotifier {
    /// Reason embedded in every failure.
    reason: String,
}

impl Notifier for FailingNotifier {
    fn notify(&self, _event: &SyncEvent) -> Result<(), NotifyError> {
        Err(NotifyError::DeliveryFailed(self.reason.clone()))
    }
}

/// Notifier counting deliveries.
#[derive(Default)]
struct CountingNotifier {
    /// Number of events delivered.
    delivered: Mutex<u64>,
}

impl CountingNotifier {
    /// Returns the number of events delivered.
    fn delivered(&self) -> u64 {
        *self.delivered.lock().unwrap()
    }
}

impl Notifier for CountingNotifier {
    fn notify(&self, _event: &SyncEvent) -> Result<(), NotifyError> {
        *self.delivered.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// SECTION: Callback Notifier
// ============================================================================

#[test]
fn callback_notifier_invokes_the_handler_per_event() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let notifier = CallbackNotifier::new(move |event: &SyncEvent| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });

    notifier.notify(&pending_event(3)).unwrap();
    notifier.notify(&completed_event()).unwrap();

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], pending_event(3));
}

#[test]
fn callback_failures_surface_to_the_caller() {
    let notifier =
        CallbackNotifier::new(|_event: &SyncEvent| Err(NotifyError::DeliveryFailed("ui gone".to_string())));

    let err = notifier.notify(&pending_event(1)).unwrap_err();
    assert!(matches!(err, NotifyError::DeliveryFailed(_)));
}

// ============================================================================
// SECTION: Channel Notifier
// ============================================================================

#[tokio::test]
async fn channel_notifier_enqueues_each_event() {
    let (sender, mut receiver) = mpsc::channel(4);
    let notifier = ChannelNotifier::new(sender);

    notifier.notify(&pending_event(2)).unwrap();
    notifier.notify(&completed_event()).unwrap();

    assert_eq!(receiver.recv().await, Some(pending_event(2)));
    assert_eq!(receiver.recv().await, Some(completed_event()));
}

#[tokio::test]
async fn full_channels_fail_without_blocking() {
    let (sender, _receiver) = mpsc::channel(1);
    let notifier = ChannelNotifier::new(sender);

    notifier.notify(&pending_event(1)).unwrap();
    let err = notifier.notify(&pending_event(2)).unwrap_err();
    assert!(matches!(err, NotifyError::DeliveryFailed(_)));
}

#[tokio::test]
async fn closed_channels_report_delivery_failure() {
    let (sender, receiver) = mpsc::channel(1);
    drop(receiver);
    let notifier = ChannelNotifier::new(sender);

    let err = notifier.notify(&pending_event(1)).unwrap_err();
    assert!(matches!(err, NotifyError::DeliveryFailed(_)));
}

// ============================================================================
// SECTION: Log Notifier
// ============================================================================

#[test]
fn log_notifier_writes_one_json_line_per_event() {
    let buffer = SharedBuffer::default();
    let notifier = LogNotifier::new(buffer.clone());

    notifier.notify(&pending_event(5)).unwrap();
    notifier.notify(&completed_event()).unwrap();

    let output = buffer.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);

    let first: Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["component"], Value::String("outbox".to_string()));
    assert_eq!(first["event"]["event"], Value::String("pending_changed".to_string()));
    assert_eq!(first["event"]["pending"], Value::from(5));
}

#[test]
fn log_notifier_embeds_the_custom_component_label() {
    let buffer = SharedBuffer::default();
    let notifier = LogNotifier::with_component(buffer.clone(), "intercept");

    notifier.notify(&pending_event(1)).unwrap();

    let record: Value = serde_json::from_str(buffer.contents().lines().next().unwrap()).unwrap();
    assert_eq!(record["component"], Value::String("intercept".to_string()));
}

#[test]
fn log_write_failures_are_reported_not_swallowed() {
    let notifier = LogNotifier::new(BrokenWriter);

    let err = notifier.notify(&pending_event(1)).unwrap_err();
    assert!(matches!(err, NotifyError::LogWriteFailed(_)));
}

// ============================================================================
// SECTION: Composite Notifier
// ============================================================================

#[test]
fn composite_attempts_every_sink_despite_failures() {
    let counting = Arc::new(CountingNotifier::default());
    let composite = CompositeNotifier::new()
        .with_sink(Arc::new(FailingNotifier {
            reason: "first sink down".to_string(),
        }))
        .with_sink(Arc::clone(&counting) as Arc<_>);
    assert_eq!(composite.len(), 2);

    let err = composite.notify(&pending_event(1)).unwrap_err();
    let NotifyError::DeliveryFailed(reason) = err else {
        panic!("expected a delivery failure");
    };
    assert_eq!(reason, "first sink down", "first failure wins");
    assert_eq!(counting.delivered(), 1, "later sinks still receive the event");
}

#[test]
fn empty_composite_delivers_nothing_and_succeeds() {
    let composite = CompositeNotifier::new();
    assert!(composite.is_empty());
    composite.notify(&pending_event(1)).unwrap();
}

// ============================================================================
// SECTION: Null Notifier
// ============================================================================

#[test]
fn null_notifier_discards_every_event() {
    let notifier = NullNotifier;
    notifier.notify(&pending_event(7)).unwrap();
    notifier.notify(&completed_event()).unwrap();
}
