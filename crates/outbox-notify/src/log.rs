// crates/outbox-notify/src/log.rs
// ============================================================================
// Module: Log Notifier
// Description: Log-only notifier writing one JSON record per event.
// Purpose: Persist an audit trail of queue lifecycle signals.
// Dependencies: outbox-core, serde_json, std
// ============================================================================

//! ## Overview
//! `LogNotifier` writes one JSON line per event to the wrapped writer. It is
//! the structured-logging surface of the queue; hosts usually point it at
//! stderr or a log file alongside their UI-facing notifier.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::sync::Mutex;

use outbox_core::SyncEvent;
use outbox_core::interfaces::Notifier;
use outbox_core::interfaces::NotifyError;
use serde_json::json;

// ============================================================================
// SECTION: Log Notifier
// ============================================================================

/// Log-only event notifier.
pub struct LogNotifier<W: Write + Send> {
    /// Output writer for log records.
    writer: Mutex<W>,
    /// Component label embedded in every record.
    component: String,
}

impl<W: Write + Send> LogNotifier<W> {
    /// Creates a log notifier with the default component label.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            component: "outbox".to_string(),
        }
    }

    /// Creates a log notifier with a custom component label.
    pub fn with_component(writer: W, component: impl Into<String>) -> Self {
        Self {
            writer: Mutex::new(writer),
            component: component.into(),
        }
    }
}

impl<W: Write + Send> Notifier for LogNotifier<W> {
    fn notify(&self, event: &SyncEvent) -> Result<(), NotifyError> {
        let record = json!({
            "component": self.component,
            "event": event,
        });
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| NotifyError::LogWriteFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &record)
            .map_err(|err| NotifyError::LogWriteFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| NotifyError::LogWriteFailed(err.to_string()))?;
        drop(guard);
        Ok(())
    }
}
