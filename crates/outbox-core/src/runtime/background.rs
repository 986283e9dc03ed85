// crates/outbox-core/src/runtime/background.rs
// ============================================================================
// Module: Outbox Background Sync Trigger
// Description: Best-effort registration with the deferred-task facility.
// Purpose: Resume synchronization without the host foregrounded when possible.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`BackgroundSyncTrigger`] registers the named task
//! [`SYNC_TASK_NAME`] with the host's [`BackgroundScheduler`]. Registration is
//! a hint, not a guarantee: the platform may invoke the handler at a time of
//! its choosing, or never. Failure to register is reported once through the
//! notifier and never escalated; the network monitor's drain-on-reconnect
//! path carries the primary guarantee.
//! [`IntervalScheduler`] is a thread-based reference scheduler that invokes
//! registered handlers periodically while the connectivity probe reports
//! online, keeping one worker per task name across re-registrations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::mpsc::RecvTimeoutError;
use std::sync::mpsc::SyncSender;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::report::SyncEvent;
use crate::interfaces::BackgroundScheduler;
use crate::interfaces::ConnectivityProbe;
use crate::interfaces::Notifier;
use crate::interfaces::ScheduleError;
use crate::interfaces::SyncHandler;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Named task registered with the platform's deferred-task facility.
pub const SYNC_TASK_NAME: &str = "sync-offline-actions";

// ============================================================================
// SECTION: Background Sync Trigger
// ============================================================================

/// Best-effort supplementary sync path for the closed-tab case.
///
/// # Invariants
/// - Registration outcome is reported at most once per trigger instance.
/// - Registration failure never propagates as an error.
pub struct BackgroundSyncTrigger {
    /// Platform deferred-task port.
    scheduler: Arc<dyn BackgroundScheduler>,
    /// Outbound signal sink for the registration outcome.
    notifier: Arc<dyn Notifier>,
    /// Whether the registration outcome was already reported.
    reported: AtomicBool,
}

impl BackgroundSyncTrigger {
    /// Creates a trigger over the given scheduler port.
    #[must_use]
    pub fn new(scheduler: Arc<dyn BackgroundScheduler>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            scheduler,
            notifier,
            reported: AtomicBool::new(false),
        }
    }

    /// Requests background synchronization with the given handler.
    ///
    /// Best-effort: a declined registration is reported through the notifier
    /// and otherwise ignored.
    pub fn request(&self, handler: SyncHandler) {
        let outcome = self.scheduler.register(SYNC_TASK_NAME, handler);
        if self.reported.swap(true, Ordering::SeqCst) {
            return;
        }
        let event = match outcome {
            Ok(()) => SyncEvent::BackgroundSync {
                registered: true,
                reason: None,
            },
            Err(declined) => SyncEvent::BackgroundSync {
                registered: false,
                reason: Some(declined.to_string()),
            },
        };
        // Sink failures are not escalated on this best-effort path.
        let _ = self.notifier.notify(&event);
    }
}

// ============================================================================
// SECTION: Interval Scheduler
// ============================================================================

/// Control messages for scheduler worker threads.
enum WorkerControl {
    /// Stop the worker loop.
    Stop,
}

/// Handle for one spawned worker thread.
struct Worker {
    /// Task name this worker serves.
    task_name: String,
    /// Stop-channel sender for the worker loop.
    control: SyncSender<WorkerControl>,
    /// Join handle for shutdown.
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Stops the worker loop and waits for the thread to exit.
    fn stop(&mut self) {
        let _ = self.control.try_send(WorkerControl::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Thread-based reference scheduler invoking handlers on an interval.
///
/// # Invariants
/// - Handlers run only while the probe reports online.
/// - Exactly one worker runs per task name; re-registering a name replaces
///   its worker and handler.
/// - Worker threads stop when the scheduler is dropped.
pub struct IntervalScheduler {
    /// Injected connectivity signal gating handler invocations.
    probe: Arc<dyn ConnectivityProbe>,
    /// Interval between handler invocations.
    interval: Duration,
    /// Spawned workers, one per task name.
    workers: Mutex<Vec<Worker>>,
}

impl IntervalScheduler {
    /// Creates a scheduler invoking handlers at the given interval.
    #[must_use]
    pub fn new(probe: Arc<dyn ConnectivityProbe>, interval: Duration) -> Self {
        Self {
            probe,
            interval,
            workers: Mutex::new(Vec::new()),
        }
    }
}

impl BackgroundScheduler for IntervalScheduler {
    fn register(&self, task_name: &str, handler: SyncHandler) -> Result<(), ScheduleError> {
        let (control, inbox) = mpsc::sync_channel::<WorkerControl>(1);
        let probe = Arc::clone(&self.probe);
        let interval = self.interval;
        let handle = thread::Builder::new()
            .name(format!("outbox-bg-{task_name}"))
            .spawn(move || {
                loop {
                    match inbox.recv_timeout(interval) {
                        Ok(WorkerControl::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {
                            if probe.is_online() {
                                handler();
                            }
                        }
                    }
                }
            })
            .map_err(|err| ScheduleError::Rejected(err.to_string()))?;
        let mut workers = self
            .workers
            .lock()
            .map_err(|_| ScheduleError::Rejected("scheduler mutex poisoned".to_string()))?;
        let replacement = Worker {
            task_name: task_name.to_string(),
            control,
            handle: Some(handle),
        };
        // Re-registering a name replaces its worker; repeated reconnects must
        // never accumulate threads for the same task.
        if let Some(existing) = workers.iter_mut().find(|worker| worker.task_name == task_name) {
            existing.stop();
            *existing = replacement;
        } else {
            workers.push(replacement);
        }
        Ok(())
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        if let Ok(mut workers) = self.workers.lock() {
            for worker in workers.iter_mut() {
                worker.stop();
            }
        }
    }
}
