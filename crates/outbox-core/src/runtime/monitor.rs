// crates/outbox-core/src/runtime/monitor.rs
// ============================================================================
// Module: Outbox Network Monitor
// Description: Debounced connectivity tracking driving drain-on-reconnect.
// Purpose: Turn verified offline-to-online transitions into drain passes.
// Dependencies: crate::core, crate::interfaces, crate::runtime::engine
// ============================================================================

//! ## Overview
//! [`NetworkMonitor`] polls an injected [`ConnectivityProbe`] from a worker
//! thread and maintains the single authoritative `is_online` boolean. A
//! transition to online must hold stable for the configured debounce window
//! before side effects run: every registered engine is drained, the
//! background sync trigger is kicked as a secondary best-effort path, and a
//! short-lived "just reconnected" flag is set for the UI banner. A transition
//! to offline only flips the boolean; in-flight requests are left to fail
//! naturally into the enqueuer's queueing path.
//! Invariants:
//! - Duplicate online signals during a drain collapse into one pass (the
//!   engine guard holds).
//! - When a pass leaves retryable records, a follow-up pass is scheduled
//!   after the policy backoff delay.

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
use std::time::Instant;

use thiserror::Error;

use crate::core::report::SyncEvent;
use crate::interfaces::Clock;
use crate::interfaces::ConnectivityProbe;
use crate::interfaces::Notifier;
use crate::interfaces::SyncHandler;
use crate::runtime::background::BackgroundSyncTrigger;
use crate::runtime::engine::DrainOutcome;
use crate::runtime::engine::SyncEngine;
use crate::runtime::engine::SyncError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Timing configuration for the network monitor.
///
/// # Invariants
/// - All values are milliseconds; bounds validation belongs to the config
///   layer, not this struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkMonitorConfig {
    /// Interval between probe polls.
    pub poll_interval_ms: u64,
    /// How long an online indication must hold before it counts.
    pub debounce_ms: u64,
    /// Lifetime of the "just reconnected" flag.
    pub reconnect_flag_ms: u64,
}

impl Default for NetworkMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            debounce_ms: 2_000,
            reconnect_flag_ms: 5_000,
        }
    }
}

// ============================================================================
// SECTION: Monitor Errors
// ============================================================================

/// Errors raised while assembling or starting the monitor.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No connectivity probe was configured.
    #[error("network monitor requires a connectivity probe")]
    MissingProbe,
    /// No engines were registered to drain.
    #[error("network monitor requires at least one sync engine")]
    NoEngines,
    /// No notifier was configured.
    #[error("network monitor requires a notifier")]
    MissingNotifier,
    /// No clock was configured.
    #[error("network monitor requires a clock")]
    MissingClock,
    /// The worker thread could not be spawned.
    #[error("network monitor spawn failed: {0}")]
    Spawn(String),
}

// ============================================================================
// SECTION: Shared State
// ============================================================================

/// Control messages for the monitor worker thread.
enum MonitorControl {
    /// Stop the worker loop.
    Stop,
}

/// State shared between the monitor handle and its worker thread.
struct MonitorShared {
    /// Injected connectivity signal.
    probe: Arc<dyn ConnectivityProbe>,
    /// Engines drained on reconnect, in registration order.
    engines: Vec<Arc<SyncEngine>>,
    /// Outbound signal sink.
    notifier: Arc<dyn Notifier>,
    /// Time source for reconnect records.
    clock: Arc<dyn Clock>,
    /// Optional supplementary background path.
    background: Option<Arc<BackgroundSyncTrigger>>,
    /// Handler handed to the background scheduler on reconnect.
    handler: SyncHandler,
    /// Single authoritative connectivity boolean.
    online: AtomicBool,
    /// Expiry of the "just reconnected" flag.
    reconnected_until: Mutex<Option<Instant>>,
    /// Timing configuration.
    config: NetworkMonitorConfig,
}

impl MonitorShared {
    /// Drains every engine and returns when a follow-up pass is due.
    fn drain_all(&self, now: Instant) -> Option<Instant> {
        let mut follow_up: Option<Duration> = None;
        for engine in &self.engines {
            let report = match engine.drain() {
                Ok(DrainOutcome::Completed(report)) => report,
                Ok(DrainOutcome::Skipped) => continue,
                Err(failure) => {
                    let event = SyncEvent::SyncFailed {
                        queue: engine.queue().clone(),
                        reason: failure.to_string(),
                    };
                    // A store failure aborts one queue's pass, not the monitor.
                    let _ = self.notifier.notify(&event);
                    continue;
                }
            };
            if report.has_retryable() {
                let delay = engine.policy().retry.backoff_delay(report.max_retry_count);
                follow_up = Some(follow_up.map_or(delay, |current| current.max(delay)));
            }
        }
        follow_up.map(|delay| now + delay)
    }

    /// Applies the verified offline-to-online transition side effects.
    fn mark_reconnected(&self, now: Instant) {
        self.online.store(true, Ordering::SeqCst);
        if let Ok(mut guard) = self.reconnected_until.lock() {
            *guard = Some(now + Duration::from_millis(self.config.reconnect_flag_ms));
        }
        let event = SyncEvent::Reconnected {
            at: self.clock.now(),
        };
        // Sink failures never gate reconnect handling.
        let _ = self.notifier.notify(&event);
        if let Some(trigger) = &self.background {
            trigger.request(Arc::clone(&self.handler));
        }
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for a network monitor.
///
/// # Invariants
/// - `start` succeeds only with a probe and at least one engine.
pub struct NetworkMonitorBuilder {
    /// Injected connectivity signal.
    probe: Option<Arc<dyn ConnectivityProbe>>,
    /// Engines drained on reconnect.
    engines: Vec<Arc<SyncEngine>>,
    /// Outbound signal sink.
    notifier: Option<Arc<dyn Notifier>>,
    /// Time source for reconnect records.
    clock: Option<Arc<dyn Clock>>,
    /// Optional supplementary background path.
    background: Option<Arc<BackgroundSyncTrigger>>,
    /// Timing configuration.
    config: NetworkMonitorConfig,
}

impl NetworkMonitorBuilder {
    /// Sets the connectivity probe.
    #[must_use]
    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Registers an engine to drain on reconnect.
    #[must_use]
    pub fn engine(mut self, engine: Arc<SyncEngine>) -> Self {
        self.engines.push(engine);
        self
    }

    /// Sets the outbound signal sink.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Sets the time source.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Attaches the supplementary background sync trigger.
    #[must_use]
    pub fn background(mut self, trigger: Arc<BackgroundSyncTrigger>) -> Self {
        self.background = Some(trigger);
        self
    }

    /// Overrides the timing configuration.
    #[must_use]
    pub const fn config(mut self, config: NetworkMonitorConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the monitor and starts its worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError`] when required collaborators are missing or
    /// the worker thread cannot be spawned.
    pub fn start(self) -> Result<NetworkMonitor, MonitorError> {
        let probe = self.probe.ok_or(MonitorError::MissingProbe)?;
        if self.engines.is_empty() {
            return Err(MonitorError::NoEngines);
        }
        let notifier = self.notifier.ok_or(MonitorError::MissingNotifier)?;
        let clock = self.clock.ok_or(MonitorError::MissingClock)?;
        let engines = self.engines;
        let handler_engines = engines.clone();
        let handler: SyncHandler = Arc::new(move || {
            for engine in &handler_engines {
                // Background invocations are best-effort.
                let _ = engine.drain();
            }
        });
        let online = probe.is_online();
        let shared = Arc::new(MonitorShared {
            probe,
            engines,
            notifier,
            clock,
            background: self.background,
            handler,
            online: AtomicBool::new(online),
            reconnected_until: Mutex::new(None),
            config: self.config,
        });
        NetworkMonitor::spawn(shared)
    }
}

// ============================================================================
// SECTION: Network Monitor
// ============================================================================

/// Connectivity monitor driving drain-on-reconnect.
///
/// # Invariants
/// - The worker thread stops when `stop` is called or the handle drops.
pub struct NetworkMonitor {
    /// State shared with the worker thread.
    shared: Arc<MonitorShared>,
    /// Stop-channel sender for the worker loop.
    control: SyncSender<MonitorControl>,
    /// Join handle for shutdown.
    handle: Option<JoinHandle<()>>,
}

impl NetworkMonitor {
    /// Returns a builder with default timing configuration.
    #[must_use]
    pub fn builder() -> NetworkMonitorBuilder {
        NetworkMonitorBuilder {
            probe: None,
            engines: Vec::new(),
            notifier: None,
            clock: None,
            background: None,
            config: NetworkMonitorConfig::default(),
        }
    }

    /// Spawns the polling worker over shared state.
    fn spawn(shared: Arc<MonitorShared>) -> Result<Self, MonitorError> {
        let (control, inbox) = mpsc::sync_channel::<MonitorControl>(1);
        let worker_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("outbox-monitor".to_string())
            .spawn(move || Self::run(&worker_shared, &inbox))
            .map_err(|err| MonitorError::Spawn(err.to_string()))?;
        Ok(Self {
            shared,
            control,
            handle: Some(handle),
        })
    }

    /// Worker loop: poll, debounce, and dispatch transition side effects.
    fn run(shared: &MonitorShared, inbox: &mpsc::Receiver<MonitorControl>) {
        let poll = Duration::from_millis(shared.config.poll_interval_ms);
        let debounce = Duration::from_millis(shared.config.debounce_ms);
        let mut candidate_since: Option<Instant> = None;
        let mut retry_at: Option<Instant> = None;
        loop {
            match inbox.recv_timeout(poll) {
                Ok(MonitorControl::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    let observed = shared.probe.is_online();
                    let was_online = shared.online.load(Ordering::SeqCst);
                    if observed && was_online {
                        candidate_since = None;
                        if retry_at.is_some_and(|due| due <= now) {
                            retry_at = shared.drain_all(now);
                        }
                    } else if observed {
                        let since = *candidate_since.get_or_insert(now);
                        if now.duration_since(since) >= debounce {
                            candidate_since = None;
                            shared.mark_reconnected(now);
                            retry_at = shared.drain_all(now);
                        }
                    } else {
                        candidate_since = None;
                        retry_at = None;
                        if was_online {
                            shared.online.store(false, Ordering::SeqCst);
                        }
                    }
                }
            }
        }
    }

    /// Returns the single authoritative connectivity boolean.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.shared.online.load(Ordering::SeqCst)
    }

    /// Returns whether the transient reconnect flag is still set.
    #[must_use]
    pub fn just_reconnected(&self) -> bool {
        self.shared
            .reconnected_until
            .lock()
            .ok()
            .and_then(|guard| *guard)
            .is_some_and(|until| Instant::now() < until)
    }

    /// Runs the explicit manual-sync path on the caller's thread.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when a store failure aborts one of the passes.
    pub fn trigger_sync(&self) -> Result<Vec<DrainOutcome>, SyncError> {
        let mut outcomes = Vec::with_capacity(self.shared.engines.len());
        for engine in &self.shared.engines {
            outcomes.push(engine.drain()?);
        }
        Ok(outcomes)
    }

    /// Stops the worker thread and waits for it to exit.
    pub fn stop(&mut self) {
        let _ = self.control.try_send(MonitorControl::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
