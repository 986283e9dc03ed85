// crates/outbox-core/src/runtime/mod.rs
// ============================================================================
// Module: Outbox Runtime
// Description: Enqueuer, sync engine, network monitor, and background trigger.
// Purpose: Drive the offline-first write path over the interface ports.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The runtime wires the interface ports into the synchronization control
//! flow: application writes enter through [`MutationEnqueuer`], queued
//! records are replayed by [`SyncEngine`] drain passes, reconnects are
//! detected by [`NetworkMonitor`], and [`BackgroundSyncTrigger`] supplies the
//! best-effort closed-tab path.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod background;
pub mod clock;
pub mod engine;
pub mod enqueuer;
pub mod memory;
pub mod monitor;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use background::BackgroundSyncTrigger;
pub use background::IntervalScheduler;
pub use background::SYNC_TASK_NAME;
pub use clock::LogicalClock;
pub use clock::SystemClock;
pub use engine::DrainOutcome;
pub use engine::SyncEngine;
pub use engine::SyncError;
pub use enqueuer::EnqueueError;
pub use enqueuer::MutationEnqueuer;
pub use enqueuer::QueuedAck;
pub use enqueuer::SubmitOutcome;
pub use memory::InMemoryQueueStore;
pub use monitor::MonitorError;
pub use monitor::NetworkMonitor;
pub use monitor::NetworkMonitorBuilder;
pub use monitor::NetworkMonitorConfig;
