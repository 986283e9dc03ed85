// crates/outbox-core/src/lib.rs
// ============================================================================
// Module: Outbox Core Library
// Description: Public API surface for the Outbox synchronization core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Outbox core implements the offline-first mutation synchronization
//! subsystem: a durable replay queue with FIFO ordering, at-least-once
//! delivery, bounded retry, and explicit terminal policy. It is
//! backend-agnostic and integrates through explicit interfaces (store,
//! transport, connectivity, clock, notifier, scheduler) rather than reading
//! ambient host state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::BackgroundScheduler;
pub use interfaces::Clock;
pub use interfaces::ConnectivityProbe;
pub use interfaces::Notifier;
pub use interfaces::NotifyError;
pub use interfaces::QueueStore;
pub use interfaces::ReplayTransport;
pub use interfaces::ScheduleError;
pub use interfaces::StoreError;
pub use interfaces::SyncHandler;
pub use interfaces::TransportError;
pub use interfaces::TransportReply;
pub use runtime::BackgroundSyncTrigger;
pub use runtime::DrainOutcome;
pub use runtime::EnqueueError;
pub use runtime::InMemoryQueueStore;
pub use runtime::IntervalScheduler;
pub use runtime::LogicalClock;
pub use runtime::MonitorError;
pub use runtime::MutationEnqueuer;
pub use runtime::NetworkMonitor;
pub use runtime::NetworkMonitorBuilder;
pub use runtime::NetworkMonitorConfig;
pub use runtime::QueuedAck;
pub use runtime::SYNC_TASK_NAME;
pub use runtime::SubmitOutcome;
pub use runtime::SyncEngine;
pub use runtime::SyncError;
pub use runtime::SystemClock;
