// crates/outbox-core/src/core/mod.rs
// ============================================================================
// Module: Outbox Core Types
// Description: Canonical queued-operation, policy, and report structures.
// Purpose: Provide stable, serializable types for the synchronization subsystem.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Outbox core types define the durable queue record, its status state
//! machine, retry/terminal policies, and the aggregate sync report. These
//! types are the canonical source of truth for the store schema and any
//! derived surfaces (CLI, logs, UI badges).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod operation;
pub mod policy;
pub mod report;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use operation::OperationId;
pub use operation::OperationStatus;
pub use operation::QueueName;
pub use operation::QueueNameError;
pub use operation::QueuedOperation;
pub use operation::WriteMethod;
pub use operation::WriteRequest;
pub use policy::DEFAULT_BASE_DELAY_MS;
pub use policy::DEFAULT_MAX_DELAY_MS;
pub use policy::DEFAULT_MAX_RETRIES;
pub use policy::QueuePolicy;
pub use policy::RetryPolicy;
pub use policy::TerminalPolicy;
pub use report::SyncEvent;
pub use report::SyncReport;
pub use time::Timestamp;
