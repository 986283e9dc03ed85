// crates/outbox-store-sqlite/src/lib.rs
// ============================================================================
// Module: Outbox SQLite Store Library
// Description: Durable queue storage backed by SQLite.
// Purpose: Expose the SQLite-backed QueueStore implementation.
// Dependencies: outbox-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteQueueStore`], the durable
//! [`outbox_core::QueueStore`] implementation. Queued operations survive
//! process restarts; replay order and status transition semantics follow the
//! core contract exactly.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_BODY_BYTES;
pub use store::MAX_URL_LENGTH;
pub use store::SqliteJournalMode;
pub use store::SqliteQueueConfig;
pub use store::SqliteQueueStore;
pub use store::SqliteSyncMode;
