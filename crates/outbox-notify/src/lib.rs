// crates/outbox-notify/src/lib.rs
// ============================================================================
// Module: Outbox Notify Library
// Description: Notifier implementations for queue lifecycle signals.
// Purpose: Deliver sync events to UI surfaces, channels, and logs.
// Dependencies: outbox-core, serde_json, tokio
// ============================================================================

//! ## Overview
//! This crate provides the reference [`outbox_core::Notifier`]
//! implementations. Events describe queue lifecycle changes (pending counts,
//! completed passes, reconnection) and flow outward only; no notifier may
//! influence the drain that produced the event.
//! Invariants:
//! - Notifier failures are reported through [`outbox_core::NotifyError`] and
//!   never panic.
//! - Composite delivery is best-effort per sink; one failing sink does not
//!   starve the others.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod callback;
mod channel;
mod composite;
mod log;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use callback::CallbackNotifier;
pub use channel::ChannelNotifier;
pub use composite::CompositeNotifier;
pub use composite::NullNotifier;
pub use log::LogNotifier;
