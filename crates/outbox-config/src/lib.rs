// crates/outbox-config/src/lib.rs
// ============================================================================
// Module: Outbox Config Library
// Description: Strict TOML configuration for the outbox runtime.
// Purpose: Expose fail-closed configuration loading and conversion.
// Dependencies: outbox-core, outbox-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! This crate loads and validates the outbox runtime configuration. All
//! settings are bounded, all failures are fatal, and accessors convert the
//! file shape into the policy and store types the runtime consumes.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::InterceptQueueConfig;
pub use config::MonitorConfig;
pub use config::OutboxConfig;
pub use config::PrimaryQueueConfig;
pub use config::RetryConfig;
pub use config::TransportConfig;
