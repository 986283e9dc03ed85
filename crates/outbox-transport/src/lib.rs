// crates/outbox-transport/src/lib.rs
// ============================================================================
// Module: Outbox Transport Library
// Description: HTTP replay transport and the boundary interceptor.
// Purpose: Expose wire-level dispatch for immediate attempts and replay.
// Dependencies: outbox-core, reqwest, serde, serde_json, url
// ============================================================================

//! ## Overview
//! This crate carries the two transport surfaces of the outbox system:
//! [`HttpReplayTransport`] issues write requests with their original shape
//! under strict scheme, host, size, and timeout policy, and
//! [`InterceptTransport`] wraps any transport to queue wire-level failures
//! into an independent durable store while returning a synthetic `202`.
//! Security posture: HTTPS-only by default, redirects disabled, bounded
//! response bodies, optional host allowlist.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod http;
mod intercept;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::DEFAULT_TIMEOUT_MS;
pub use http::HttpReplayTransport;
pub use http::HttpTransportConfig;
pub use http::TransportBuildError;
pub use intercept::ControlAck;
pub use intercept::ControlMessage;
pub use intercept::InterceptTransport;
pub use intercept::SYNTHETIC_QUEUED_STATUS;
