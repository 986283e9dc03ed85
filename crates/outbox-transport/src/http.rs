// crates/outbox-transport/src/http.rs
// ============================================================================
// Module: HTTP Replay Transport
// Description: Blocking HTTP transport issuing writes with their original shape.
// Purpose: Dispatch immediate attempts and queue replays with strict limits.
// Dependencies: outbox-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`HttpReplayTransport`] sends write requests exactly as captured: original
//! method, URL, headers, and body. It enforces scheme restrictions, an
//! optional host allowlist, redirects disabled, bounded response bodies, and
//! a mandatory per-attempt timeout so a hung request can never stall the
//! sequential drain indefinitely.
//! Invariants:
//! - A reachable server's 4xx/5xx answer is returned as a reply, never as a
//!   transport error; only absent responses become errors.
//! - Requests rejected before I/O surface as `Invalid` and are never retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Read;
use std::time::Duration;

use outbox_core::WriteMethod;
use outbox_core::WriteRequest;
use outbox_core::interfaces::ReplayTransport;
use outbox_core::interfaces::TransportError;
use outbox_core::interfaces::TransportReply;
use reqwest::Method;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default per-attempt timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
/// Default maximum response size in bytes.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Configuration for the HTTP replay transport.
///
/// # Invariants
/// - `allow_http = false` blocks cleartext `http://` URLs.
/// - `timeout_ms` applies to the full request lifecycle of every attempt.
/// - If `allowed_hosts` is set, only listed hosts are permitted.
/// - Response bodies beyond `max_response_bytes` are truncated; the status
///   code always arrives intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTransportConfig {
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size retained, in bytes.
    pub max_response_bytes: usize,
    /// Optional host allowlist.
    pub allowed_hosts: Option<BTreeSet<String>>,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            allowed_hosts: None,
            user_agent: "outbox/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Build Errors
// ============================================================================

/// Errors raised while assembling the transport.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TransportBuildError {
    /// The underlying HTTP client could not be constructed.
    #[error("http client build failed: {0}")]
    Client(String),
}

// ============================================================================
// SECTION: Transport Implementation
// ============================================================================

/// Blocking HTTP transport for immediate attempts and queue replay.
///
/// # Invariants
/// - Redirects are never followed; a redirect answer returns its 3xx status.
pub struct HttpReplayTransport {
    /// Shared blocking client with the configured timeout.
    client: Client,
    /// Transport policy configuration.
    config: HttpTransportConfig,
}

impl HttpReplayTransport {
    /// Creates a transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportBuildError`] when the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportBuildError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|err| TransportBuildError::Client(err.to_string()))?;
        Ok(Self { client, config })
    }

    /// Validates the URL against scheme and host policy.
    fn checked_url(&self, raw: &str) -> Result<Url, TransportError> {
        let url = Url::parse(raw).map_err(|err| TransportError::Invalid(err.to_string()))?;
        match url.scheme() {
            "https" => {}
            "http" if self.config.allow_http => {}
            other => {
                return Err(TransportError::Invalid(format!("scheme not allowed: {other}")));
            }
        }
        if let Some(allowed) = &self.config.allowed_hosts {
            let host = url.host_str().unwrap_or_default();
            if !allowed.contains(host) {
                return Err(TransportError::Invalid(format!("host not allowed: {host}")));
            }
        }
        Ok(url)
    }
}

/// Maps a write verb onto the client method type.
const fn method_of(method: WriteMethod) -> Method {
    match method {
        WriteMethod::Post => Method::POST,
        WriteMethod::Put => Method::PUT,
        WriteMethod::Patch => Method::PATCH,
        WriteMethod::Delete => Method::DELETE,
    }
}

/// Classifies a client error into the transport error space.
fn classify_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() || err.is_request() {
        TransportError::Invalid(err.to_string())
    } else {
        TransportError::Unreachable(err.to_string())
    }
}

impl ReplayTransport for HttpReplayTransport {
    fn send(&self, request: &WriteRequest) -> Result<TransportReply, TransportError> {
        let url = self.checked_url(&request.url)?;
        let mut builder = self
            .client
            .request(method_of(request.method), url)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let response = builder.send().map_err(|err| classify_error(&err))?;
        let status = response.status().as_u16();
        let mut body = Vec::new();
        let limit = u64::try_from(self.config.max_response_bytes).unwrap_or(u64::MAX);
        let mut bounded = response.take(limit);
        bounded
            .read_to_end(&mut body)
            .map_err(|err| TransportError::Unreachable(err.to_string()))?;
        Ok(TransportReply { status, body })
    }
}
