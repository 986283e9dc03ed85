// crates/outbox-core/src/core/operation.rs
// ============================================================================
// Module: Outbox Queued Operation Model
// Description: Canonical queued write operation and its status state machine.
// Purpose: Provide stable, serializable types for durable queue records.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A [`QueuedOperation`] is the unit of durable state: one write request the
//! client could not deliver, captured with enough fidelity to replay it
//! byte-for-byte later. Records move through the
//! [`OperationStatus`] state machine
//! (`Pending -> Syncing -> {Completed | Pending | Failed}`) and are only ever
//! mutated by the owning drain pass.
//! Invariants:
//! - `retry_count` only increases.
//! - Replay order is FIFO by `created_at`, ties broken by `id`.
//! - `id` is local identity only and is never sent to the server.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Store-assigned identifier for a queued operation.
///
/// # Invariants
/// - Assigned monotonically by the durable store; never reused.
/// - Local identity only; never part of the replayed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(i64);

impl OperationId {
    /// Creates an operation identifier from a raw store key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw store key.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Storage namespace identifier for a queue instance.
///
/// # Invariants
/// - Lowercase alphanumeric plus `-` and `_`, 1 to 64 characters.
/// - Distinct names denote independent stores with no cross-queue ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueName(String);

/// Maximum length of a queue name.
const MAX_QUEUE_NAME_LENGTH: usize = 64;

impl QueueName {
    /// Creates a validated queue name.
    ///
    /// # Errors
    ///
    /// Returns [`QueueNameError`] when the name is empty, overlong, or
    /// contains characters outside `[a-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, QueueNameError> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_QUEUE_NAME_LENGTH {
            return Err(QueueNameError::Length(name.len()));
        }
        if !name
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
        {
            return Err(QueueNameError::Charset(name));
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors produced by queue name validation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum QueueNameError {
    /// Name length is outside the accepted range.
    #[error("queue name length {0} is outside 1..=64")]
    Length(usize),
    /// Name contains characters outside the accepted set.
    #[error("queue name contains invalid characters: {0}")]
    Charset(String),
}

// ============================================================================
// SECTION: Write Requests
// ============================================================================

/// Mutating HTTP verb carried by a queued operation.
///
/// # Invariants
/// - Only write verbs are representable; reads are never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WriteMethod {
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
}

impl WriteMethod {
    /// Returns the canonical wire label for the verb.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Parses a stored wire label back into a verb.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for WriteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write request descriptor captured for immediate dispatch or replay.
///
/// # Invariants
/// - Replay issues exactly this method, URL, header set, and body.
/// - The body is opaque to the queue; idempotency belongs to caller/server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Absolute request URL.
    pub url: String,
    /// Mutating HTTP verb.
    pub method: WriteMethod,
    /// Header map; insertion order is irrelevant.
    pub headers: BTreeMap<String, String>,
    /// Serialized payload bytes.
    pub body: Vec<u8>,
}

impl WriteRequest {
    /// Creates a request with no headers and an empty body.
    #[must_use]
    pub const fn new(url: String, method: WriteMethod) -> Self {
        Self {
            url,
            method,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Adds a header to the request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replaces the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

// ============================================================================
// SECTION: Operation Status
// ============================================================================

/// Lifecycle status of a queued operation.
///
/// # Invariants
/// - Transitions follow `Pending -> Syncing -> {Completed | Pending | Failed}`.
/// - Labels are stable storage values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Eligible for the next drain pass.
    Pending,
    /// Currently being replayed by a drain pass.
    Syncing,
    /// Replay succeeded; eligible for deletion.
    Completed,
    /// Retry budget exhausted; retained for diagnostics.
    Failed,
}

impl OperationStatus {
    /// Returns the stable storage label for the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Syncing => "syncing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a stored label back into a status.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "pending" => Some(Self::Pending),
            "syncing" => Some(Self::Syncing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Queued Operation
// ============================================================================

/// A durable queued write operation.
///
/// # Invariants
/// - Created by the enqueue path at the moment a network call fails.
/// - Mutated only by the owning drain pass (status, retry count, last error).
/// - Deleted when completed, or on exhaustion under a purge policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    /// Store-assigned identifier.
    pub id: OperationId,
    /// Owning queue namespace.
    pub queue: QueueName,
    /// Captured write request.
    pub request: WriteRequest,
    /// Time the operation was first queued; defines replay order.
    pub created_at: Timestamp,
    /// Failed replay attempts so far.
    pub retry_count: u32,
    /// Lifecycle status.
    pub status: OperationStatus,
    /// Last failure message, for diagnostics only.
    pub last_error: Option<String>,
}
