// crates/outbox-core/src/core/policy.rs
// ============================================================================
// Module: Outbox Queue Policies
// Description: Retry budgets, backoff schedule, and terminal-failure policy.
// Purpose: Make per-queue retry and exhaustion behavior explicit configuration.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Both queue instances run the same generic replay engine; what differs is
//! configuration. [`RetryPolicy`] bounds the per-record retry budget and the
//! delay between follow-up drain passes. [`TerminalPolicy`] names what happens
//! when the budget is exhausted: the primary queue retains records for
//! diagnostics, the intercept queue purges them. The divergence is an explicit
//! configuration value, never implicit behavior.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum failed attempts before an operation is terminal.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay between follow-up drain passes, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1_000;
/// Default cap on the backoff delay, in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 60_000;
/// Exponent cap applied to the backoff doubling to avoid overflow.
const MAX_BACKOFF_EXPONENT: u32 = 16;

// ============================================================================
// SECTION: Retry Policy
// ============================================================================

/// Retry budget and backoff schedule for one queue instance.
///
/// # Invariants
/// - `max_retries` bounds failed attempts per record; `0` disables retries.
/// - Backoff is deterministic: `base_delay_ms * 2^retry`, capped at
///   `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum failed attempts before the terminal policy applies.
    pub max_retries: u32,
    /// Base delay between follow-up drain passes, in milliseconds.
    pub base_delay_ms: u64,
    /// Cap on the backoff delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Returns the delay before the next drain pass for a record that has
    /// failed `retry_count` times.
    #[must_use]
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.min(MAX_BACKOFF_EXPONENT);
        let factor = 1_u64 << exponent;
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

// ============================================================================
// SECTION: Terminal Policy
// ============================================================================

/// Behavior applied when a record exhausts its retry budget.
///
/// # Invariants
/// - Labels are stable configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalPolicy {
    /// Mark the record `failed` and retain it for diagnostics.
    #[default]
    RetainFailed,
    /// Delete the record outright on exhaustion.
    PurgeOnExhaustion,
}

impl TerminalPolicy {
    /// Returns the stable configuration label for the policy.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RetainFailed => "retain_failed",
            Self::PurgeOnExhaustion => "purge_on_exhaustion",
        }
    }
}

// ============================================================================
// SECTION: Queue Policy
// ============================================================================

/// Combined policy for one queue instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueuePolicy {
    /// Retry budget and backoff schedule.
    pub retry: RetryPolicy,
    /// Exhaustion behavior.
    pub terminal: TerminalPolicy,
}
