// crates/outbox-core/src/runtime/clock.rs
// ============================================================================
// Module: Outbox Clocks
// Description: Reference clock implementations for hosts and tests.
// Purpose: Supply wall-clock and deterministic logical time via the Clock port.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The core never reads wall-clock time directly; hosts inject a
//! [`Clock`]. [`SystemClock`] answers with unix milliseconds for production
//! hosts. [`LogicalClock`] answers with a monotonic counter so tests can
//! assert exact replay ordering without sleeping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use crate::core::time::Timestamp;
use crate::interfaces::Clock;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Wall-clock time source answering unix milliseconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
        Timestamp::UnixMillis(millis)
    }
}

// ============================================================================
// SECTION: Logical Clock
// ============================================================================

/// Deterministic monotonic time source for tests.
///
/// # Invariants
/// - Successive `now` calls return strictly increasing logical values.
#[derive(Debug, Default)]
pub struct LogicalClock {
    /// Monotonic counter backing the logical timestamps.
    counter: AtomicU64,
}

impl LogicalClock {
    /// Creates a logical clock starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        Timestamp::Logical(self.counter.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
