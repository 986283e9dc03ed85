// crates/outbox-cli/src/lib.rs
// ============================================================================
// Module: Outbox CLI Library
// Description: Shared helpers for the outbox command-line binary.
// Purpose: Expose the i18n catalog to the binary and its tests.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! Library surface backing the `outbox` binary. The i18n catalog lives here
//! so both the binary and integration tests can route user-facing strings
//! through the same translation layer.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod i18n;
