// crates/outbox-cli/src/main_tests.rs
// ============================================================================
// Module: Outbox CLI Unit Tests
// Description: Unit coverage for locale resolution and argument parsing.
// Purpose: Verify CLI helpers without touching stores or the network.
// Dependencies: outbox-cli
// ============================================================================

//! ## Overview
//! Unit tests for the CLI helper functions. Store and transport behavior is
//! covered by the integration tests of the owning crates.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only code uses panics for assertion failures"
)]

use outbox_cli::i18n::Locale;

use crate::EnqueueCommand;
use crate::LangArg;
use crate::MethodArg;
use crate::QueueArg;
use crate::parse_header;
use crate::read_body;
use crate::resolve_locale;

/// Builds an enqueue command with no body arguments.
fn enqueue_command() -> EnqueueCommand {
    EnqueueCommand {
        config: None,
        queue: QueueArg::Primary,
        url: "https://api.example.com/items".to_string(),
        method: MethodArg::Post,
        headers: Vec::new(),
        body_base64: None,
        body_file: None,
    }
}

#[test]
fn resolve_locale_prefers_flag_over_env() {
    let locale = resolve_locale(Some(LangArg::Es), Some("en")).expect("locale resolves");
    assert_eq!(locale, Locale::Es);
}

#[test]
fn resolve_locale_reads_env() {
    let locale = resolve_locale(None, Some("es-MX")).expect("locale resolves");
    assert_eq!(locale, Locale::Es);
}

#[test]
fn resolve_locale_rejects_unknown_env() {
    assert!(resolve_locale(None, Some("tlh")).is_err(), "unknown locale must fail");
}

#[test]
fn resolve_locale_defaults_to_english() {
    let locale = resolve_locale(None, None).expect("locale resolves");
    assert_eq!(locale, Locale::En);
}

#[test]
fn parse_header_splits_on_first_equals() {
    let (name, value) = parse_header("x-token=a=b").expect("header parses");
    assert_eq!(name, "x-token");
    assert_eq!(value, "a=b");
}

#[test]
fn parse_header_rejects_missing_separator() {
    assert!(parse_header("content-type").is_err(), "header without = must fail");
}

#[test]
fn parse_header_rejects_empty_name() {
    assert!(parse_header("=value").is_err(), "empty header name must fail");
}

#[test]
fn read_body_defaults_to_empty() {
    let body = read_body(&enqueue_command()).expect("empty body");
    assert!(body.is_empty());
}

#[test]
fn read_body_decodes_base64() {
    let mut command = enqueue_command();
    command.body_base64 = Some("aGVsbG8=".to_string());
    let body = read_body(&command).expect("body decodes");
    assert_eq!(body, b"hello");
}

#[test]
fn read_body_rejects_invalid_base64() {
    let mut command = enqueue_command();
    command.body_base64 = Some("not base64!".to_string());
    assert!(read_body(&command).is_err(), "invalid base64 must fail");
}

#[test]
fn read_body_rejects_conflicting_sources() {
    let mut command = enqueue_command();
    command.body_base64 = Some("aGVsbG8=".to_string());
    command.body_file = Some(std::path::PathBuf::from("body.bin"));
    assert!(read_body(&command).is_err(), "conflicting body sources must fail");
}

#[test]
fn read_body_reads_file_within_limit() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("body.bin");
    std::fs::write(&path, b"payload").expect("write body");
    let mut command = enqueue_command();
    command.body_file = Some(path);
    let body = read_body(&command).expect("body reads");
    assert_eq!(body, b"payload");
}
