// crates/outbox-store-sqlite/tests/store.rs
// ============================================================================
// Module: SQLite Queue Store Tests
// Description: Durability, ordering, and transition coverage for the store.
// Purpose: Validate queue records survive reopen and obey replay order.
// Dependencies: outbox-core, outbox-store-sqlite, tempfile
// ============================================================================

//! ## Overview
//! Tests the durable store:
//! - Records survive closing and reopening the database file.
//! - `load_pending` returns records in (`created_at`, `id`) order.
//! - Status transitions persist and unknown ids report `NotFound`.
//! - Request limits and path anomalies fail closed with `Invalid`.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::path::Path;

use outbox_core::OperationId;
use outbox_core::OperationStatus;
use outbox_core::QueueName;
use outbox_core::QueueStore;
use outbox_core::StoreError;
use outbox_core::Timestamp;
use outbox_core::WriteMethod;
use outbox_core::WriteRequest;
use outbox_store_sqlite::MAX_BODY_BYTES;
use outbox_store_sqlite::MAX_URL_LENGTH;
use outbox_store_sqlite::SqliteQueueConfig;
use outbox_store_sqlite::SqliteQueueStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: Test Helpers
// ============================================================================

/// Opens a store over a database file inside the given directory.
fn open_store(dir: &Path) -> SqliteQueueStore {
    let config = SqliteQueueConfig::new(
        dir.join("outbox.sqlite3"),
        QueueName::new("offline-writes").unwrap(),
    );
    SqliteQueueStore::open(&config).unwrap()
}

/// Builds a POST request against the given path.
fn sample_request(path: &str) -> WriteRequest {
    WriteRequest::new(format!("https://api.example.com{path}"), WriteMethod::Post)
        .header("content-type", "application/json")
        .body(br#"{"op":"create"}"#.to_vec())
}

// ============================================================================
// SECTION: Durability
// ============================================================================

#[test]
fn records_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let queued = {
        let store = open_store(dir.path());
        store.enqueue(&sample_request("/a"), Timestamp::UnixMillis(1_000)).unwrap()
    };

    let store = open_store(dir.path());
    let pending = store.load_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, queued.id);
    assert_eq!(pending[0].request, sample_request("/a"));
    assert_eq!(pending[0].created_at, Timestamp::UnixMillis(1_000));
    assert_eq!(pending[0].status, OperationStatus::Pending);
}

#[test]
fn retry_state_survives_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(dir.path());
        let record = store.enqueue(&sample_request("/a"), Timestamp::UnixMillis(1)).unwrap();
        store.mark_pending_retry(record.id, 2, "server replied 503").unwrap();
    }

    let store = open_store(dir.path());
    let pending = store.load_pending().unwrap();
    assert_eq!(pending[0].retry_count, 2);
    assert_eq!(pending[0].last_error.as_deref(), Some("server replied 503"));
}

#[test]
fn logical_timestamps_round_trip_through_storage() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    store.enqueue(&sample_request("/a"), Timestamp::Logical(42)).unwrap();

    let pending = store.load_pending().unwrap();
    assert_eq!(pending[0].created_at, Timestamp::Logical(42));
}

// ============================================================================
// SECTION: Replay Order
// ============================================================================

#[test]
fn pending_records_load_in_created_at_then_id_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    // Insert out of chronological order; two records share a timestamp.
    store.enqueue(&sample_request("/late"), Timestamp::UnixMillis(300)).unwrap();
    store.enqueue(&sample_request("/early"), Timestamp::UnixMillis(100)).unwrap();
    store.enqueue(&sample_request("/tie-first"), Timestamp::UnixMillis(200)).unwrap();
    store.enqueue(&sample_request("/tie-second"), Timestamp::UnixMillis(200)).unwrap();

    let urls: Vec<String> =
        store.load_pending().unwrap().into_iter().map(|record| record.request.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://api.example.com/early".to_string(),
            "https://api.example.com/tie-first".to_string(),
            "https://api.example.com/tie-second".to_string(),
            "https://api.example.com/late".to_string(),
        ]
    );
}

// ============================================================================
// SECTION: Status Transitions
// ============================================================================

#[test]
fn status_transitions_persist_per_record() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let first = store.enqueue(&sample_request("/a"), Timestamp::UnixMillis(1)).unwrap();
    let second = store.enqueue(&sample_request("/b"), Timestamp::UnixMillis(2)).unwrap();

    store.mark_syncing(first.id).unwrap();
    store.mark_completed(first.id).unwrap();
    store.mark_syncing(second.id).unwrap();
    store.mark_failed(second.id, "retry budget exhausted").unwrap();

    assert_eq!(store.pending_count().unwrap(), 0);
    assert_eq!(store.failed_count().unwrap(), 1);
    let failed = store.load_failed().unwrap();
    assert_eq!(failed[0].id, second.id);
    assert_eq!(failed[0].last_error.as_deref(), Some("retry budget exhausted"));
}

#[test]
fn transitions_on_unknown_ids_report_not_found() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let missing = OperationId::new(999);

    assert!(matches!(store.mark_syncing(missing), Err(StoreError::NotFound(id)) if id == missing));
    assert!(matches!(store.mark_completed(missing), Err(StoreError::NotFound(_))));
    assert!(matches!(store.mark_failed(missing, "x"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete(missing), Err(StoreError::NotFound(_))));
}

#[test]
fn delete_completed_and_purge_failed_report_counts() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let first = store.enqueue(&sample_request("/a"), Timestamp::UnixMillis(1)).unwrap();
    let second = store.enqueue(&sample_request("/b"), Timestamp::UnixMillis(2)).unwrap();
    let third = store.enqueue(&sample_request("/c"), Timestamp::UnixMillis(3)).unwrap();
    store.mark_completed(first.id).unwrap();
    store.mark_completed(second.id).unwrap();
    store.mark_failed(third.id, "retry budget exhausted").unwrap();

    assert_eq!(store.delete_completed().unwrap(), 2);
    assert_eq!(store.purge_failed().unwrap(), 1);
    assert_eq!(store.delete_completed().unwrap(), 0, "second sweep finds nothing");
    assert_eq!(store.pending_count().unwrap(), 0);
    assert_eq!(store.failed_count().unwrap(), 0);
}

// ============================================================================
// SECTION: Queue Scoping
// ============================================================================

#[test]
fn queues_sharing_a_file_never_see_each_other() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shared.sqlite3");
    let primary = SqliteQueueStore::open(&SqliteQueueConfig::new(
        &path,
        QueueName::new("offline-writes").unwrap(),
    ))
    .unwrap();
    let intercept = SqliteQueueStore::open(&SqliteQueueConfig::new(
        &path,
        QueueName::new("intercepted-writes").unwrap(),
    ))
    .unwrap();

    primary.enqueue(&sample_request("/a"), Timestamp::UnixMillis(1)).unwrap();
    assert_eq!(primary.pending_count().unwrap(), 1);
    assert_eq!(intercept.pending_count().unwrap(), 0);
    assert!(intercept.load_pending().unwrap().is_empty());
}

// ============================================================================
// SECTION: Validation
// ============================================================================

#[test]
fn empty_urls_are_rejected_before_persisting() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let request = WriteRequest::new(String::new(), WriteMethod::Post);

    let err = store.enqueue(&request, Timestamp::UnixMillis(1)).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[test]
fn oversized_urls_are_rejected_before_persisting() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let url = format!("https://api.example.com/{}", "a".repeat(MAX_URL_LENGTH));
    let request = WriteRequest::new(url, WriteMethod::Post);

    let err = store.enqueue(&request, Timestamp::UnixMillis(1)).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn oversized_bodies_are_rejected_before_persisting() {
    let dir = TempDir::new().unwrap();
    let store = open_store(dir.path());
    let request = WriteRequest::new("https://api.example.com/a".to_string(), WriteMethod::Post)
        .body(vec![0_u8; MAX_BODY_BYTES + 1]);

    let err = store.enqueue(&request, Timestamp::UnixMillis(1)).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert_eq!(store.pending_count().unwrap(), 0);
}

#[test]
fn directory_paths_are_rejected() {
    let dir = TempDir::new().unwrap();
    let config = SqliteQueueConfig::new(dir.path(), QueueName::new("offline-writes").unwrap());

    let err = SqliteQueueStore::open(&config).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn unwritable_locations_report_unavailable() {
    let config = SqliteQueueConfig::new(
        "/proc/no-such-dir/outbox.sqlite3",
        QueueName::new("offline-writes").unwrap(),
    );

    let err = SqliteQueueStore::open(&config).unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
