// crates/outbox-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Queue Store
// Description: Durable QueueStore backed by SQLite WAL.
// Purpose: Persist queued write operations across process restarts.
// Dependencies: outbox-core, rusqlite, serde, serde_json
// ============================================================================

//! ## Overview
//! This module implements the durable [`QueueStore`] port over `SQLite`.
//! Records survive page reloads and process restarts; status transitions are
//! single atomic updates keyed by record id, which is sufficient because only
//! the owning drain pass mutates a given record. Open failures map to
//! [`StoreError::Unavailable`], the explicit capability signal that lets the
//! write path degrade to pass-through instead of silently swallowing writes.
//! Invariants:
//! - Drain queries return records ordered by (`created_at`, `id`).
//! - Unknown schema versions fail closed.
//! - Distinct queue instances use distinct database files; the `queue` column
//!   additionally scopes every statement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use outbox_core::OperationId;
use outbox_core::OperationStatus;
use outbox_core::QueueName;
use outbox_core::QueuedOperation;
use outbox_core::Timestamp;
use outbox_core::WriteMethod;
use outbox_core::WriteRequest;
use outbox_core::interfaces::QueueStore;
use outbox_core::interfaces::StoreError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use serde::Deserialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the queue store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum request URL length accepted by the store.
pub const MAX_URL_LENGTH: usize = 4096;
/// Maximum serialized body size accepted by the store.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
/// Stored label for unix-millisecond timestamps.
const TIME_KIND_UNIX: &str = "unix_millis";
/// Stored label for logical timestamps.
const TIME_KIND_LOGICAL: &str = "logical";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the pragma value for the mode.
    #[must_use]
    pub const fn pragma_value(&self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
        }
    }
}

/// `SQLite` synchronous mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full durability (recommended).
    #[default]
    Full,
    /// Normal durability.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the pragma value for the mode.
    #[must_use]
    pub const fn pragma_value(&self) -> &'static str {
        match self {
            Self::Full => "FULL",
            Self::Normal => "NORMAL",
        }
    }
}

/// Configuration for opening a queue store.
///
/// # Invariants
/// - `path` must point at a file location, not a directory.
/// - `queue` scopes every statement issued by the store.
#[derive(Debug, Clone)]
pub struct SqliteQueueConfig {
    /// Database file location.
    pub path: PathBuf,
    /// Owning queue namespace.
    pub queue: QueueName,
    /// Journal mode pragma.
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode pragma.
    pub sync_mode: SqliteSyncMode,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteQueueConfig {
    /// Creates a config with recommended durability settings.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, queue: QueueName) -> Self {
        Self {
            path: path.into(),
            queue,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Durable queue store backed by `SQLite`.
///
/// # Invariants
/// - All access serializes through one connection guarded by a mutex.
/// - The store never reorders records; drain order is (`created_at`, `id`).
#[derive(Debug)]
pub struct SqliteQueueStore {
    /// Owning queue namespace.
    queue: QueueName,
    /// Guarded database connection.
    connection: Mutex<Connection>,
}

impl SqliteQueueStore {
    /// Opens or creates the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the database cannot be opened
    /// or initialized, and [`StoreError::Invalid`] for path anomalies.
    pub fn open(config: &SqliteQueueConfig) -> Result<Self, StoreError> {
        validate_store_path(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            queue: config.queue.clone(),
            connection: Mutex::new(connection),
        })
    }

    /// Runs a closure over the locked connection.
    fn with_connection<T>(
        &self,
        apply: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| StoreError::Db("store connection mutex poisoned".to_string()))?;
        apply(&guard)
    }

    /// Applies a status transition as one atomic update keyed by record id.
    fn update_record(
        &self,
        id: OperationId,
        bind: impl FnOnce(&Connection) -> Result<usize, rusqlite::Error>,
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            let changed = bind(connection).map_err(db_err)?;
            if changed == 0 {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        })
    }

    /// Loads records with the given status in replay order.
    fn load_by_status(&self, status: OperationStatus) -> Result<Vec<QueuedOperation>, StoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare(
                    "SELECT id, queue, url, method, headers_json, body, created_at_kind, \
                     created_at, retry_count, status, last_error
                     FROM queued_operations
                     WHERE queue = ?1 AND status = ?2
                     ORDER BY created_at, id",
                )
                .map_err(db_err)?;
            let rows = statement
                .query_map(params![self.queue.as_str(), status.as_str()], row_to_operation)
                .map_err(db_err)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row.map_err(db_err)??);
            }
            Ok(records)
        })
    }

    /// Counts records with the given status.
    fn count_by_status(&self, status: OperationStatus) -> Result<u64, StoreError> {
        self.with_connection(|connection| {
            let count: i64 = connection
                .query_row(
                    "SELECT COUNT(1) FROM queued_operations WHERE queue = ?1 AND status = ?2",
                    params![self.queue.as_str(), status.as_str()],
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            Ok(u64::try_from(count).unwrap_or(0))
        })
    }

    /// Deletes records with the given status and returns how many.
    fn delete_by_status(&self, status: OperationStatus) -> Result<u64, StoreError> {
        self.with_connection(|connection| {
            let changed = connection
                .execute(
                    "DELETE FROM queued_operations WHERE queue = ?1 AND status = ?2",
                    params![self.queue.as_str(), status.as_str()],
                )
                .map_err(db_err)?;
            Ok(changed as u64)
        })
    }
}

impl QueueStore for SqliteQueueStore {
    fn queue(&self) -> &QueueName {
        &self.queue
    }

    fn enqueue(
        &self,
        request: &WriteRequest,
        created_at: Timestamp,
    ) -> Result<QueuedOperation, StoreError> {
        validate_request(request)?;
        let headers_json = serde_json::to_string(&request.headers)
            .map_err(|err| StoreError::Invalid(format!("header serialization failed: {err}")))?;
        let (kind, value) = encode_timestamp(created_at);
        let id = self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT INTO queued_operations
                     (queue, url, method, headers_json, body, created_at_kind, created_at, \
                     retry_count, status, last_error)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, NULL)",
                    params![
                        self.queue.as_str(),
                        request.url,
                        request.method.as_str(),
                        headers_json,
                        request.body,
                        kind,
                        value,
                        OperationStatus::Pending.as_str(),
                    ],
                )
                .map_err(db_err)?;
            Ok(connection.last_insert_rowid())
        })?;
        Ok(QueuedOperation {
            id: OperationId::new(id),
            queue: self.queue.clone(),
            request: request.clone(),
            created_at,
            retry_count: 0,
            status: OperationStatus::Pending,
            last_error: None,
        })
    }

    fn load_pending(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.load_by_status(OperationStatus::Pending)
    }

    fn mark_syncing(&self, id: OperationId) -> Result<(), StoreError> {
        self.update_record(id, |connection| {
            connection.execute(
                "UPDATE queued_operations SET status = ?1 WHERE id = ?2 AND queue = ?3",
                params![OperationStatus::Syncing.as_str(), id.get(), self.queue.as_str()],
            )
        })
    }

    fn mark_completed(&self, id: OperationId) -> Result<(), StoreError> {
        self.update_record(id, |connection| {
            connection.execute(
                "UPDATE queued_operations SET status = ?1 WHERE id = ?2 AND queue = ?3",
                params![OperationStatus::Completed.as_str(), id.get(), self.queue.as_str()],
            )
        })
    }

    fn mark_pending_retry(
        &self,
        id: OperationId,
        retry_count: u32,
        last_error: &str,
    ) -> Result<(), StoreError> {
        self.update_record(id, |connection| {
            connection.execute(
                "UPDATE queued_operations
                 SET status = ?1, retry_count = ?2, last_error = ?3
                 WHERE id = ?4 AND queue = ?5",
                params![
                    OperationStatus::Pending.as_str(),
                    retry_count,
                    last_error,
                    id.get(),
                    self.queue.as_str(),
                ],
            )
        })
    }

    fn mark_failed(&self, id: OperationId, last_error: &str) -> Result<(), StoreError> {
        self.update_record(id, |connection| {
            connection.execute(
                "UPDATE queued_operations SET status = ?1, last_error = ?2
                 WHERE id = ?3 AND queue = ?4",
                params![
                    OperationStatus::Failed.as_str(),
                    last_error,
                    id.get(),
                    self.queue.as_str(),
                ],
            )
        })
    }

    fn delete(&self, id: OperationId) -> Result<(), StoreError> {
        self.update_record(id, |connection| {
            connection.execute(
                "DELETE FROM queued_operations WHERE id = ?1 AND queue = ?2",
                params![id.get(), self.queue.as_str()],
            )
        })
    }

    fn delete_completed(&self) -> Result<u64, StoreError> {
        self.delete_by_status(OperationStatus::Completed)
    }

    fn purge_failed(&self) -> Result<u64, StoreError> {
        self.delete_by_status(OperationStatus::Failed)
    }

    fn pending_count(&self) -> Result<u64, StoreError> {
        self.count_by_status(OperationStatus::Pending)
    }

    fn failed_count(&self) -> Result<u64, StoreError> {
        self.count_by_status(OperationStatus::Failed)
    }

    fn load_failed(&self) -> Result<Vec<QueuedOperation>, StoreError> {
        self.load_by_status(OperationStatus::Failed)
    }
}

// ============================================================================
// SECTION: Row Decoding
// ============================================================================

/// Decodes one result row into a queued operation.
///
/// Returns a nested result so storage corruption surfaces as
/// [`StoreError::Invalid`] rather than a database error.
fn row_to_operation(row: &Row<'_>) -> Result<Result<QueuedOperation, StoreError>, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let queue: String = row.get(1)?;
    let url: String = row.get(2)?;
    let method: String = row.get(3)?;
    let headers_json: String = row.get(4)?;
    let body: Vec<u8> = row.get(5)?;
    let created_at_kind: String = row.get(6)?;
    let created_at: i64 = row.get(7)?;
    let retry_count: i64 = row.get(8)?;
    let status: String = row.get(9)?;
    let last_error: Option<String> = row.get(10)?;
    Ok(decode_operation(DecodedRow {
        id,
        queue,
        url,
        method,
        headers_json,
        body,
        created_at_kind,
        created_at,
        retry_count,
        status,
        last_error,
    }))
}

/// Raw column values for one stored record.
struct DecodedRow {
    /// Store-assigned identifier.
    id: i64,
    /// Owning queue namespace.
    queue: String,
    /// Request URL.
    url: String,
    /// Stored verb label.
    method: String,
    /// Serialized header map.
    headers_json: String,
    /// Request body bytes.
    body: Vec<u8>,
    /// Stored timestamp kind label.
    created_at_kind: String,
    /// Stored timestamp value.
    created_at: i64,
    /// Failed attempts so far.
    retry_count: i64,
    /// Stored status label.
    status: String,
    /// Last failure message.
    last_error: Option<String>,
}

/// Validates and assembles a queued operation from raw column values.
fn decode_operation(row: DecodedRow) -> Result<QueuedOperation, StoreError> {
    let method = WriteMethod::from_label(&row.method)
        .ok_or_else(|| StoreError::Invalid(format!("stored method is invalid: {}", row.method)))?;
    let status = OperationStatus::from_label(&row.status)
        .ok_or_else(|| StoreError::Invalid(format!("stored status is invalid: {}", row.status)))?;
    let queue = QueueName::new(row.queue)
        .map_err(|err| StoreError::Invalid(format!("stored queue name is invalid: {err}")))?;
    let headers: BTreeMap<String, String> = serde_json::from_str(&row.headers_json)
        .map_err(|err| StoreError::Invalid(format!("stored headers are invalid: {err}")))?;
    let created_at = decode_timestamp(&row.created_at_kind, row.created_at)?;
    let retry_count = u32::try_from(row.retry_count)
        .map_err(|_| StoreError::Invalid("stored retry count is negative".to_string()))?;
    Ok(QueuedOperation {
        id: OperationId::new(row.id),
        queue,
        request: WriteRequest {
            url: row.url,
            method,
            headers,
            body: row.body,
        },
        created_at,
        retry_count,
        status,
        last_error: row.last_error,
    })
}

/// Encodes a timestamp into its stored kind label and value.
fn encode_timestamp(timestamp: Timestamp) -> (&'static str, i64) {
    match timestamp {
        Timestamp::UnixMillis(value) => (TIME_KIND_UNIX, value),
        Timestamp::Logical(_) => (TIME_KIND_LOGICAL, timestamp.order_key()),
    }
}

/// Decodes a stored kind label and value back into a timestamp.
fn decode_timestamp(kind: &str, value: i64) -> Result<Timestamp, StoreError> {
    match kind {
        TIME_KIND_UNIX => Ok(Timestamp::UnixMillis(value)),
        TIME_KIND_LOGICAL => u64::try_from(value)
            .map(Timestamp::Logical)
            .map_err(|_| StoreError::Invalid("stored logical timestamp is negative".to_string())),
        other => Err(StoreError::Invalid(format!("stored timestamp kind is invalid: {other}"))),
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates a request against store limits before persisting it.
fn validate_request(request: &WriteRequest) -> Result<(), StoreError> {
    if request.url.is_empty() {
        return Err(StoreError::Invalid("request url is empty".to_string()));
    }
    if request.url.len() > MAX_URL_LENGTH {
        return Err(StoreError::Invalid("request url exceeds length limit".to_string()));
    }
    if request.body.len() > MAX_BODY_BYTES {
        return Err(StoreError::Invalid("request body exceeds size limit".to_string()));
    }
    Ok(())
}

/// Validates the database path before opening.
fn validate_store_path(path: &Path) -> Result<(), StoreError> {
    let path_string = path.to_string_lossy();
    if path_string.is_empty() {
        return Err(StoreError::Invalid("store path is empty".to_string()));
    }
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(StoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(StoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(StoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Maps a database error into the store error space.
fn db_err(err: rusqlite::Error) -> StoreError {
    StoreError::Db(err.to_string())
}

/// Opens an `SQLite` connection with durable defaults.
///
/// Open failures are the capability signal for degraded hosts, so they map to
/// [`StoreError::Unavailable`] rather than a generic database error.
fn open_connection(config: &SqliteQueueConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| StoreError::Unavailable(err.to_string()))?;
    Ok(connection)
}

/// Initializes the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(db_err)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_err)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_err)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_err)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS queued_operations (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    queue TEXT NOT NULL,
                    url TEXT NOT NULL,
                    method TEXT NOT NULL,
                    headers_json TEXT NOT NULL,
                    body BLOB NOT NULL,
                    created_at_kind TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    retry_count INTEGER NOT NULL,
                    status TEXT NOT NULL,
                    last_error TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_queued_operations_drain
                    ON queued_operations (queue, status, created_at, id);",
            )
            .map_err(db_err)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(StoreError::Invalid(format!("unsupported schema version: {value}")));
        }
    }
    tx.commit().map_err(db_err)?;
    Ok(())
}
