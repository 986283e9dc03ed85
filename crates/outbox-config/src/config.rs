// crates/outbox-config/src/config.rs
// ============================================================================
// Module: Outbox Configuration
// Description: Configuration loading and validation for the outbox runtime.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: outbox-core, outbox-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every numeric setting carries explicit bounds and every invalid value
//! fails closed; a host never runs with a silently clamped or guessed
//! configuration. Section accessors convert the raw file shape into the core
//! policy and store types consumed by the runtime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use outbox_core::QueueName;
use outbox_core::QueuePolicy;
use outbox_core::RetryPolicy;
use outbox_core::TerminalPolicy;
use outbox_core::runtime::NetworkMonitorConfig;
use outbox_store_sqlite::SqliteJournalMode;
use outbox_store_sqlite::SqliteQueueConfig;
use outbox_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "outbox.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "OUTBOX_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed retry cap.
pub(crate) const MIN_MAX_RETRIES: u32 = 1;
/// Maximum allowed retry cap.
pub(crate) const MAX_MAX_RETRIES: u32 = 10;
/// Minimum allowed backoff base delay in milliseconds.
pub(crate) const MIN_BASE_DELAY_MS: u64 = 100;
/// Maximum allowed backoff base delay in milliseconds.
pub(crate) const MAX_BASE_DELAY_MS: u64 = 10_000;
/// Maximum allowed backoff delay cap in milliseconds.
pub(crate) const MAX_MAX_DELAY_MS: u64 = 300_000;
/// Minimum per-attempt transport timeout in milliseconds.
pub(crate) const MIN_TRANSPORT_TIMEOUT_MS: u64 = 500;
/// Maximum per-attempt transport timeout in milliseconds.
pub(crate) const MAX_TRANSPORT_TIMEOUT_MS: u64 = 30_000;
/// Default per-attempt transport timeout in milliseconds.
pub(crate) const DEFAULT_TRANSPORT_TIMEOUT_MS: u64 = 10_000;
/// Default maximum transport response size in bytes.
pub(crate) const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Maximum allowed transport response size in bytes.
pub(crate) const MAX_MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Maximum user agent string length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;
/// Minimum connectivity poll interval in milliseconds.
pub(crate) const MIN_POLL_INTERVAL_MS: u64 = 100;
/// Maximum connectivity poll interval in milliseconds.
pub(crate) const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Maximum reconnect debounce window in milliseconds.
pub(crate) const MAX_DEBOUNCE_MS: u64 = 30_000;
/// Maximum reconnect flag lifetime in milliseconds.
pub(crate) const MAX_RECONNECT_FLAG_MS: u64 = 60_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Outbox runtime configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutboxConfig {
    /// Primary queue configuration.
    #[serde(default)]
    pub primary_queue: PrimaryQueueConfig,
    /// Intercept queue configuration.
    #[serde(default)]
    pub intercept_queue: InterceptQueueConfig,
    /// Retry and backoff configuration shared by both queues.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Transport policy configuration.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Network monitor configuration.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl OutboxConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.primary_queue.validate()?;
        self.intercept_queue.validate()?;
        self.retry.validate()?;
        self.transport.validate()?;
        self.monitor.validate()?;
        if self.primary_queue.name == self.intercept_queue.name {
            return Err(ConfigError::Invalid(
                "primary_queue.name and intercept_queue.name must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the policy applied to the primary queue.
    #[must_use]
    pub const fn primary_policy(&self) -> QueuePolicy {
        QueuePolicy {
            retry: self.retry.to_policy(),
            terminal: self.primary_queue.terminal_policy,
        }
    }

    /// Returns the policy applied to the intercept queue.
    #[must_use]
    pub const fn intercept_policy(&self) -> QueuePolicy {
        QueuePolicy {
            retry: self.retry.to_policy(),
            terminal: self.intercept_queue.terminal_policy,
        }
    }

    /// Returns the monitor configuration in runtime form.
    #[must_use]
    pub const fn monitor_config(&self) -> NetworkMonitorConfig {
        NetworkMonitorConfig {
            poll_interval_ms: self.monitor.poll_interval_ms,
            debounce_ms: self.monitor.debounce_ms,
            reconnect_flag_ms: self.monitor.reconnect_flag_ms,
        }
    }
}

/// Primary queue section.
#[derive(Debug, Clone, Deserialize)]
pub struct PrimaryQueueConfig {
    /// Queue namespace for the durable store.
    #[serde(default = "PrimaryQueueConfig::default_name")]
    pub name: String,
    /// SQLite database path for the queue.
    #[serde(default = "PrimaryQueueConfig::default_store_path")]
    pub store_path: String,
    /// SQLite journal mode.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: SqliteJournalMode,
    /// SQLite synchronous mode.
    #[serde(default = "default_sync_mode")]
    pub sync_mode: SqliteSyncMode,
    /// What happens to records that exhaust their retries.
    #[serde(default = "PrimaryQueueConfig::default_terminal_policy")]
    pub terminal_policy: TerminalPolicy,
}

impl PrimaryQueueConfig {
    /// Default queue namespace.
    fn default_name() -> String {
        "offline-writes".to_string()
    }

    /// Default store path.
    fn default_store_path() -> String {
        "outbox.sqlite3".to_string()
    }

    /// Default terminal policy: exhausted records stay visible.
    const fn default_terminal_policy() -> TerminalPolicy {
        TerminalPolicy::RetainFailed
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_queue_name("primary_queue.name", &self.name)?;
        validate_path_string("primary_queue.store_path", &self.store_path)
    }

    /// Returns the store configuration for this queue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the queue name is invalid.
    pub fn store_config(&self) -> Result<SqliteQueueConfig, ConfigError> {
        let queue = QueueName::new(&self.name)
            .map_err(|err| ConfigError::Invalid(format!("primary_queue.name: {err}")))?;
        let mut config = SqliteQueueConfig::new(PathBuf::from(&self.store_path), queue);
        config.journal_mode = self.journal_mode;
        config.sync_mode = self.sync_mode;
        Ok(config)
    }
}

impl Default for PrimaryQueueConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            store_path: Self::default_store_path(),
            journal_mode: default_journal_mode(),
            sync_mode: default_sync_mode(),
            terminal_policy: Self::default_terminal_policy(),
        }
    }
}

/// Intercept queue section.
#[derive(Debug, Clone, Deserialize)]
pub struct InterceptQueueConfig {
    /// Queue namespace for the durable store.
    #[serde(default = "InterceptQueueConfig::default_name")]
    pub name: String,
    /// SQLite database path for the queue.
    #[serde(default = "InterceptQueueConfig::default_store_path")]
    pub store_path: String,
    /// SQLite journal mode.
    #[serde(default = "default_journal_mode")]
    pub journal_mode: SqliteJournalMode,
    /// SQLite synchronous mode.
    #[serde(default = "default_sync_mode")]
    pub sync_mode: SqliteSyncMode,
    /// What happens to records that exhaust their retries.
    #[serde(default = "InterceptQueueConfig::default_terminal_policy")]
    pub terminal_policy: TerminalPolicy,
}

impl InterceptQueueConfig {
    /// Default queue namespace.
    fn default_name() -> String {
        "intercepted-writes".to_string()
    }

    /// Default store path.
    fn default_store_path() -> String {
        "outbox-intercept.sqlite3".to_string()
    }

    /// Default terminal policy: exhausted records are dropped.
    const fn default_terminal_policy() -> TerminalPolicy {
        TerminalPolicy::PurgeOnExhaustion
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_queue_name("intercept_queue.name", &self.name)?;
        validate_path_string("intercept_queue.store_path", &self.store_path)
    }

    /// Returns the store configuration for this queue.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the queue name is invalid.
    pub fn store_config(&self) -> Result<SqliteQueueConfig, ConfigError> {
        let queue = QueueName::new(&self.name)
            .map_err(|err| ConfigError::Invalid(format!("intercept_queue.name: {err}")))?;
        let mut config = SqliteQueueConfig::new(PathBuf::from(&self.store_path), queue);
        config.journal_mode = self.journal_mode;
        config.sync_mode = self.sync_mode;
        Ok(config)
    }
}

impl Default for InterceptQueueConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            store_path: Self::default_store_path(),
            journal_mode: default_journal_mode(),
            sync_mode: default_sync_mode(),
            terminal_policy: Self::default_terminal_policy(),
        }
    }
}

/// Retry and backoff section.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retry cap before a record goes terminal.
    #[serde(default = "RetryConfig::default_max_retries")]
    pub max_retries: u32,
    /// Backoff base delay in milliseconds.
    #[serde(default = "RetryConfig::default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff delay cap in milliseconds.
    #[serde(default = "RetryConfig::default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl RetryConfig {
    /// Default retry cap.
    const fn default_max_retries() -> u32 {
        outbox_core::DEFAULT_MAX_RETRIES
    }

    /// Default backoff base delay.
    const fn default_base_delay_ms() -> u64 {
        outbox_core::DEFAULT_BASE_DELAY_MS
    }

    /// Default backoff delay cap.
    const fn default_max_delay_ms() -> u64 {
        outbox_core::DEFAULT_MAX_DELAY_MS
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_MAX_RETRIES..=MAX_MAX_RETRIES).contains(&self.max_retries) {
            return Err(ConfigError::Invalid(format!(
                "retry.max_retries must be within {MIN_MAX_RETRIES}..={MAX_MAX_RETRIES}"
            )));
        }
        if !(MIN_BASE_DELAY_MS..=MAX_BASE_DELAY_MS).contains(&self.base_delay_ms) {
            return Err(ConfigError::Invalid(format!(
                "retry.base_delay_ms must be within {MIN_BASE_DELAY_MS}..={MAX_BASE_DELAY_MS}"
            )));
        }
        if self.max_delay_ms < self.base_delay_ms || self.max_delay_ms > MAX_MAX_DELAY_MS {
            return Err(ConfigError::Invalid(format!(
                "retry.max_delay_ms must be within base_delay_ms..={MAX_MAX_DELAY_MS}"
            )));
        }
        Ok(())
    }

    /// Returns the core retry policy for this section.
    #[must_use]
    pub const fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            base_delay_ms: Self::default_base_delay_ms(),
            max_delay_ms: Self::default_max_delay_ms(),
        }
    }
}

/// Transport policy section.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Allow cleartext HTTP (disabled by default).
    #[serde(default)]
    pub allow_http: bool,
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "TransportConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size retained, in bytes.
    #[serde(default = "TransportConfig::default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Host allowlist; empty means all hosts are permitted.
    #[serde(default)]
    pub allowed_hosts: Vec<String>,
    /// User agent string for outbound requests.
    #[serde(default = "TransportConfig::default_user_agent")]
    pub user_agent: String,
}

impl TransportConfig {
    /// Default per-attempt timeout.
    const fn default_timeout_ms() -> u64 {
        DEFAULT_TRANSPORT_TIMEOUT_MS
    }

    /// Default response size cap.
    const fn default_max_response_bytes() -> usize {
        DEFAULT_MAX_RESPONSE_BYTES
    }

    /// Default user agent.
    fn default_user_agent() -> String {
        "outbox/0.1".to_string()
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_TRANSPORT_TIMEOUT_MS..=MAX_TRANSPORT_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "transport.timeout_ms must be within \
                 {MIN_TRANSPORT_TIMEOUT_MS}..={MAX_TRANSPORT_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_MAX_RESPONSE_BYTES {
            return Err(ConfigError::Invalid(format!(
                "transport.max_response_bytes must be within 1..={MAX_MAX_RESPONSE_BYTES}"
            )));
        }
        for host in &self.allowed_hosts {
            if host.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "transport.allowed_hosts entries must be non-empty".to_string(),
                ));
            }
        }
        if self.user_agent.trim().is_empty() || self.user_agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "transport.user_agent must be 1..={MAX_USER_AGENT_LENGTH} bytes"
            )));
        }
        Ok(())
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            allow_http: false,
            timeout_ms: Self::default_timeout_ms(),
            max_response_bytes: Self::default_max_response_bytes(),
            allowed_hosts: Vec::new(),
            user_agent: Self::default_user_agent(),
        }
    }
}

/// Network monitor section.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Connectivity poll interval in milliseconds.
    #[serde(default = "MonitorConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Reconnect debounce window in milliseconds.
    #[serde(default = "MonitorConfig::default_debounce_ms")]
    pub debounce_ms: u64,
    /// Lifetime of the just-reconnected flag in milliseconds.
    #[serde(default = "MonitorConfig::default_reconnect_flag_ms")]
    pub reconnect_flag_ms: u64,
}

impl MonitorConfig {
    /// Default connectivity poll interval.
    const fn default_poll_interval_ms() -> u64 {
        1_000
    }

    /// Default reconnect debounce window.
    const fn default_debounce_ms() -> u64 {
        2_000
    }

    /// Default just-reconnected flag lifetime.
    const fn default_reconnect_flag_ms() -> u64 {
        5_000
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "monitor.poll_interval_ms must be within \
                 {MIN_POLL_INTERVAL_MS}..={MAX_POLL_INTERVAL_MS}"
            )));
        }
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "monitor.debounce_ms must be at most {MAX_DEBOUNCE_MS}"
            )));
        }
        if self.reconnect_flag_ms > MAX_RECONNECT_FLAG_MS {
            return Err(ConfigError::Invalid(format!(
                "monitor.reconnect_flag_ms must be at most {MAX_RECONNECT_FLAG_MS}"
            )));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::default_poll_interval_ms(),
            debounce_ms: Self::default_debounce_ms(),
            reconnect_flag_ms: Self::default_reconnect_flag_ms(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned while loading or validating configuration.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Default SQLite journal mode for queue stores.
const fn default_journal_mode() -> SqliteJournalMode {
    SqliteJournalMode::Wal
}

/// Default SQLite synchronous mode for queue stores.
const fn default_sync_mode() -> SqliteSyncMode {
    SqliteSyncMode::Full
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a queue name string through the core constructor.
fn validate_queue_name(field: &str, value: &str) -> Result<(), ConfigError> {
    QueueName::new(value).map_err(|err| ConfigError::Invalid(format!("{field}: {err}")))?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
