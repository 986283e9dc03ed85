// crates/outbox-cli/src/main.rs
// ============================================================================
// Module: Outbox CLI Entry Point
// Description: Command dispatcher for offline write queue maintenance.
// Purpose: Provide a safe, localized CLI for queue inspection and replay.
// Dependencies: base64, clap, outbox-config, outbox-core, outbox-notify,
//               outbox-store-sqlite, outbox-transport, thiserror
// ============================================================================

//! ## Overview
//! The outbox CLI inspects and drains the durable write queues from the
//! command line. All user-facing strings are routed through the i18n catalog.
//! Commands operate on the stores named in the configuration file and never
//! mutate records outside the documented status transitions.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use outbox_cli::i18n::Locale;
use outbox_cli::i18n::set_locale;
use outbox_cli::t;
use outbox_config::OutboxConfig;
use outbox_core::Clock;
use outbox_core::Notifier;
use outbox_core::QueuePolicy;
use outbox_core::QueueStore;
use outbox_core::ReplayTransport;
use outbox_core::SyncEngine;
use outbox_core::SystemClock;
use outbox_core::WriteMethod;
use outbox_core::WriteRequest;
use outbox_notify::LogNotifier;
use outbox_store_sqlite::MAX_BODY_BYTES;
use outbox_store_sqlite::SqliteQueueConfig;
use outbox_store_sqlite::SqliteQueueStore;
use outbox_transport::HttpReplayTransport;
use outbox_transport::HttpTransportConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Environment variable for CLI locale selection.
const LANG_ENV: &str = "OUTBOX_LANG";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "outbox", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Preferred output language (overrides `OUTBOX_LANG`).
    #[arg(long, value_enum, value_name = "LANG", global = true)]
    lang: Option<LangArg>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show pending and failed counts for both queues.
    Status(StatusCommand),
    /// Drain both queues once and report the result.
    Sync(SyncCommand),
    /// Queue a write request without attempting delivery.
    Enqueue(EnqueueCommand),
    /// Delete terminally failed records from a queue.
    PurgeFailed(PurgeFailedCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate an outbox configuration file.
    Validate(ConfigValidateCommand),
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Optional config file path (defaults to outbox.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `sync` command.
#[derive(Args, Debug)]
struct SyncCommand {
    /// Optional config file path (defaults to outbox.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `enqueue` command.
#[derive(Args, Debug)]
struct EnqueueCommand {
    /// Optional config file path (defaults to outbox.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Target queue for the record.
    #[arg(long, value_enum, value_name = "QUEUE", default_value_t = QueueArg::Primary)]
    queue: QueueArg,
    /// Absolute request URL.
    #[arg(long, value_name = "URL")]
    url: String,
    /// Mutating HTTP verb.
    #[arg(long, value_enum, value_name = "METHOD")]
    method: MethodArg,
    /// Request header as name=value; repeatable.
    #[arg(long = "header", value_name = "NAME=VALUE")]
    headers: Vec<String>,
    /// Request body as standard base64.
    #[arg(long, value_name = "BASE64")]
    body_base64: Option<String>,
    /// Path to a file holding the raw request body.
    #[arg(long, value_name = "PATH")]
    body_file: Option<PathBuf>,
}

/// Arguments for the `purge-failed` command.
#[derive(Args, Debug)]
struct PurgeFailedCommand {
    /// Optional config file path (defaults to outbox.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Queue whose failed records are purged.
    #[arg(long, value_enum, value_name = "QUEUE", default_value_t = QueueArg::Primary)]
    queue: QueueArg,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to outbox.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Locale selection argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum LangArg {
    /// English.
    En,
    /// Spanish.
    Es,
}

impl From<LangArg> for Locale {
    fn from(value: LangArg) -> Self {
        match value {
            LangArg::En => Self::En,
            LangArg::Es => Self::Es,
        }
    }
}

/// Queue selection argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum QueueArg {
    /// The primary offline write queue.
    Primary,
    /// The boundary interceptor queue.
    Intercept,
}

/// HTTP verb argument.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum MethodArg {
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP PATCH.
    Patch,
    /// HTTP DELETE.
    Delete,
}

impl From<MethodArg> for WriteMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Post => Self::Post,
            MethodArg::Put => Self::Put,
            MethodArg::Patch => Self::Patch,
            MethodArg::Delete => Self::Delete,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let env_lang = std::env::var(LANG_ENV).ok();
    let locale = resolve_locale(cli.lang, env_lang.as_deref())?;
    set_locale(locale);
    if locale != Locale::En {
        write_stderr_line(&t!("i18n.disclaimer.machine_translated"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Status(command) => command_status(&command),
        Commands::Sync(command) => command_sync(&command),
        Commands::Enqueue(command) => command_enqueue(&command),
        Commands::PurgeFailed(command) => command_purge_failed(&command),
        Commands::Config {
            command,
        } => command_config(&command),
    }
}

// ============================================================================
// SECTION: Status Command
// ============================================================================

/// Executes the `status` command.
fn command_status(command: &StatusCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let primary = open_store(&config.primary_queue.store_config().map_err(config_error)?)?;
    let intercept = open_store(&config.intercept_queue.store_config().map_err(config_error)?)?;
    for store in [&primary, &intercept] {
        let pending = store.pending_count().map_err(store_error)?;
        let failed = store.failed_count().map_err(store_error)?;
        emit_line(&t!(
            "status.line",
            queue = store.queue().as_str(),
            pending = pending,
            failed = failed
        ))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Sync Command
// ============================================================================

/// Executes the `sync` command.
fn command_sync(command: &SyncCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let transport = build_transport(&config)?;
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new(std::io::stderr()));
    let queues = [
        (config.primary_queue.store_config().map_err(config_error)?, config.primary_policy()),
        (config.intercept_queue.store_config().map_err(config_error)?, config.intercept_policy()),
    ];
    let mut total_synced = 0_u64;
    for (store_config, policy) in queues {
        let store = open_store(&store_config)?;
        total_synced += drain_queue(store, &transport, &notifier, policy)?;
    }
    if total_synced == 1 {
        emit_line(&t!("sync.toast.one"))?;
    } else if total_synced > 1 {
        emit_line(&t!("sync.toast.many", count = total_synced))?;
    }
    Ok(ExitCode::SUCCESS)
}

/// Drains one queue and reports the outcome, returning the synced count.
fn drain_queue(
    store: SqliteQueueStore,
    transport: &Arc<HttpReplayTransport>,
    notifier: &Arc<dyn Notifier>,
    policy: QueuePolicy,
) -> CliResult<u64> {
    let engine = SyncEngine::new(
        Arc::new(store),
        Arc::clone(transport) as Arc<dyn ReplayTransport>,
        Arc::clone(notifier),
        policy,
    );
    let queue = engine.queue().clone();
    let outcome = engine.drain().map_err(|err| CliError::new(t!("sync.failed", error = err)))?;
    match outcome.report() {
        Some(report) => {
            emit_line(&t!(
                "sync.report.line",
                queue = queue.as_str(),
                attempted = report.attempted,
                synced = report.synced,
                retried = report.retried,
                exhausted = report.exhausted
            ))?;
            Ok(report.synced)
        }
        None => {
            emit_line(&t!("sync.skipped", queue = queue.as_str()))?;
            Ok(0)
        }
    }
}

// ============================================================================
// SECTION: Enqueue Command
// ============================================================================

/// Executes the `enqueue` command.
fn command_enqueue(command: &EnqueueCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let store_config = queue_store_config(&config, command.queue)?;
    let store = open_store(&store_config)?;
    let mut headers = BTreeMap::new();
    for raw in &command.headers {
        let (name, value) = parse_header(raw)?;
        headers.insert(name, value);
    }
    let body = read_body(command)?;
    let request = WriteRequest {
        url: command.url.clone(),
        method: command.method.into(),
        headers,
        body,
    };
    let clock = SystemClock;
    let record = store
        .enqueue(&request, clock.now())
        .map_err(|err| CliError::new(t!("enqueue.failed", error = err)))?;
    emit_line(&t!("enqueue.ok", id = record.id, queue = record.queue.as_str()))?;
    Ok(ExitCode::SUCCESS)
}

/// Parses a `name=value` header argument.
fn parse_header(raw: &str) -> CliResult<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        return Err(CliError::new(t!("enqueue.header.invalid", value = raw)));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(CliError::new(t!("enqueue.header.invalid", value = raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Resolves the request body from the base64 or file argument.
fn read_body(command: &EnqueueCommand) -> CliResult<Vec<u8>> {
    match (&command.body_base64, &command.body_file) {
        (Some(_), Some(_)) => Err(CliError::new(t!("enqueue.body.conflict"))),
        (Some(encoded), None) => BASE64_STANDARD
            .decode(encoded)
            .map_err(|err| CliError::new(t!("enqueue.body.invalid_base64", error = err))),
        (None, Some(path)) => {
            let bytes = fs::read(path).map_err(|err| {
                CliError::new(t!(
                    "enqueue.body.read_failed",
                    path = path.display(),
                    error = err
                ))
            })?;
            if bytes.len() > MAX_BODY_BYTES {
                return Err(CliError::new(t!(
                    "enqueue.body.too_large",
                    size = bytes.len(),
                    limit = MAX_BODY_BYTES
                )));
            }
            Ok(bytes)
        }
        (None, None) => Ok(Vec::new()),
    }
}

// ============================================================================
// SECTION: Purge Command
// ============================================================================

/// Executes the `purge-failed` command.
fn command_purge_failed(command: &PurgeFailedCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let store_config = queue_store_config(&config, command.queue)?;
    let store = open_store(&store_config)?;
    let count =
        store.purge_failed().map_err(|err| CliError::new(t!("purge.failed", error = err)))?;
    emit_line(&t!("purge.ok", count = count, queue = store.queue().as_str()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Command
// ============================================================================

/// Executes the `config` command group.
fn command_config(command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(command),
    }
}

/// Executes the `config validate` command.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    load_config(command.config.as_deref())?;
    emit_line(&t!("config.validate.ok"))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Loads and validates the configuration file.
fn load_config(path: Option<&std::path::Path>) -> CliResult<OutboxConfig> {
    OutboxConfig::load(path).map_err(|err| CliError::new(t!("config.load_failed", error = err)))
}

/// Maps a config error into a CLI error.
fn config_error(err: outbox_config::ConfigError) -> CliError {
    CliError::new(t!("config.load_failed", error = err))
}

/// Maps a store error into a CLI error.
fn store_error(err: outbox_core::StoreError) -> CliError {
    CliError::new(t!("store.open_failed", error = err))
}

/// Returns the store configuration for the selected queue.
fn queue_store_config(config: &OutboxConfig, queue: QueueArg) -> CliResult<SqliteQueueConfig> {
    match queue {
        QueueArg::Primary => config.primary_queue.store_config().map_err(config_error),
        QueueArg::Intercept => config.intercept_queue.store_config().map_err(config_error),
    }
}

/// Opens a queue store, failing closed on any storage error.
fn open_store(config: &SqliteQueueConfig) -> CliResult<SqliteQueueStore> {
    SqliteQueueStore::open(config)
        .map_err(|err| CliError::new(t!("store.open_failed", error = err)))
}

/// Builds the HTTP transport from the transport section.
fn build_transport(config: &OutboxConfig) -> CliResult<Arc<HttpReplayTransport>> {
    let allowed_hosts = if config.transport.allowed_hosts.is_empty() {
        None
    } else {
        Some(config.transport.allowed_hosts.iter().cloned().collect::<BTreeSet<String>>())
    };
    let transport_config = HttpTransportConfig {
        allow_http: config.transport.allow_http,
        timeout_ms: config.transport.timeout_ms,
        max_response_bytes: config.transport.max_response_bytes,
        allowed_hosts,
        user_agent: config.transport.user_agent.clone(),
    };
    let transport = HttpReplayTransport::new(transport_config)
        .map_err(|err| CliError::new(t!("transport.build_failed", error = err)))?;
    Ok(Arc::new(transport))
}

/// Resolves the CLI locale from the flag or environment.
fn resolve_locale(lang: Option<LangArg>, env_lang: Option<&str>) -> CliResult<Locale> {
    if let Some(lang) = lang {
        return Ok(lang.into());
    }
    if let Some(value) = env_lang {
        return Locale::parse(value).ok_or_else(|| {
            CliError::new(t!("i18n.lang.invalid_env", env = LANG_ENV, value = value))
        });
    }
    Ok(Locale::En)
}

/// Prints the top-level help text.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Writes a line to stdout with localized error handling.
fn emit_line(message: &str) -> CliResult<()> {
    write_stdout_line(message).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Reports an error to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
