// crates/outbox-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Provides message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings for future localization support.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! The outbox CLI stores user-facing strings in a small translation catalog
//! to enforce consistent messaging across locales. All runtime output should
//! be routed through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The catalog is initialized once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - Variants are stable for CLI parsing and catalog lookup.
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Attempts to parse a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let normalized = value.to_ascii_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        match lang {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
///
/// # Invariants
/// - Ordering is stable for deterministic presentation.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Es];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `path`).
/// - `value` is preformatted and should be safe for display.
#[derive(Clone)]
pub struct MessageArg {
    /// The placeholder name used in message templates (e.g., `"queue"`).
    pub key: &'static str,
    /// The formatted string value to substitute for this placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Global locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Static English catalog entries loaded into the localized message bundle.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "outbox {version}"),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be imprecise.",
    ),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Supported locales: en, es."),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("store.open_failed", "Failed to open queue store: {error}"),
    ("transport.build_failed", "Failed to build transport: {error}"),
    ("status.line", "{queue}: {pending} pending, {failed} failed"),
    (
        "sync.report.line",
        "{queue}: attempted {attempted}, synced {synced}, retried {retried}, exhausted {exhausted}",
    ),
    ("sync.skipped", "{queue}: sync already in progress"),
    ("sync.failed", "Sync failed: {error}"),
    ("sync.toast.one", "1 change synced"),
    ("sync.toast.many", "{count} changes synced"),
    ("enqueue.ok", "Queued operation {id} on {queue}"),
    ("enqueue.failed", "Failed to queue operation: {error}"),
    ("enqueue.header.invalid", "Invalid header {value}; expected name=value."),
    ("enqueue.body.invalid_base64", "Invalid base64 body: {error}"),
    ("enqueue.body.read_failed", "Failed to read body file at {path}: {error}"),
    ("enqueue.body.too_large", "Refusing body of {size} bytes (limit {limit})."),
    ("enqueue.body.conflict", "Provide at most one of --body-base64 and --body-file."),
    ("purge.ok", "Purged {count} failed records from {queue}."),
    ("purge.failed", "Failed to purge records: {error}"),
];

/// Static Spanish catalog entries loaded into the localized message bundle.
const CATALOG_ES: &[(&str, &str)] = &[
    ("main.version", "outbox {version}"),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la salida en idiomas distintos del ingl\u{e9}s es traducci\u{f3}n autom\u{e1}tica.",
    ),
    (
        "i18n.lang.invalid_env",
        "Valor no v\u{e1}lido para {env}: {value}. Idiomas admitidos: en, es.",
    ),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("config.load_failed", "No se pudo cargar la configuraci\u{f3}n: {error}"),
    ("config.validate.ok", "Configuraci\u{f3}n v\u{e1}lida."),
    ("store.open_failed", "No se pudo abrir el almac\u{e9}n de la cola: {error}"),
    ("transport.build_failed", "No se pudo construir el transporte: {error}"),
    ("status.line", "{queue}: {pending} pendientes, {failed} fallidas"),
    (
        "sync.report.line",
        "{queue}: intentadas {attempted}, sincronizadas {synced}, reintentadas {retried}, \
         agotadas {exhausted}",
    ),
    ("sync.skipped", "{queue}: sincronizaci\u{f3}n ya en curso"),
    ("sync.failed", "La sincronizaci\u{f3}n fall\u{f3}: {error}"),
    ("sync.toast.one", "1 cambio sincronizado"),
    ("sync.toast.many", "{count} cambios sincronizados"),
    ("enqueue.ok", "Operaci\u{f3}n {id} encolada en {queue}"),
    ("enqueue.failed", "No se pudo encolar la operaci\u{f3}n: {error}"),
    ("enqueue.header.invalid", "Encabezado no v\u{e1}lido {value}; se espera nombre=valor."),
    ("enqueue.body.invalid_base64", "Cuerpo base64 no v\u{e1}lido: {error}"),
    ("enqueue.body.read_failed", "No se pudo leer el archivo de cuerpo en {path}: {error}"),
    ("enqueue.body.too_large", "Se rechaza un cuerpo de {size} bytes (l\u{ed}mite {limit})."),
    ("enqueue.body.conflict", "Proporcione como m\u{e1}ximo uno de --body-base64 y --body-file."),
    ("purge.ok", "Se purgaron {count} registros fallidos de {queue}."),
    ("purge.failed", "No se pudieron purgar los registros: {error}"),
];

/// Returns the catalog map for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` for the current locale while substituting `args`.
///
/// Missing keys fall back to English and finally to the key itself.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let locale = current_locale();
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
    if args.is_empty() {
        return template.to_string();
    }

    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a key and named arguments.
///
/// # Arguments
///
/// - `$key` must match a catalog entry.
/// - Named arguments are substituted into `{placeholder}` positions.
///
/// # Returns
///
/// A localized [`String`] with placeholders substituted.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
