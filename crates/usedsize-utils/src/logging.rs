//! # Logging Utilities
//!
//! Logging infrastructure for usedsize using `tracing`.
//!
//! Diagnostics go to stderr so that stdout carries nothing but command
//! results. Supported:
//! - Two output formats (JSON for machines, pretty for people)
//! - Environment variable configuration
//! - Log level filtering, with `RUST_LOG` directives taking precedence
//! - Optional mirroring to a daily-rolled log file
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use usedsize_utils::init_logging;
//!
//! // Keep the guard alive for as long as file logging should flush.
//! let _guard = init_logging().expect("Failed to initialize logging");
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=usedsize_core=trace`)
//! - `USEDSIZE_LOG_FORMAT`: output format (`json` or `pretty`, default: `pretty`)
//! - `USEDSIZE_LOG_FILE`: optional path of a log file to mirror diagnostics to
//!
//! ## Examples
//!
//! ```rust,no_run
//! use usedsize_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Json)
//!     .expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

impl LogFormat
{
    /// Format named by `USEDSIZE_LOG_FORMAT`; `Pretty` when it is unset.
    ///
    /// ## Errors
    ///
    /// Returns `InvalidFormat` if the variable holds an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        format_from(env::var("USEDSIZE_LOG_FORMAT").ok().as_deref())
    }
}

fn format_from(raw: Option<&str>) -> Result<LogFormat, LoggingError>
{
    raw.map_or(Ok(LogFormat::Pretty), |raw| {
        LogFormat::from_str(raw).map_err(LoggingError::InvalidFormat)
    })
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for the CLI)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (every list node and tree node visited)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (default: `warn`)
/// - `USEDSIZE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `USEDSIZE_LOG_FILE`: Optional path to log file
///
/// Returns the file writer's guard when file logging is enabled; buffered
/// lines are flushed when it is dropped.
///
/// ## Errors
///
/// Returns an error if:
/// - `USEDSIZE_LOG_FORMAT` holds an unknown format
/// - Logging is already initialized
pub fn init_logging() -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_internal(LogFormat::from_env()?, None)
}

/// Initialize logging with explicit level and format
///
/// An explicit level wins over `RUST_LOG`. `USEDSIZE_LOG_FILE` is still
/// honored.
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_internal(format, Some(level.into()))
}

/// Initialize logging in `format`, filtered by `RUST_LOG` (default: `warn`)
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_format(format: LogFormat) -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_internal(format, None)
}

/// Filter for an explicit level, else `RUST_LOG`, else `warn`.
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    match explicit_level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string())),
    }
}

/// Daily-rolled appender for `path`.
fn file_writer(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard)
{
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_appender = tracing_appender::rolling::daily(directory, path.file_name().unwrap_or_default());
    tracing_appender::non_blocking(file_appender)
}

fn init_logging_internal(format: LogFormat, explicit_level: Option<Level>) -> Result<Option<WorkerGuard>, LoggingError>
{
    let log_file = env::var("USEDSIZE_LOG_FILE").ok().map(PathBuf::from);
    let (file, guard) = match log_file.as_deref().map(file_writer) {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };

    let result = match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(build_filter(explicit_level));
            let file_layer = file.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(build_filter(explicit_level))
            });
            Registry::default().with(console_layer).with(file_layer).try_init()
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(build_filter(explicit_level));
            let file_layer = file.map(|writer| {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(build_filter(explicit_level))
            });
            Registry::default().with(console_layer).with(file_layer).try_init()
        }
    };

    result.map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(guard)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_unset_format_variable_means_pretty()
    {
        assert_eq!(format_from(None).unwrap(), LogFormat::Pretty);
        assert_eq!(format_from(Some("json")).unwrap(), LogFormat::Json);
        assert!(matches!(format_from(Some("xml")), Err(LoggingError::InvalidFormat(_))));
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Warn), Level::WARN);
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_explicit_level_wins()
    {
        assert_eq!(build_filter(Some(Level::DEBUG)).to_string(), "debug");
    }
}
