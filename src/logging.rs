//! Structured logging setup and the host-facing logger.
//!
//! [`init_logging`] installs a global `tracing` subscriber:
//!
//! - `EnvFilter` from `RUST_LOG`, falling back to the configured level
//! - JSON (production) or pretty (development) output with thread ids
//! - with a `log_destination`, events are appended to that file through a
//!   non-blocking writer; otherwise they go to stdout
//!
//! The returned [`LoggingGuard`] flushes the file writer when dropped, so keep it
//! alive as long as the dispatch layer runs. Installing a second subscriber is not
//! an error: the first one stays in place and the new guard reports
//! [`is_installed`](LoggingGuard::is_installed) `false`. A destination that cannot
//! be opened is not an error either: output falls back to stdout with a warning.
//!
//! [`HostLogger`] does not go through the global subscriber. It owns a scoped
//! subscriber over its own appender, so host messages reach the destination
//! whatever subscriber or filter the process has installed.

use crate::config::DispatchConfig;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::Path;
use tracing::{Dispatch, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Target of events written through [`HostLogger`].
pub const HOST_LOG_TARGET: &str = "nsdispatch::host";

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Keeps the file writer of the installed subscriber alive.
#[derive(Debug)]
pub struct LoggingGuard {
    _writer: Option<WorkerGuard>,
    installed: bool,
}

impl LoggingGuard {
    /// Whether this call installed the global subscriber.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.installed
    }
}

fn parse_level(level: &str) -> Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn open_destination(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &DispatchConfig) -> LoggingGuard {
    let level = parse_level(&config.log_level);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let mut unavailable = None;
    let file = config
        .log_destination
        .as_deref()
        .and_then(|path| match open_destination(path) {
            Ok(file) => Some(file),
            Err(err) => {
                unavailable = Some(format!("{}: {err}", path.display()));
                None
            }
        });
    let to_file = file.is_some();
    let (writer, guard) = match file {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(std::io::stdout()),
    };

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(!to_file)
            .with_writer(writer)
            .boxed(),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();

    if let Some(reason) = &unavailable {
        tracing::warn!(destination = %reason, "Log destination unavailable; logging to stdout");
    }

    if installed {
        tracing::info!(
            destination = ?config.log_destination,
            level = %level,
            format = ?config.log_format,
            "Logging initialized"
        );
        LoggingGuard {
            _writer: Some(guard),
            installed,
        }
    } else {
        tracing::debug!("Global subscriber already installed; keeping it");
        LoggingGuard {
            _writer: None,
            installed,
        }
    }
}

/// Best-effort logger handed to the host.
///
/// Appends to the configured destination through its own non-blocking writer;
/// dropping the logger flushes it. Without a usable destination every call is a
/// silent no-op.
#[derive(Debug)]
pub struct HostLogger {
    sink: Option<HostSink>,
}

#[derive(Debug)]
struct HostSink {
    dispatch: Dispatch,
    _writer: WorkerGuard,
}

impl HostLogger {
    #[must_use]
    pub fn new(config: &DispatchConfig) -> Self {
        let Some(path) = config.log_destination.as_deref() else {
            return Self { sink: None };
        };
        let file = match open_destination(path) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(
                    destination = %path.display(),
                    error = %err,
                    "Host log destination unavailable; host messages dropped"
                );
                return Self { sink: None };
            }
        };

        let (writer, guard) = tracing_appender::non_blocking(file);
        let builder = tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer);
        let dispatch = match config.log_format {
            LogFormat::Json => Dispatch::new(builder.json().finish()),
            LogFormat::Pretty => Dispatch::new(builder.finish()),
        };
        Self {
            sink: Some(HostSink {
                dispatch,
                _writer: guard,
            }),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, message: &str, level: Level) {
        let Some(sink) = &self.sink else {
            return;
        };
        tracing::dispatcher::with_default(&sink.dispatch, || {
            // Level must be a constant in the event macros
            match level {
                Level::ERROR => tracing::error!(target: HOST_LOG_TARGET, "{message}"),
                Level::WARN => tracing::warn!(target: HOST_LOG_TARGET, "{message}"),
                Level::INFO => tracing::info!(target: HOST_LOG_TARGET, "{message}"),
                Level::DEBUG => tracing::debug!(target: HOST_LOG_TARGET, "{message}"),
                _ => tracing::trace!(target: HOST_LOG_TARGET, "{message}"),
            }
        });
    }
}
