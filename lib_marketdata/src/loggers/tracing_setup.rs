//! # Tracing Setup
//!
//! Installs the global `tracing` subscriber used by the binaries:
//!
//! - verbosity from `RUST_LOG`, falling back to [`LogSettings::default_level`];
//! - human readable console output on stderr, so stdout stays free for data;
//! - optionally, JSON lines in a daily rotating file under [`LogSettings::log_dir`].

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Prefix of the rolling log file names.
    pub app_name: String,
    /// Directory for JSON log files. `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is unset or invalid.
    pub default_level: String,
    /// Colour the console output.
    pub ansi: bool,
}

impl LogSettings {
    /// Console-only settings at `info`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            log_dir: None,
            default_level: "info".to_string(),
            ansi: true,
        }
    }

    /// Also write JSON logs to daily files in `log_dir`.
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Sets the fallback filter directive.
    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// Builds the filter: `RUST_LOG` first, then the fallback directive.
    pub fn env_filter(&self) -> Result<EnvFilter, LoggerInitError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.default_level))
            .map_err(|e| LoggerInitError::Filter(e.to_string()))
    }
}

/// Why logging could not be initialized.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    /// The log directory could not be created.
    #[error("cannot create log directory: {0}")]
    Io(#[from] std::io::Error),

    /// Neither `RUST_LOG` nor the fallback directive parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// `init_tracing` ran twice, or another subscriber won.
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global subscriber.
///
/// When file logging is enabled the returned guard flushes the background
/// writer on drop; keep it alive until the program exits.
pub fn init_tracing(settings: &LogSettings) -> Result<Option<WorkerGuard>, LoggerInitError> {
    let env_filter = settings.env_filter()?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_ansi(settings.ansi)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match &settings.log_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = rolling::daily(log_dir, format!("{}.log", settings.app_name));
            let (non_blocking_appender, guard) = non_blocking(file_appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking_appender)
                .json();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggerInitError::AlreadyInitialized(e.to_string()))?;

    info!(
        app = %settings.app_name,
        log_dir = ?settings.log_dir,
        "logging initialized"
    );
    Ok(guard)
}
