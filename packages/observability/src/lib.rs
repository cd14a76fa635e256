//! # Observability
//!
//! Structured logging for the Postwall crates.
//!
//! Libraries only emit `tracing` events. The host application calls
//! [`init_with_config`] once at startup, which installs:
//!
//! - a JSONL file layer (one object per line: timestamp, level, service,
//!   pid, target, message, fields)
//! - an optional compact stderr layer
//!
//! both filtered by `RUST_LOG`, or by the configured level when it is unset.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "postwall".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! })?;
//! tracing::info!(collection = "posts", "feed started");
//! ```

mod json_layer;
mod writer;

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{LogFileWriter, LogWriterFactory};

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Overridden by the `RUST_LOG` environment variable.
    pub default_level: String,

    /// Log file path. Defaults to `<local data dir>/postwall/logs/postwall.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Error installing the global subscriber.
#[derive(Error, Debug)]
pub enum InitError {
    /// No log path was given and no data directory could be found.
    #[error("Could not determine a log directory")]
    NoLogDir,

    /// The log file could not be opened.
    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Default JSONL log location.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("postwall").join("logs").join("postwall.jsonl"))
}

/// Initialize logging with default settings for `service_name`.
pub fn init(service_name: &str) -> Result<(), InitError> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with custom configuration.
pub fn init_with_config(config: LogConfig) -> Result<(), InitError> {
    let log_path = match config.log_path.clone() {
        Some(path) => path,
        None => default_log_path().ok_or(InitError::NoLogDir)?,
    };

    let writer = LogFileWriter::new(&log_path).map_err(|source| InitError::LogFile {
        path: log_path.clone(),
        source,
    })?;
    let json_layer = JsonLayer::new(config.service_name.clone(), LogWriterFactory::new(writer));

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init()
        .map_err(|e| InitError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        log_path = %log_path.display(),
        "observability initialized"
    );
    Ok(())
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.service_name, "unknown");
        assert_eq!(config.default_level, "info");
        assert!(config.log_path.is_none());
        assert!(!config.also_stderr);
    }

    #[test]
    fn test_default_log_path_shape() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with("postwall/logs/postwall.jsonl"));
        }
    }
}
