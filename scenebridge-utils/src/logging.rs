//! Logging infrastructure for scenebridge
//!
//! Provides unified logging setup using the tracing ecosystem.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{paths, Result, SceneBridgeError};

/// Environment variable holding the log filter
pub const LOG_ENV_VAR: &str = "SCENEBRIDGE_LOG";

/// Log output destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Log to stderr (for client)
    Stderr,
    /// Log to both stderr and file (for server)
    Both,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output destination
    pub output: LogOutput,
    /// Log level filter (e.g., "info", "debug", "scenebridge_server=debug,tokio=warn")
    pub filter: String,
    /// Include span events (enter/exit)
    pub span_events: bool,
    /// Include file/line in logs
    pub file_line: bool,
    /// Optional custom log file name (defaults to "scenebridge.log")
    pub file_name: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: "info".into(),
            span_events: false,
            file_line: false,
            file_name: None,
        }
    }
}

impl LogConfig {
    /// Create config for the command-line client (quiet stderr)
    pub fn client() -> Self {
        Self {
            output: LogOutput::Stderr,
            filter: std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "warn".into()),
            span_events: false,
            file_line: false,
            file_name: None,
        }
    }

    /// Create config for the server (stderr plus file)
    pub fn server() -> Self {
        Self {
            output: LogOutput::Both,
            filter: std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "info".into()),
            span_events: false,
            file_line: true,
            file_name: Some("scenebridge-server.log".into()),
        }
    }
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| SceneBridgeError::config(format!("Invalid log filter: {}", e)))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let fmt_layer = if config.span_events {
        fmt_layer.with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
    } else {
        fmt_layer
    };

    let fmt_layer = if config.file_line {
        fmt_layer.with_file(true).with_line_number(true)
    } else {
        fmt_layer.with_file(false).with_line_number(false)
    };

    let file_name = config.file_name.as_deref().unwrap_or("scenebridge.log");

    match config.output {
        LogOutput::Stderr => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| SceneBridgeError::internal(format!("Failed to init logging: {}", e)))?;
        }
        LogOutput::Both => {
            let file = open_log_file(&paths::log_dir(), file_name)?;

            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer.with_writer(std::io::stderr))
                .with(file_layer)
                .try_init()
                .map_err(|e| SceneBridgeError::internal(format!("Failed to init logging: {}", e)))?;
        }
    }

    Ok(())
}

/// Open (creating if needed) an append-mode log file inside `dir`
fn open_log_file(dir: &Path, file_name: &str) -> Result<File> {
    std::fs::create_dir_all(dir).map_err(|e| SceneBridgeError::FileWrite {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let log_path = dir.join(file_name);
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| SceneBridgeError::FileWrite {
            path: log_path,
            source: e,
        })
}
