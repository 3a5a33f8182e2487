//! Error types for scenebridge
//!
//! Provides a unified error type used across all scenebridge crates.

use std::path::PathBuf;

/// Main error type for scenebridge operations
#[derive(Debug, thiserror::Error)]
pub enum SceneBridgeError {
    // === IO Errors ===

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // === Connection Errors ===

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Connection timeout after {millis}ms")]
    ConnectionTimeout { millis: u64 },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    // === Protocol Errors ===

    #[error("Protocol error: {0}")]
    Protocol(String),

    // === Configuration Errors ===

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    // === Internal Errors ===

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SceneBridgeError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using SceneBridgeError
pub type Result<T> = std::result::Result<T, SceneBridgeError>;
