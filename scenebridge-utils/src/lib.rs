//! scenebridge-utils: Common utilities shared across scenebridge crates
//!
//! This crate provides:
//! - Unified error types ([`SceneBridgeError`], [`Result`])
//! - Logging infrastructure ([`init_logging_with_config`], [`LogConfig`])
//! - XDG-compliant path utilities ([`paths`] module)

pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Result, SceneBridgeError};
pub use logging::{init_logging_with_config, LogConfig, LogOutput};
pub use paths::{config_dir, config_file, log_dir, state_dir};
