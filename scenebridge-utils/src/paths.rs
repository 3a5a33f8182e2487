//! Path utilities for scenebridge
//!
//! Handles XDG Base Directory specification compliance for the config
//! file and the log directory.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Application identifier for XDG directories
const APP_NAME: &str = "scenebridge";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", APP_NAME)
}

/// Get the configuration directory
///
/// Location: `$XDG_CONFIG_HOME/scenebridge` or `~/.config/scenebridge`
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|p| p.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback(".config"))
}

/// Get the main configuration file path
///
/// Location: `$XDG_CONFIG_HOME/scenebridge/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the state directory
///
/// Location: `$XDG_STATE_HOME/scenebridge` or `~/.local/state/scenebridge`
pub fn state_dir() -> PathBuf {
    project_dirs()
        .and_then(|p| p.state_dir().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| home_fallback(".local/state"))
}

/// Get the log directory
///
/// Location: `$XDG_STATE_HOME/scenebridge/log`
pub fn log_dir() -> PathBuf {
    state_dir().join("log")
}

fn home_fallback(relative: &str) -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(relative)
        .join(APP_NAME)
}
