//! Configuration management for scenebridge server
//!
//! Configuration is read once at startup: defaults, then an optional TOML
//! file, then command-line/environment overrides applied by `main`.

mod defaults;
mod loader;
mod schema;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::ConfigLoader;
pub use schema::*;
