//! Configuration loader

use std::path::Path;

use scenebridge_utils::{config_file, Result, SceneBridgeError};

use super::AppConfig;

/// Upper bound for `dispatch.max_sequence_depth`
const MAX_SEQUENCE_DEPTH_LIMIT: usize = 16;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| SceneBridgeError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| SceneBridgeError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.server.port == 0 {
            return Err(SceneBridgeError::config("server.port must be non-zero"));
        }

        if config.engine.port == 0 {
            return Err(SceneBridgeError::config("engine.port must be non-zero"));
        }

        if config.engine.timeout_ms == 0 {
            return Err(SceneBridgeError::config("engine.timeout_ms must be at least 1"));
        }

        let depth = config.dispatch.max_sequence_depth;
        if depth == 0 || depth > MAX_SEQUENCE_DEPTH_LIMIT {
            return Err(SceneBridgeError::config(format!(
                "dispatch.max_sequence_depth must be between 1 and {}",
                MAX_SEQUENCE_DEPTH_LIMIT
            )));
        }

        Ok(())
    }

    /// Load from an explicit path (or the default location) and validate
    pub fn load_and_validate(path: Option<&Path>) -> Result<AppConfig> {
        let config = match path {
            Some(path) => Self::load_from_path(path)?,
            None => Self::load()?,
        };
        Self::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(
            &path,
            r#"
            [server]
            port = 9000

            [engine]
            host = "10.0.0.5"
            "#,
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.engine.host, "10.0.0.5");
        assert_eq!(config.engine.port, 9877);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempdir().unwrap();
        let result = ConfigLoader::load_and_validate(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(SceneBridgeError::FileRead { .. })));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = AppConfig::default();
        config.engine.timeout_ms = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_validate_depth_bounds() {
        let mut config = AppConfig::default();
        config.dispatch.max_sequence_depth = 0;
        assert!(ConfigLoader::validate(&config).is_err());

        config.dispatch.max_sequence_depth = MAX_SEQUENCE_DEPTH_LIMIT + 1;
        assert!(ConfigLoader::validate(&config).is_err());

        config.dispatch.max_sequence_depth = MAX_SEQUENCE_DEPTH_LIMIT;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(ConfigLoader::validate(&config).is_err());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let result = ConfigLoader::parse("invalid { toml", Path::new("test.toml"));
        assert!(matches!(result, Err(SceneBridgeError::ConfigInvalid { .. })));
    }
}
