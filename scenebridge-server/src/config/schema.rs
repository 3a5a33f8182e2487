//! Configuration schema structs

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub dispatch: DispatchConfig,
    pub simulation: SimulationConfig,
}

/// Inbound WebSocket listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8765,
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Outbound engine endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    /// Connect and read bound per call, in milliseconds
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 9877,
            timeout_ms: 5000,
        }
    }
}

impl EngineConfig {
    /// `host:port` string of the engine
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Command dispatch settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum nesting of `sequence` inside `sequence`
    pub max_sequence_depth: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_sequence_depth: 4,
        }
    }
}

/// Simulated engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed the store with `Cube_1` and `Camera_1`
    pub seed_default_scene: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed_default_scene: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8765");
        assert_eq!(config.engine.addr(), "127.0.0.1:9877");
        assert_eq!(config.engine.timeout(), Duration::from_secs(5));
        assert_eq!(config.dispatch.max_sequence_depth, 4);
        assert!(config.simulation.seed_default_scene);
    }
}
