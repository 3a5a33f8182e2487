//! scenebridge server - WebSocket command bridge

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use scenebridge_server::config::{AppConfig, ConfigLoader, DEFAULT_CONFIG_TOML};
use scenebridge_server::{build_dispatcher, ConnectionHub};
use scenebridge_utils::{init_logging_with_config, LogConfig, Result};

/// scenebridge - relay scene commands from WebSocket clients to the engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, short = 'c', env = "SCENEBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Listen host
    #[arg(long, env = "SCENEBRIDGE_HOST")]
    host: Option<String>,

    /// Listen port
    #[arg(long, short = 'p', env = "SCENEBRIDGE_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Engine host
    #[arg(long, env = "SCENEBRIDGE_ENGINE_HOST")]
    engine_host: Option<String>,

    /// Engine port
    #[arg(long, env = "SCENEBRIDGE_ENGINE_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    engine_port: Option<u16>,

    /// Engine connect/read timeout in milliseconds
    #[arg(long, env = "SCENEBRIDGE_ENGINE_TIMEOUT_MS", value_parser = clap::value_parser!(u64).range(1..))]
    engine_timeout_ms: Option<u64>,

    /// Print the default configuration file and exit
    #[arg(long)]
    print_default_config: bool,
}

impl Cli {
    /// Apply flag and environment overrides on top of the file config
    ///
    /// Out-of-range values are rejected while parsing, so every override
    /// here keeps the config valid.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.engine_host {
            config.engine.host = host.clone();
        }
        if let Some(port) = self.engine_port {
            config.engine.port = port;
        }
        if let Some(timeout_ms) = self.engine_timeout_ms {
            config.engine.timeout_ms = timeout_ms;
        }
    }
}

fn load_config(cli: &Cli) -> AppConfig {
    let mut config = match ConfigLoader::load_and_validate(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring configuration ({}), using defaults", e);
            AppConfig::default()
        }
    };

    cli.apply(&mut config);
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        print!("{}", DEFAULT_CONFIG_TOML);
        return Ok(());
    }

    if let Err(e) = init_logging_with_config(LogConfig::server()) {
        eprintln!("scenebridge-server: logging unavailable: {}", e);
    }

    info!("scenebridge server starting");

    let config = load_config(&cli);
    let dispatcher = Arc::new(build_dispatcher(&config));

    let bind_addr = config.server.bind_addr();
    let hub = match ConnectionHub::bind(&bind_addr, dispatcher).await {
        Ok(hub) => hub,
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    };

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    hub.run(shutdown_rx).await;

    info!("scenebridge server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "scenebridge-server",
            "--port",
            "9000",
            "--engine-host",
            "10.0.0.2",
            "--engine-timeout-ms",
            "250",
        ]);
        let mut config = AppConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.engine.addr(), "10.0.0.2:9877");
        assert_eq!(config.engine.timeout_ms, 250);
    }

    #[test]
    fn test_invalid_config_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\ntimeout_ms = 0\n").unwrap();

        let cli = Cli::parse_from([
            "scenebridge-server",
            "--config",
            path.to_str().unwrap(),
        ]);
        assert_eq!(load_config(&cli).engine.timeout_ms, 5000);
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        for args in [
            ["scenebridge-server", "--engine-timeout-ms", "0"],
            ["scenebridge-server", "--engine-port", "0"],
            ["scenebridge-server", "--port", "0"],
        ] {
            assert!(Cli::try_parse_from(args).is_err(), "{args:?} accepted");
        }
    }

    #[test]
    fn test_override_keeps_file_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nport = 9100\n\n[dispatch]\nmax_sequence_depth = 2\n").unwrap();

        let cli = Cli::parse_from([
            "scenebridge-server",
            "--config",
            path.to_str().unwrap(),
            "--engine-timeout-ms",
            "250",
        ]);
        let config = load_config(&cli);
        assert_eq!(config.engine.port, 9100);
        assert_eq!(config.engine.timeout_ms, 250);
        assert_eq!(config.dispatch.max_sequence_depth, 2);
    }
}
