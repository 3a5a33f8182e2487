//! scenebridge client - one-shot command line client

mod cli;
mod connection;

use std::time::Duration;

use clap::Parser;
use tracing::debug;

use scenebridge_protocol::ServerMessage;
use scenebridge_utils::{init_logging_with_config, LogConfig, Result, SceneBridgeError};

use cli::Args;
use connection::Connection;

/// Whether the response reports a failure
fn is_failure(response: &ServerMessage) -> bool {
    match response {
        ServerMessage::McpResponse { result, .. } => result.is_error(),
        ServerMessage::ToolsResponse { .. } => false,
        ServerMessage::Error { .. } => true,
    }
}

async fn run(args: Args) -> Result<bool> {
    let message = args.command.to_message()?;
    let timeout = Duration::from_millis(args.timeout_ms);

    let mut conn = Connection::connect(&args.url, timeout).await?;
    let response = conn.request(message).await?;
    if let Err(e) = conn.close().await {
        debug!("Close failed: {}", e);
    }

    let rendered = if args.compact {
        serde_json::to_string(&response)
    } else {
        serde_json::to_string_pretty(&response)
    }
    .map_err(|e| SceneBridgeError::internal(e.to_string()))?;
    println!("{}", rendered);

    Ok(!is_failure(&response))
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = init_logging_with_config(LogConfig::client()) {
        eprintln!("scenebridge: logging unavailable: {}", e);
    }

    let args = Args::parse();
    if !run(args).await? {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenebridge_protocol::CommandResult;
    use serde_json::Value;

    #[test]
    fn test_failure_detection() {
        let ok = ServerMessage::McpResponse {
            id: Value::Null,
            result: CommandResult::success("done"),
        };
        let failed = ServerMessage::McpResponse {
            id: Value::Null,
            result: CommandResult::error("Object 'X' not found"),
        };
        let envelope = ServerMessage::Error {
            id: None,
            error: "Invalid JSON".into(),
        };

        assert!(!is_failure(&ok));
        assert!(is_failure(&failed));
        assert!(is_failure(&envelope));
    }
}
