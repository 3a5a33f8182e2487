//! Command-line argument parsing for the scenebridge client

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use scenebridge_protocol::{ClientMessage, CommandRequest, SEQUENCE_COMMAND};
use scenebridge_utils::{Result, SceneBridgeError};

/// scenebridge - send one command to a scenebridge server and print the reply
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Server URL
    #[arg(long, env = "SCENEBRIDGE_URL", default_value = "ws://127.0.0.1:8765")]
    pub url: String,

    /// How long to wait for the response, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Print the response on a single line
    #[arg(long, default_value_t = false)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the server's registered tools
    Tools,

    /// Run a single command
    Call {
        /// Command name (e.g. spawn_object, delete_object)
        name: String,

        /// Parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Run a batch of steps, given as a JSON array of {command, params}
    Sequence {
        steps: String,
    },

    /// Show the current scene
    Scene,
}

impl Command {
    /// Build the request message for this subcommand
    pub fn to_message(&self) -> Result<ClientMessage> {
        let request = match self {
            Self::Tools => return Ok(ClientMessage::GetTools { id: Value::Null }),
            Self::Call { name, params } => CommandRequest::new(name.clone(), parse_object(params)?),
            Self::Sequence { steps } => {
                let steps: Value = serde_json::from_str(steps)
                    .map_err(|e| SceneBridgeError::protocol(format!("Invalid steps: {}", e)))?;
                if !steps.is_array() {
                    return Err(SceneBridgeError::protocol("Steps must be a JSON array"));
                }
                let mut params = Map::new();
                params.insert("steps".into(), steps);
                CommandRequest::new(SEQUENCE_COMMAND, params)
            }
            Self::Scene => CommandRequest::new("get_scene_info", Map::new()),
        };
        Ok(ClientMessage::Command(request))
    }
}

fn parse_object(text: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(SceneBridgeError::protocol("Parameters must be a JSON object")),
        Err(e) => Err(SceneBridgeError::protocol(format!("Invalid parameters: {}", e))),
    }
}
