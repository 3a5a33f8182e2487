//! Client-server message types
//!
//! Inbound messages arrive as one JSON document per WebSocket text frame.
//! Two command envelopes are accepted and normalize to the same
//! [`CommandRequest`]:
//!
//! ```text
//! {"type":"mcp_command","command":"<name>","params":{...},"id":<opaque>}
//! {"command":"<name>","params":{...},"id":<opaque>}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::result::CommandResult;
use crate::tool::ToolDescriptor;
use crate::{GET_TOOLS, MCP_COMMAND};

/// A normalized command request
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// Caller-supplied correlation token, `Null` when absent
    pub id: Value,
    pub command: String,
    pub params: Map<String, Value>,
}

impl CommandRequest {
    pub fn new(command: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            id: Value::Null,
            command: command.into(),
            params,
        }
    }

    /// Attach a correlation id
    pub fn with_id(mut self, id: impl Into<Value>) -> Self {
        self.id = id.into();
        self
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// Execute a command (either envelope)
    Command(CommandRequest),
    /// List registered tools
    GetTools { id: Value },
}

/// Reasons an inbound document could not be turned into a [`ClientMessage`]
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Unknown message type")]
    UnknownType { id: Value, kind: String },

    #[error("Unknown message format")]
    UnknownFormat { id: Value },
}

impl MessageError {
    /// The error response owed to the sender
    ///
    /// Decode failures carry no `id`; shape failures echo the `id` (or null).
    pub fn to_response(&self) -> ServerMessage {
        match self {
            Self::InvalidJson(_) => ServerMessage::Error {
                id: None,
                error: self.to_string(),
            },
            Self::UnknownType { id, .. } | Self::UnknownFormat { id } => ServerMessage::Error {
                id: Some(id.clone()),
                error: self.to_string(),
            },
        }
    }
}

impl ClientMessage {
    /// Decode one inbound text frame
    pub fn decode(text: &str) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_str(text).map_err(MessageError::InvalidJson)?;
        Self::from_value(value)
    }

    /// Normalize an already-parsed JSON document
    pub fn from_value(value: Value) -> Result<Self, MessageError> {
        let Value::Object(mut object) = value else {
            return Err(MessageError::UnknownFormat { id: Value::Null });
        };

        let id = object.remove("id").unwrap_or(Value::Null);

        match object.get("type").cloned() {
            Some(Value::String(kind)) if kind == GET_TOOLS => Ok(Self::GetTools { id }),
            Some(Value::String(kind)) if kind == MCP_COMMAND => {
                Self::command_from_object(id, object)
            }
            Some(Value::String(kind)) => Err(MessageError::UnknownType { id, kind }),
            Some(other) => Err(MessageError::UnknownType {
                id,
                kind: other.to_string(),
            }),
            None if object.contains_key("command") => Self::command_from_object(id, object),
            None => Err(MessageError::UnknownFormat { id }),
        }
    }

    fn command_from_object(id: Value, mut object: Map<String, Value>) -> Result<Self, MessageError> {
        let command = match object.remove("command") {
            Some(Value::String(command)) => command,
            _ => return Err(MessageError::UnknownFormat { id }),
        };

        let params = match object.remove("params") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(params)) => params,
            Some(_) => return Err(MessageError::UnknownFormat { id }),
        };

        Ok(Self::Command(CommandRequest {
            id,
            command,
            params,
        }))
    }

    /// Encode as the canonical `mcp_command` / `get_tools` envelope
    ///
    /// A `Null` id is omitted, which the decoder reads back as `Null`.
    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        let id = match self {
            Self::Command(request) => {
                object.insert("type".into(), MCP_COMMAND.into());
                object.insert("command".into(), request.command.clone().into());
                object.insert("params".into(), Value::Object(request.params.clone()));
                &request.id
            }
            Self::GetTools { id } => {
                object.insert("type".into(), GET_TOOLS.into());
                id
            }
        };
        if !id.is_null() {
            object.insert("id".into(), id.clone());
        }
        Value::Object(object)
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> String {
        self.to_value().to_string()
    }
}

/// Id reported by uncorrelated errors
static NULL_ID: Value = Value::Null;

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Result of a command, correlated by `id`
    #[serde(rename = "mcp_response")]
    McpResponse {
        #[serde(default)]
        id: Value,
        result: CommandResult,
    },

    /// Tool catalog, correlated by `id`
    #[serde(rename = "tools_response")]
    ToolsResponse {
        #[serde(default)]
        id: Value,
        tools: Vec<ToolDescriptor>,
    },

    /// Envelope-level failure
    #[serde(rename = "error")]
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        error: String,
    },
}

impl ServerMessage {
    /// Correlation id carried by this message, `Null` when absent
    pub fn id(&self) -> &Value {
        match self {
            Self::McpResponse { id, .. } | Self::ToolsResponse { id, .. } => id,
            Self::Error { id: Some(id), .. } => id,
            Self::Error { id: None, .. } => &NULL_ID,
        }
    }

    /// Encode as a JSON text frame
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
