//! Documents exchanged with the external engine
//!
//! One request document per connection: the command parameters augmented
//! with a `type` field. The engine answers with one document of the form
//! `{"success": bool, "message"|"error": ..., ...}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::result::CommandResult;

/// Request sent to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    /// Engine-side operation (e.g. "handshake", "spawn")
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl EngineRequest {
    /// Build a request; a `type` key inside `params` is dropped in favour of `kind`
    pub fn new(kind: impl Into<String>, mut params: Map<String, Value>) -> Self {
        params.remove("type");
        Self {
            kind: kind.into(),
            params,
        }
    }

    /// Handshake request used to check the engine is alive
    pub fn handshake(message: impl Into<String>) -> Self {
        let mut params = Map::new();
        params.insert("message".into(), Value::String(message.into()));
        Self::new("handshake", params)
    }
}

/// Reply received from the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReply {
    pub success: bool,
    /// Remaining fields: `message`, `error` and command-specific data
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EngineReply {
    /// Human-readable failure reported by the engine
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        let text = ["error", "message"]
            .iter()
            .find_map(|key| self.fields.get(*key))
            .map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "Engine reported failure".to_string());
        Some(text)
    }

    /// Convert the engine's answer into a command result
    ///
    /// A successful reply yields its fields (without `success`) as the
    /// payload; a failed reply yields its `error` (or `message`).
    pub fn into_result(self) -> CommandResult {
        match self.error_message() {
            Some(error) => CommandResult::error(error),
            None => CommandResult::success(Value::Object(self.fields)),
        }
    }
}
