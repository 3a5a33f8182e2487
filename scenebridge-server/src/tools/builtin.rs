//! Tools registered at startup

use serde_json::{json, Map, Value};

use scenebridge_protocol::{EngineRequest, ParameterInfo};

use super::{BoxError, ToolRegistry};
use crate::engine::EngineBridge;

/// Greeting sent by `engine_handshake` when the caller supplies none
pub const DEFAULT_HANDSHAKE_MESSAGE: &str = "Hello from scenebridge";

/// Register the built-in tool catalog
pub fn register_builtin_tools(registry: &mut ToolRegistry, bridge: EngineBridge) {
    registry.register(
        "ping",
        "Liveness check, answers \"pong\"",
        vec![],
        "str",
        |_| async { Ok(Value::String("pong".into())) },
    );

    let engine_addr = bridge.addr().to_string();
    registry.register(
        "server_info",
        "Server name, version and configured engine endpoint",
        vec![],
        "dict",
        move |_| {
            let engine_addr = engine_addr.clone();
            async move {
                Ok(json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "engine": engine_addr,
                }))
            }
        },
    );

    registry.register(
        "engine_handshake",
        "Probe the engine with a handshake and return its reply",
        vec![ParameterInfo::optional(
            "message",
            "str",
            DEFAULT_HANDSHAKE_MESSAGE,
        )],
        "dict",
        move |kwargs: Map<String, Value>| {
            let bridge = bridge.clone();
            async move {
                let message = kwargs
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_HANDSHAKE_MESSAGE)
                    .to_string();
                handshake(&bridge, message).await
            }
        },
    );
}

async fn handshake(bridge: &EngineBridge, message: String) -> Result<Value, BoxError> {
    let reply = bridge.send(&EngineRequest::handshake(message)).await?;
    match reply.error_message() {
        Some(error) => Err(error.into()),
        None => Ok(Value::Object(reply.fields)),
    }
}
