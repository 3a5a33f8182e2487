//! Command dispatcher
//!
//! Routes one normalized command to exactly one handler, in this order:
//!
//! 1. `sequence`: run the listed steps in order and aggregate their results
//! 2. a registered tool
//! 3. an engine command: relay over the bridge, falling back to the
//!    simulated engine's answer when the bridge fails
//! 4. anything else: the simulated engine, which also reports unknown
//!    commands
//!
//! Every path resolves to a [`CommandResult`]; nothing here is fatal.

use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use scenebridge_protocol::{CommandRequest, CommandResult, ToolDescriptor, SEQUENCE_COMMAND};

use crate::engine::{is_engine_command, EngineBridge, SimulatedEngine};
use crate::tools::ToolRegistry;

/// Routes commands to tools, the engine or the simulated engine
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    bridge: EngineBridge,
    /// Shared scene; never locked across an await
    simulation: Mutex<SimulatedEngine>,
    max_sequence_depth: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.tools)
            .field("bridge", &self.bridge)
            .field("max_sequence_depth", &self.max_sequence_depth)
            .finish()
    }
}

impl Dispatcher {
    pub fn new(
        tools: Arc<ToolRegistry>,
        bridge: EngineBridge,
        simulation: SimulatedEngine,
        max_sequence_depth: usize,
    ) -> Self {
        Self {
            tools,
            bridge,
            simulation: Mutex::new(simulation),
            max_sequence_depth,
        }
    }

    /// Tool catalog for `get_tools`
    pub fn describe_tools(&self) -> Vec<ToolDescriptor> {
        self.tools.describe()
    }

    /// Dispatch a client request
    pub async fn dispatch(&self, request: &CommandRequest) -> CommandResult {
        let started = Instant::now();
        let result = self
            .dispatch_command(&request.command, &request.params)
            .await;

        info!(
            command = %request.command,
            success = result.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Dispatched command"
        );
        result
    }

    /// Dispatch a command by name
    pub async fn dispatch_command(&self, command: &str, params: &Map<String, Value>) -> CommandResult {
        self.dispatch_at_depth(command, params, 0).await
    }

    fn dispatch_at_depth<'a>(
        &'a self,
        command: &'a str,
        params: &'a Map<String, Value>,
        depth: usize,
    ) -> BoxFuture<'a, CommandResult> {
        Box::pin(async move {
            if command == SEQUENCE_COMMAND {
                return self.run_sequence(params, depth).await;
            }

            if self.tools.contains(command) {
                return match self.tools.invoke(command, params.clone()).await {
                    Ok(value) => CommandResult::success(value),
                    Err(e) => CommandResult::error(e.to_string()),
                };
            }

            if is_engine_command(command) {
                return self.relay_to_engine(command, params).await;
            }

            self.simulation.lock().execute(command, params)
        })
    }

    async fn run_sequence(&self, params: &Map<String, Value>, depth: usize) -> CommandResult {
        if depth >= self.max_sequence_depth {
            return CommandResult::error(format!(
                "Sequence nesting exceeds maximum depth of {}",
                self.max_sequence_depth
            ));
        }

        let steps = match params.get("steps") {
            Some(Value::Array(steps)) if !steps.is_empty() => steps,
            _ => return CommandResult::error("No steps provided"),
        };

        debug!(steps = steps.len(), depth, "Running sequence");

        let mut results = Vec::with_capacity(steps.len());
        for step in steps {
            let result = match parse_step(step) {
                Ok((command, step_params)) => {
                    self.dispatch_at_depth(command, &step_params, depth + 1)
                        .await
                }
                Err(error) => CommandResult::error(error),
            };
            results.push(result);
        }

        CommandResult::sequence(results)
    }

    /// Relay to the engine; on transport failure answer from the simulation
    async fn relay_to_engine(&self, command: &str, params: &Map<String, Value>) -> CommandResult {
        let fallback = self.simulation.lock().execute(command, params);

        match self.bridge.execute(command, params).await {
            Ok(reply) => reply.into_result(),
            Err(e) => {
                warn!(command, error = %e, "Engine unavailable, using simulated result");
                fallback
            }
        }
    }
}

/// Split a sequence step into its command and parameters
fn parse_step(step: &Value) -> Result<(&str, Map<String, Value>), &'static str> {
    let command = step
        .get("command")
        .and_then(Value::as_str)
        .ok_or("Invalid step: missing command")?;

    let params = match step.get("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params.clone(),
        Some(_) => return Err("Invalid step: params must be an object"),
    };

    Ok((command, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use futures::StreamExt;
    use serde_json::json;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;
    use tokio_util::codec::Framed;

    use scenebridge_protocol::{JsonDocumentCodec, ParameterInfo};

    use crate::tools::{register_builtin_tools, BoxError};

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    async fn refused_bridge() -> EngineBridge {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        EngineBridge::new(addr.to_string(), Duration::from_millis(500))
    }

    /// Engine that answers every connection with the same reply
    async fn fake_engine(reply: Value) -> EngineBridge {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let reply = reply.to_string();
                tokio::spawn(async move {
                    let mut framed = Framed::new(&mut socket, JsonDocumentCodec::new());
                    let _ = framed.next().await;
                    drop(framed);
                    let _ = socket.write_all(reply.as_bytes()).await;
                });
            }
        });
        EngineBridge::new(addr.to_string(), Duration::from_secs(2))
    }

    /// Engine that sends `reply` verbatim once per connection, or never answers on `None`
    async fn misbehaving_engine(reply: Option<&'static [u8]>) -> EngineBridge {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            match reply {
                Some(bytes) => {
                    let mut framed = Framed::new(&mut socket, JsonDocumentCodec::new());
                    let _ = framed.next().await;
                    drop(framed);
                    let _ = socket.write_all(bytes).await;
                    let _ = socket.shutdown().await;
                }
                None => tokio::time::sleep(Duration::from_secs(5)).await,
            }
        });
        EngineBridge::new(addr.to_string(), Duration::from_millis(200))
    }

    fn dispatcher(bridge: EngineBridge, scene: SimulatedEngine) -> Dispatcher {
        let mut tools = ToolRegistry::new();
        register_builtin_tools(&mut tools, bridge.clone());
        tools.register(
            "fail",
            "Always fails",
            vec![ParameterInfo::required("reason", "str")],
            "None",
            |kwargs: Map<String, Value>| async move {
                let reason = kwargs["reason"].as_str().unwrap_or_default().to_string();
                Err::<Value, BoxError>(reason.into())
            },
        );
        Dispatcher::new(Arc::new(tools), bridge, scene, 4)
    }

    #[tokio::test]
    async fn test_fallback_matches_simulated_engine() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::with_default_scene());
        let mut reference = SimulatedEngine::with_default_scene();

        let commands = [
            ("spawn_object", json!({"actor_class": "Cube"})),
            ("spawn", json!({"actor_class": "Sphere", "location": [1, 2, 3]})),
            ("create_material", json!({"color": [0, 1, 0]})),
            ("set_object_material", json!({"actor_name": "Cube_3", "material_path": "/Game/M"})),
            ("set_object_position", json!({"actor_name": "Ghost", "position": [0, 0, 1]})),
        ];

        for (command, p) in commands {
            let p = params(p);
            let via_dispatch = d.dispatch_command(command, &p).await;
            let direct = reference.execute(command, &p);
            assert!(
                via_dispatch.same_outcome(&direct),
                "{command}: {via_dispatch:?} != {direct:?}"
            );
        }
    }

    #[tokio::test]
    async fn test_fallback_on_each_transport_failure() {
        let cases: [(&str, Option<&'static [u8]>); 4] = [
            ("garbage", Some(b"<html>nope</html>".as_slice())),
            ("empty", Some(b"".as_slice())),
            ("non-boolean success", Some(br#"{"success":"yes"}"#.as_slice())),
            ("silent", None),
        ];
        let p = params(json!({"actor_class": "Cube"}));

        for (label, reply) in cases {
            let d = dispatcher(misbehaving_engine(reply).await, SimulatedEngine::with_default_scene());
            let result = d.dispatch_command("spawn_object", &p).await;
            let expected = SimulatedEngine::with_default_scene().execute("spawn_object", &p);
            assert!(result.is_success(), "{label}: {result:?}");
            assert!(result.same_outcome(&expected), "{label}: {result:?} != {expected:?}");
        }
    }

    #[tokio::test]
    async fn test_spawn_without_label_when_engine_down() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::with_default_scene());

        let result = d
            .dispatch(&CommandRequest::new("spawn_object", params(json!({"actor_class": "Cube"}))))
            .await;

        assert!(result.is_success());
        let message = result.result().unwrap().as_str().unwrap();
        assert!(message.contains("'Cube_3'"), "{message}");
    }

    #[tokio::test]
    async fn test_engine_reply_wins_when_reachable() {
        let bridge = fake_engine(json!({"success": true, "message": "Spawned in engine"})).await;
        let d = dispatcher(bridge, SimulatedEngine::new());

        let result = d.dispatch_command("spawn_object", &Map::new()).await;
        assert_eq!(result.result(), Some(&json!({"message": "Spawned in engine"})));
    }

    #[tokio::test]
    async fn test_engine_failure_reply_is_not_replaced() {
        let bridge = fake_engine(json!({"success": false, "error": "Class not loaded"})).await;
        let d = dispatcher(bridge, SimulatedEngine::new());

        let result = d.dispatch_command("spawn_object", &Map::new()).await;
        assert_eq!(result.error_message(), Some("Class not loaded"));
    }

    #[tokio::test]
    async fn test_non_engine_commands_skip_bridge() {
        let bridge = fake_engine(json!({"success": true, "message": "should not be used"})).await;
        let d = dispatcher(bridge, SimulatedEngine::with_default_scene());

        let result = d
            .dispatch_command("delete_object", &params(json!({"name": "Cube_1"})))
            .await;
        assert_eq!(result.result(), Some(&json!("Deleted object 'Cube_1'")));
    }

    #[tokio::test]
    async fn test_tool_dispatch_and_failure() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());

        let pong = d.dispatch_command("ping", &Map::new()).await;
        assert_eq!(pong.result(), Some(&json!("pong")));

        let failed = d
            .dispatch_command("fail", &params(json!({"reason": "disk on fire"})))
            .await;
        assert_eq!(failed.error_message(), Some("disk on fire"));

        let missing = d.dispatch_command("fail", &Map::new()).await;
        assert!(missing.error_message().unwrap().contains("reason"));
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());
        let result = d.dispatch_command("fly_to_moon", &Map::new()).await;
        assert_eq!(result.error_message(), Some("Unknown command: fly_to_moon"));
    }

    #[tokio::test]
    async fn test_sequence_runs_steps_in_order() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());
        let steps = json!([
            {"command": "create_object", "params": {"type": "CUBE", "name": "A"}},
            {"command": "delete_object", "params": {"name": "A"}},
            {"command": "delete_object", "params": {"name": "A"}},
            {"command": "ping"}
        ]);

        let result = d
            .dispatch_command("sequence", &params(json!({"steps": steps.clone()})))
            .await;

        assert!(result.is_success());
        assert_eq!(result.result(), Some(&json!("Executed sequence with 4 steps")));
        let results = result.steps().unwrap();
        assert_eq!(results.len(), 4);

        // Same steps one by one against a fresh store
        let isolated = dispatcher(refused_bridge().await, SimulatedEngine::new());
        for (i, step) in steps.as_array().unwrap().iter().enumerate() {
            let command = step["command"].as_str().unwrap();
            let p = step.get("params").cloned().map(params).unwrap_or_default();
            let expected = isolated.dispatch_command(command, &p).await;
            assert!(results[i].same_outcome(&expected), "step {i}");
        }

        assert_eq!(results[2].error_message(), Some("Object 'A' not found"));
    }

    #[tokio::test]
    async fn test_sequence_without_steps() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());

        for p in [json!({}), json!({"steps": []}), json!({"steps": "nope"})] {
            let result = d.dispatch_command("sequence", &params(p)).await;
            assert_eq!(result.error_message(), Some("No steps provided"));
        }
    }

    #[tokio::test]
    async fn test_sequence_invalid_step() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());
        let result = d
            .dispatch_command(
                "sequence",
                &params(json!({"steps": [{"params": {}}, {"command": "get_scene_info"}]})),
            )
            .await;

        let steps = result.steps().unwrap();
        assert_eq!(steps[0].error_message(), Some("Invalid step: missing command"));
        assert!(steps[1].is_success());
    }

    #[tokio::test]
    async fn test_nested_sequence_depth_cap() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());

        let mut nested = json!({"steps": [{"command": "ping"}]});
        for _ in 0..4 {
            nested = json!({"steps": [{"command": "sequence", "params": nested}]});
        }

        let result = d.dispatch_command("sequence", &params(nested)).await;
        assert!(result.is_success());

        // Walk down to the innermost nested result
        let mut current = &result;
        for _ in 0..3 {
            current = &current.steps().unwrap()[0];
            assert!(current.is_success());
        }
        let innermost = &current.steps().unwrap()[0];
        assert_eq!(
            innermost.error_message(),
            Some("Sequence nesting exceeds maximum depth of 4")
        );
    }

    #[tokio::test]
    async fn test_describe_tools() {
        let d = dispatcher(refused_bridge().await, SimulatedEngine::new());
        let names: Vec<_> = d.describe_tools().into_iter().map(|t| t.name).collect();
        assert!(names.contains(&"ping".to_string()));
        assert!(names.contains(&"fail".to_string()));
    }
}
