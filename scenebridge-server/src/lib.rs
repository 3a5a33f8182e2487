//! scenebridge server
//!
//! Accepts WebSocket clients, routes each command to a local tool, the
//! external engine or the in-memory simulated engine, and answers with a
//! correlated result.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod hub;
pub mod session;
pub mod tools;

use std::sync::Arc;

use tracing::info;

pub use config::AppConfig;
pub use dispatch::Dispatcher;
pub use engine::{EngineBridge, SimulatedEngine};
pub use hub::ConnectionHub;
pub use tools::ToolRegistry;

/// Assemble the dispatcher described by `config`
pub fn build_dispatcher(config: &AppConfig) -> Dispatcher {
    let bridge = EngineBridge::new(config.engine.addr(), config.engine.timeout());

    let mut tools = ToolRegistry::new();
    tools::register_builtin_tools(&mut tools, bridge.clone());

    let simulation = if config.simulation.seed_default_scene {
        SimulatedEngine::with_default_scene()
    } else {
        SimulatedEngine::new()
    };

    info!(
        engine = %bridge.addr(),
        timeout_ms = config.engine.timeout_ms,
        tools = tools.len(),
        scene_objects = simulation.object_count(),
        "Dispatcher ready"
    );

    Dispatcher::new(
        Arc::new(tools),
        bridge,
        simulation,
        config.dispatch.max_sequence_depth,
    )
}
