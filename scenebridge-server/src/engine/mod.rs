//! Engine access: the TCP bridge and the in-memory fallback

mod bridge;
mod simulated;

pub use bridge::{is_engine_command, BridgeError, EngineBridge, ENGINE_COMMANDS};
pub use simulated::{engine_type, Blueprint, SceneObject, SimulatedEngine, SimulationError, Vec3};
