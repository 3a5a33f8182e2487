//! In-memory stand-in for the engine
//!
//! Answers the engine's command vocabulary from a local object store. It
//! performs no I/O, so it can always serve as the fallback when the real
//! engine is unreachable.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use scenebridge_protocol::CommandResult;

/// A 3-component vector (location, rotation, scale or RGB colour)
pub type Vec3 = [f64; 3];

const ORIGIN: Vec3 = [0.0, 0.0, 0.0];
const UNIT_SCALE: Vec3 = [1.0, 1.0, 1.0];
const DEFAULT_COLOR: Vec3 = [1.0, 0.0, 0.0];

/// Object held in the simulated scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    /// Engine type tag (e.g. "StaticMesh", "Camera")
    #[serde(rename = "type")]
    pub kind: String,
    pub location: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<Vec3>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
}

impl SceneObject {
    pub fn new(kind: impl Into<String>, location: Vec3) -> Self {
        Self {
            kind: kind.into(),
            location,
            rotation: None,
            scale: None,
            material: None,
        }
    }
}

/// Blueprint synthesized from free-text code
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Blueprint {
    pub name: String,
    pub code: String,
    pub created_at: String,
}

/// Failures reported by simulated commands
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("Missing required parameter '{0}'")]
    MissingParam(&'static str),

    #[error("Invalid parameter '{name}': expected {expected}")]
    InvalidParam {
        name: &'static str,
        expected: &'static str,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

/// Map a simple object type name to the engine's category
pub fn engine_type(object_type: &str) -> &'static str {
    match object_type.to_ascii_uppercase().as_str() {
        "CUBE" | "SPHERE" | "PLANE" | "CYLINDER" | "CONE" => "StaticMesh",
        "CAMERA" => "Camera",
        "LIGHT" => "Light",
        _ => "StaticMesh",
    }
}

/// Deterministic in-memory scene
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine {
    objects: BTreeMap<String, SceneObject>,
    blueprints: Vec<Blueprint>,
    materials: BTreeMap<String, Vec3>,
}

impl SimulatedEngine {
    /// An empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// A scene holding one cube at the origin and one camera
    pub fn with_default_scene() -> Self {
        let mut engine = Self::new();

        let mut cube = SceneObject::new("StaticMesh", ORIGIN);
        cube.scale = Some(UNIT_SCALE);
        engine.objects.insert("Cube_1".into(), cube);

        let mut camera = SceneObject::new("Camera", [0.0, -10.0, 2.0]);
        camera.rotation = Some(ORIGIN);
        engine.objects.insert("Camera_1".into(), camera);

        engine
    }

    pub fn object(&self, name: &str) -> Option<&SceneObject> {
        self.objects.get(name)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Execute one command against the scene
    ///
    /// Total over all inputs: every command, known or not, yields a result.
    pub fn execute(&mut self, command: &str, params: &Map<String, Value>) -> CommandResult {
        debug!(command, "Simulating command");
        match self.apply(command, params) {
            Ok(result) => CommandResult::success(result),
            Err(e) => CommandResult::error(e.to_string()),
        }
    }

    fn apply(&mut self, command: &str, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        match command {
            "spawn" | "spawn_object" => self.spawn(params),
            "create_object" => self.create_object(params),
            "modify_object" => self.modify_object(params),
            "set_object_position" => self.set_object_position(params),
            "set_object_material" => self.set_object_material(params),
            "create_material" => self.create_material(params),
            "delete_object" => self.delete_object(params),
            "get_scene_info" => Ok(self.scene_info()),
            "execute_blender_code" | "execute_unreal_code" | "execute_code" => {
                self.execute_code(params)
            }
            other => Err(SimulationError::UnknownCommand(other.to_string())),
        }
    }

    fn spawn(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let class = string_param(params, "actor_class")?.unwrap_or("Cube").to_string();
        let location = vec3_param(params, "location")?.unwrap_or(ORIGIN);
        let rotation = vec3_param(params, "rotation")?.unwrap_or(ORIGIN);
        let scale = vec3_param(params, "scale")?.unwrap_or(UNIT_SCALE);
        let label = match string_param(params, "actor_label")? {
            Some(label) => label.to_string(),
            None => format!("{}_{}", class, self.objects.len() + 1),
        };

        let mut object = SceneObject::new(class.clone(), location);
        object.rotation = Some(rotation);
        object.scale = Some(scale);
        self.objects.insert(label.clone(), object);

        Ok(Value::String(format!(
            "Created {} named '{}' at location {}",
            class,
            label,
            fmt_vec3(&location)
        )))
    }

    fn create_object(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let object_type = string_param(params, "type")?.unwrap_or("CUBE").to_string();
        let location = vec3_param(params, "location")?.unwrap_or(ORIGIN);
        let scale = vec3_param(params, "scale")?.unwrap_or(UNIT_SCALE);
        let name = match string_param(params, "name")? {
            Some(name) => name.to_string(),
            None => format!("{}_{}", object_type, self.objects.len() + 1),
        };

        let mut object = SceneObject::new(engine_type(&object_type), location);
        object.rotation = vec3_param(params, "rotation")?;
        object.scale = Some(scale);
        self.objects.insert(name.clone(), object);

        Ok(Value::String(format!(
            "Created {} named '{}' at location {}",
            object_type,
            name,
            fmt_vec3(&location)
        )))
    }

    fn modify_object(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let name = required_string(params, "name")?;
        let location = vec3_param(params, "location")?;
        let rotation = vec3_param(params, "rotation")?;
        let scale = vec3_param(params, "scale")?;

        let object = self.object_mut(name)?;
        if let Some(location) = location {
            object.location = location;
        }
        if rotation.is_some() {
            object.rotation = rotation;
        }
        if scale.is_some() {
            object.scale = scale;
        }

        Ok(Value::String(format!("Modified object '{}'", name)))
    }

    fn set_object_position(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let name = required_string(params, "actor_name")?;
        let position = vec3_param(params, "position")?.unwrap_or(ORIGIN);

        self.object_mut(name)?.location = position;

        Ok(Value::String(format!(
            "Set position of '{}' to {}",
            name,
            fmt_vec3(&position)
        )))
    }

    fn set_object_material(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let name = required_string(params, "actor_name")?;
        let path = required_string(params, "material_path")?;

        self.object_mut(name)?.material = Some(path.to_string());

        Ok(Value::String(format!(
            "Applied material '{}' to object '{}'",
            path, name
        )))
    }

    fn create_material(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let name = match string_param(params, "material_name")? {
            Some(name) => name.to_string(),
            None => format!("Material_{}", self.objects.len() + 1),
        };
        let color = vec3_param(params, "color")?.unwrap_or(DEFAULT_COLOR);

        self.materials.insert(name.clone(), color);

        Ok(Value::String(format!(
            "Created material '{}' with color RGB({}, {}, {})",
            name, color[0], color[1], color[2]
        )))
    }

    fn delete_object(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let name = required_string(params, "name")?;
        self.objects
            .remove(name)
            .ok_or_else(|| SimulationError::NotFound(name.to_string()))?;

        Ok(Value::String(format!("Deleted object '{}'", name)))
    }

    fn scene_info(&self) -> Value {
        let objects: Vec<Value> = self
            .objects
            .iter()
            .map(|(name, object)| {
                let mut entry = match serde_json::to_value(object) {
                    Ok(Value::Object(map)) => map,
                    _ => Map::new(),
                };
                entry.insert("name".into(), Value::String(name.clone()));
                Value::Object(entry)
            })
            .collect();
        let blueprints: Vec<&str> = self.blueprints.iter().map(|b| b.name.as_str()).collect();
        let materials: Vec<Value> = self
            .materials
            .iter()
            .map(|(name, color)| json!({"name": name, "color": color}))
            .collect();

        json!({
            "objects": objects,
            "blueprints": blueprints,
            "materials": materials,
            "timestamp": scenebridge_protocol::result::now(),
        })
    }

    fn execute_code(&mut self, params: &Map<String, Value>) -> Result<Value, SimulationError> {
        let code = string_param(params, "code")?.unwrap_or_default();

        if code.to_lowercase().contains("blueprint") {
            let name = format!("Blueprint_{}", self.blueprints.len() + 1);
            self.blueprints.push(Blueprint {
                name: name.clone(),
                code: code.to_string(),
                created_at: scenebridge_protocol::result::now(),
            });
            return Ok(Value::String(format!(
                "Created blueprint '{}' with the following logic:\n{}",
                name, code
            )));
        }

        Ok(Value::String(format!("Executed code in engine: {}", code)))
    }

    fn object_mut(&mut self, name: &str) -> Result<&mut SceneObject, SimulationError> {
        self.objects
            .get_mut(name)
            .ok_or_else(|| SimulationError::NotFound(name.to_string()))
    }
}

fn string_param<'a>(
    params: &'a Map<String, Value>,
    name: &'static str,
) -> Result<Option<&'a str>, SimulationError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(SimulationError::InvalidParam {
            name,
            expected: "a string",
        }),
    }
}

fn required_string<'a>(
    params: &'a Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, SimulationError> {
    string_param(params, name)?.ok_or(SimulationError::MissingParam(name))
}

fn vec3_param(params: &Map<String, Value>, name: &'static str) -> Result<Option<Vec3>, SimulationError> {
    let invalid = || SimulationError::InvalidParam {
        name,
        expected: "[x, y, z]",
    };

    let items = match params.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) if items.len() == 3 => items,
        Some(_) => return Err(invalid()),
    };

    let mut out = ORIGIN;
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64().ok_or_else(invalid)?;
    }
    Ok(Some(out))
}

/// Render a vector the way it appears in result messages
fn fmt_vec3(v: &Vec3) -> String {
    format!("[{}, {}, {}]", v[0], v[1], v[2])
}
