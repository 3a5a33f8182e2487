//! Tool metadata exposed for capability discovery

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    /// Parameter name (keyword used in `params`)
    pub name: String,
    /// Declared type name, informational only
    #[serde(rename = "type")]
    pub param_type: String,
    /// Whether the caller must supply the parameter
    pub required: bool,
    /// Value used when an optional parameter is omitted
    #[serde(default)]
    pub default: Option<Value>,
}

impl ParameterInfo {
    /// A required parameter
    pub fn required(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: true,
            default: None,
        }
    }

    /// An optional parameter with a default value
    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        default: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            required: false,
            default: Some(default.into()),
        }
    }
}

/// Public description of a registered tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParameterInfo>,
    pub return_type: String,
}
