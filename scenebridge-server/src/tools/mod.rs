//! Tool registry
//!
//! Named, locally-executed operations with declared parameter metadata.
//! The registry is populated once at startup and then shared read-only
//! (behind an `Arc`) by every session.

pub mod builtin;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

use scenebridge_protocol::{ParameterInfo, ToolDescriptor};

pub use builtin::register_builtin_tools;

/// Error type tool handlers may fail with
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by a tool handler
pub type ToolFuture = BoxFuture<'static, Result<Value, BoxError>>;

type ToolHandler = Arc<dyn Fn(Map<String, Value>) -> ToolFuture + Send + Sync>;

/// Tool registry errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Missing required parameter '{parameter}' for tool '{tool}'")]
    MissingParameter { tool: String, parameter: String },

    /// The handler itself failed; displays as the bare cause
    #[error("{cause}")]
    Execution { tool: String, cause: String },
}

/// A registered tool
struct Tool {
    descriptor: ToolDescriptor,
    handler: ToolHandler,
}

/// Registry of locally executed tools, keyed by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any earlier tool with the same name
    ///
    /// Parameter metadata is captured here and never changes afterwards.
    pub fn register<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Vec<ParameterInfo>,
        return_type: impl Into<String>,
        handler: F,
    ) where
        F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        let name = name.into();
        let descriptor = ToolDescriptor {
            name: name.clone(),
            description: description.into(),
            parameters,
            return_type: return_type.into(),
        };
        let handler: ToolHandler =
            Arc::new(move |kwargs| -> ToolFuture { Box::pin(handler(kwargs)) });

        if self
            .tools
            .insert(name.clone(), Tool { descriptor, handler })
            .is_some()
        {
            debug!(tool = %name, "Replaced existing tool registration");
        }
        info!(tool = %name, "Registered tool");
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Metadata for every registered tool, ordered by name
    pub fn describe(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor.clone()).collect()
    }

    /// Invoke a tool with keyword arguments
    ///
    /// Omitted optional parameters receive their declared default; omitted
    /// required parameters are rejected before the handler runs.
    pub async fn invoke(&self, name: &str, mut kwargs: Map<String, Value>) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        for param in &tool.descriptor.parameters {
            if kwargs.contains_key(&param.name) {
                continue;
            }
            match (&param.default, param.required) {
                (_, true) => {
                    return Err(ToolError::MissingParameter {
                        tool: name.to_string(),
                        parameter: param.name.clone(),
                    });
                }
                (Some(default), false) => {
                    kwargs.insert(param.name.clone(), default.clone());
                }
                (None, false) => {}
            }
        }

        let handler = Arc::clone(&tool.handler);
        handler(kwargs).await.map_err(|e| {
            error!(tool = %name, error = %e, "Error executing tool");
            ToolError::Execution {
                tool: name.to_string(),
                cause: e.to_string(),
            }
        })
    }
}
