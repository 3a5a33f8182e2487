//! scenebridge-protocol: Shared wire definitions
//!
//! This crate defines the JSON messages exchanged between WebSocket clients
//! and the scenebridge server, the result envelope every command produces,
//! tool metadata used for capability discovery, and the request/reply
//! documents (plus stream codec) used to talk to the external engine.

pub mod codec;
pub mod engine;
pub mod messages;
pub mod result;
pub mod tool;

// Re-export main types at crate root
pub use codec::{CodecError, JsonDocumentCodec};
pub use engine::{EngineReply, EngineRequest};
pub use messages::{ClientMessage, CommandRequest, MessageError, ServerMessage};
pub use result::CommandResult;
pub use tool::{ParameterInfo, ToolDescriptor};

/// Envelope `type` for command requests and responses
pub const MCP_COMMAND: &str = "mcp_command";
/// Envelope `type` for tool discovery requests
pub const GET_TOOLS: &str = "get_tools";
/// Command name of the batch command
pub const SEQUENCE_COMMAND: &str = "sequence";
