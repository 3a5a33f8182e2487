//! Outbound bridge to the external engine
//!
//! Each call opens a fresh TCP connection, writes one JSON document and
//! reads one JSON document back. Connect, write and read are each bounded
//! by the configured timeout. There are no retries; the caller decides what
//! to do with a failure.

use std::future::Future;
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use serde_json::{Map, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use scenebridge_protocol::{CodecError, EngineReply, EngineRequest, JsonDocumentCodec};

/// Commands the engine accepts directly
pub const ENGINE_COMMANDS: &[&str] = &[
    "spawn",
    "spawn_object",
    "create_material",
    "set_object_material",
    "set_object_position",
];

/// Whether `command` belongs to the class relayed to the engine
pub fn is_engine_command(command: &str) -> bool {
    ENGINE_COMMANDS.contains(&command)
}

/// Engine-side request type for a client command
fn engine_kind(command: &str) -> &str {
    match command {
        "spawn_object" => "spawn",
        other => other,
    }
}

/// Transport-level failures talking to the engine
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Connection timeout to engine")]
    ConnectTimeout,

    #[error("Timed out waiting for engine response")]
    ResponseTimeout,

    #[error("{0}")]
    Connect(#[source] std::io::Error),

    #[error("Failed to send request to engine: {0}")]
    Send(#[source] CodecError),

    #[error("Failed to read engine response: {0}")]
    Receive(#[source] std::io::Error),

    #[error("Empty response from engine")]
    EmptyResponse,

    #[error("Malformed engine response: {0}")]
    Malformed(String),
}

/// Client for the engine's request/reply socket
///
/// Holds only the endpoint and timeout, so clones are independent.
#[derive(Debug, Clone)]
pub struct EngineBridge {
    addr: String,
    timeout: Duration,
}

impl EngineBridge {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Relay a client command to the engine
    pub async fn execute(
        &self,
        command: &str,
        params: &Map<String, Value>,
    ) -> Result<EngineReply, BridgeError> {
        let request = EngineRequest::new(engine_kind(command), params.clone());
        self.send(&request).await
    }

    /// Send one request and wait for one reply
    pub async fn send(&self, request: &EngineRequest) -> Result<EngineReply, BridgeError> {
        let started = Instant::now();

        let stream =
            connect_within(&self.addr, self.timeout, TcpStream::connect(self.addr.as_str())).await?;
        let mut framed = Framed::new(stream, JsonDocumentCodec::new());

        timeout(self.timeout, framed.send(request))
            .await
            .map_err(|_| BridgeError::ResponseTimeout)?
            .map_err(BridgeError::Send)?;

        let document = match timeout(self.timeout, framed.next()).await {
            Err(_) => return Err(BridgeError::ResponseTimeout),
            Ok(None) => return Err(BridgeError::EmptyResponse),
            Ok(Some(Err(CodecError::Io(e)))) => return Err(BridgeError::Receive(e)),
            Ok(Some(Err(e))) => return Err(BridgeError::Malformed(e.to_string())),
            Ok(Some(Ok(document))) => document,
        };

        let reply: EngineReply = serde_json::from_value(document)
            .map_err(|e| BridgeError::Malformed(e.to_string()))?;

        debug!(
            kind = %request.kind,
            success = reply.success,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine replied"
        );
        Ok(reply)
    }
}

/// Bound a connect attempt to `addr` by `limit`
async fn connect_within<F>(addr: &str, limit: Duration, connect: F) -> Result<TcpStream, BridgeError>
where
    F: Future<Output = std::io::Result<TcpStream>>,
{
    match timeout(limit, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => {
            warn!(%addr, error = %e, "Failed to connect to engine");
            Err(BridgeError::Connect(e))
        }
        Err(_) => {
            warn!(%addr, "Connection to engine timed out");
            Err(BridgeError::ConnectTimeout)
        }
    }
}
