//! WebSocket connection to the scenebridge server

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use scenebridge_protocol::{ClientMessage, ServerMessage};
use scenebridge_utils::{Result, SceneBridgeError};

/// Client connection with request/response correlation
pub struct Connection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    timeout: Duration,
}

impl Connection {
    /// Connect to a `ws://` URL
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let (ws, _) = tokio::time::timeout(timeout, connect_async(url))
            .await
            .map_err(|_| SceneBridgeError::ConnectionTimeout {
                millis: timeout.as_millis() as u64,
            })?
            .map_err(|e| SceneBridgeError::connection(format!("Failed to connect to {}: {}", url, e)))?;

        debug!("Connected to {}", url);
        Ok(Self {
            ws,
            next_id: 1,
            timeout,
        })
    }

    /// Send a message and wait for the response carrying its id
    pub async fn request(&mut self, message: ClientMessage) -> Result<ServerMessage> {
        let id = Value::from(self.next_id);
        self.next_id += 1;

        let message = match message {
            ClientMessage::Command(request) => ClientMessage::Command(request.with_id(id.clone())),
            ClientMessage::GetTools { .. } => ClientMessage::GetTools { id: id.clone() },
        };

        self.ws
            .send(Message::Text(message.encode()))
            .await
            .map_err(|e| SceneBridgeError::connection(e.to_string()))?;

        let millis = self.timeout.as_millis() as u64;
        tokio::time::timeout(self.timeout, self.read_response(&id))
            .await
            .map_err(|_| SceneBridgeError::ConnectionTimeout { millis })?
    }

    async fn read_response(&mut self, id: &Value) -> Result<ServerMessage> {
        while let Some(frame) = self.ws.next().await {
            let text = match frame.map_err(|e| SceneBridgeError::connection(e.to_string()))? {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let response: ServerMessage = serde_json::from_str(&text)
                .map_err(|e| SceneBridgeError::protocol(format!("Invalid response: {}", e)))?;

            // Decode errors are sent without an id
            let uncorrelated_error = matches!(response, ServerMessage::Error { id: None, .. });
            if uncorrelated_error || response.id() == id {
                return Ok(response);
            }
            debug!("Skipping response for id {}", response.id());
        }
        Err(SceneBridgeError::ConnectionClosed)
    }

    /// Close the connection politely
    pub async fn close(mut self) -> Result<()> {
        self.ws
            .close(None)
            .await
            .map_err(|e| SceneBridgeError::connection(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    use scenebridge_protocol::{CommandRequest, CommandResult};

    /// Server that answers each request twice: first with a stale id, then correctly
    async fn noisy_server() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                let request: Value = serde_json::from_str(&text).unwrap();
                let stale = ServerMessage::McpResponse {
                    id: json!("stale"),
                    result: CommandResult::error("not yours"),
                };
                let real = ServerMessage::McpResponse {
                    id: request["id"].clone(),
                    result: CommandResult::success(request["command"].clone()),
                };
                ws.send(Message::Text(stale.encode().unwrap())).await.unwrap();
                ws.send(Message::Text(real.encode().unwrap())).await.unwrap();
            }
        });
        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_request_skips_uncorrelated_responses() {
        let url = noisy_server().await;
        let mut conn = Connection::connect(&url, Duration::from_secs(2)).await.unwrap();

        for command in ["get_scene_info", "ping"] {
            let response = conn
                .request(ClientMessage::Command(CommandRequest::new(command, Default::default())))
                .await
                .unwrap();
            let ServerMessage::McpResponse { result, .. } = response else {
                panic!("expected mcp_response");
            };
            assert_eq!(result.result(), Some(&json!(command)));
        }
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = Connection::connect(&format!("ws://{}", addr), Duration::from_secs(1)).await;
        assert!(matches!(result, Err(SceneBridgeError::Connection(_))));
    }
}
