//! WebSocket connection hub
//!
//! Accepts client connections and runs one task per session. Within a
//! session, frames are handled strictly one at a time: a request is read,
//! dispatched, and its response written before the next frame is read.
//! Responses go only to the session that sent the request.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use scenebridge_protocol::{ClientMessage, ServerMessage};
use scenebridge_utils::{Result, SceneBridgeError};

use crate::dispatch::Dispatcher;
use crate::session::{SessionId, SessionRegistry};

/// Sent if a response cannot be serialized
const ENCODE_FAILURE_RESPONSE: &str = r#"{"type":"error","error":"Internal error"}"#;

/// Inbound WebSocket listener and its live sessions
pub struct ConnectionHub {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
}

impl ConnectionHub {
    /// Bind the listener
    pub async fn bind(addr: &str, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| SceneBridgeError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        Ok(Self {
            listener,
            dispatcher,
            sessions: Arc::new(SessionRegistry::new()),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn sessions(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.sessions)
    }

    /// Accept connections until a shutdown signal arrives
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        match self.listener.local_addr() {
            Ok(addr) => info!("WebSocket hub listening on ws://{}", addr),
            Err(e) => warn!("WebSocket hub listening (address unavailable: {})", e),
        }

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!("New connection from {}", peer);
                            let dispatcher = Arc::clone(&self.dispatcher);
                            let sessions = Arc::clone(&self.sessions);
                            tokio::spawn(async move {
                                handle_connection(stream, peer, dispatcher, sessions).await;
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping WebSocket hub");
                    break;
                }
            }
        }
    }
}

/// Run one session until the peer goes away
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    dispatcher: Arc<Dispatcher>,
    sessions: Arc<SessionRegistry>,
) {
    let mut ws = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let session = sessions.register(peer);
    info!(%session, %peer, "Client connected");

    while let Some(frame) = ws.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
            // The close reply goes out on the next read, which then ends the stream
            Ok(Message::Close(_)) => continue,
            // Pings are answered by tungstenite itself
            Ok(_) => continue,
            Err(e) => {
                debug!(%session, error = %e, "Read failed, closing session");
                break;
            }
        };

        let response = handle_text(&dispatcher, session, &text).await;
        let encoded = response.encode().unwrap_or_else(|e| {
            error!(%session, error = %e, "Failed to encode response");
            ENCODE_FAILURE_RESPONSE.to_string()
        });

        if let Err(e) = ws.send(Message::Text(encoded)).await {
            debug!(%session, error = %e, "Write failed, closing session");
            break;
        }
    }

    sessions.deregister(session);
    info!(%session, %peer, "Client disconnected");
}

/// Produce the single response owed for one inbound text frame
pub async fn handle_text(dispatcher: &Dispatcher, session: SessionId, text: &str) -> ServerMessage {
    match ClientMessage::decode(text) {
        Ok(ClientMessage::Command(request)) => {
            debug!(%session, command = %request.command, "Received command");
            let result = dispatcher.dispatch(&request).await;
            ServerMessage::McpResponse {
                id: request.id,
                result,
            }
        }
        Ok(ClientMessage::GetTools { id }) => ServerMessage::ToolsResponse {
            id,
            tools: dispatcher.describe_tools(),
        },
        Err(e) => {
            warn!(%session, error = %e, "Rejected inbound message");
            e.to_response()
        }
    }
}
