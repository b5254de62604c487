use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Outbound half of a live connection - all the fan-out needs is push and close
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Send a text frame to the client
    async fn send_text(&self, text: String) -> Result<(), SocketError>;

    /// Close the connection
    async fn close(&self) -> Result<(), SocketError>;
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Write half of an axum WebSocket
///
/// The read half stays with the subscription so disconnects can be observed
/// while the notifier pushes through this sink.
pub struct WebSocketSink {
    sender: Mutex<SplitSink<WebSocket, Message>>,
}

impl WebSocketSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

#[async_trait]
impl EventSink for WebSocketSink {
    async fn send_text(&self, text: String) -> Result<(), SocketError> {
        self.sender
            .lock()
            .await
            .send(Message::Text(text))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn close(&self) -> Result<(), SocketError> {
        self.sender
            .lock()
            .await
            .send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}
