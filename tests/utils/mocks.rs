//! Test sinks standing in for live WebSocket connections
#![allow(dead_code)] // Test utilities may not all be used in every test

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::timeout;

use ama::{EventPayload, EventSink, SocketError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Sink that forwards every frame to a channel the test can read
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<String>,
    receiver: Mutex<mpsc::UnboundedReceiver<String>>,
    attempts: AtomicUsize,
}

impl ChannelSink {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender,
            receiver: Mutex::new(receiver),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Next event pushed to this sink, if one arrives in time
    pub async fn next_event(&self, within: Duration) -> Option<EventPayload> {
        let mut receiver = self.receiver.lock().await;
        let text = timeout(within, receiver.recv()).await.ok()??;
        Some(serde_json::from_str(&text).expect("listener received invalid event JSON"))
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send_text(&self, text: String) -> Result<(), SocketError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.sender
            .send(text)
            .map_err(|_| SocketError::ConnectionClosed)
    }

    async fn close(&self) -> Result<(), SocketError> {
        Ok(())
    }
}

/// Sink for a connection that broke after registering
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for FailingSink {
    async fn send_text(&self, _text: String) -> Result<(), SocketError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SocketError::SendFailed("broken pipe".to_string()))
    }

    async fn close(&self) -> Result<(), SocketError> {
        Err(SocketError::ConnectionClosed)
    }
}
