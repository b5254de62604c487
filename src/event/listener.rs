use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::websockets::{EventSink, SocketError};

/// A live connection subscribed to one room
///
/// Cloning yields a handle to the same listener: same id, same sink, same
/// cancellation token. Every call to `new` creates an independent listener,
/// even when it wraps the same sink.
#[derive(Clone)]
pub struct Listener {
    id: Uuid,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Listener {
    pub fn new(sink: Arc<dyn EventSink>, cancel: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            sink,
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Signal the listener to close. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the listener has been cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Push one serialized event, failing if the sink does not accept it in time
    pub async fn push(&self, text: String, limit: Duration) -> Result<(), SocketError> {
        timeout(limit, self.sink.send_text(text))
            .await
            .map_err(|_| SocketError::Timeout(limit))?
    }

    /// Close the underlying stream, bounded by `limit`
    pub async fn close(&self, limit: Duration) -> Result<(), SocketError> {
        timeout(limit, self.sink.close())
            .await
            .map_err(|_| SocketError::Timeout(limit))?
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websockets::test_utils::{RecordingSink, StalledSink};

    #[tokio::test]
    async fn test_listeners_over_same_sink_are_independent() {
        let sink = Arc::new(RecordingSink::new());
        let first = Listener::new(sink.clone(), CancellationToken::new());
        let second = Listener::new(sink, CancellationToken::new());

        assert_ne!(first.id(), second.id());

        first.cancel();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[tokio::test]
    async fn test_push_reaches_sink() {
        let sink = Arc::new(RecordingSink::new());
        let listener = Listener::new(sink.clone(), CancellationToken::new());

        listener
            .push("payload".to_string(), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(sink.sent().await, vec!["payload".to_string()]);
    }

    #[tokio::test]
    async fn test_push_times_out_on_stalled_sink() {
        let listener = Listener::new(Arc::new(StalledSink), CancellationToken::new());

        let result = listener
            .push("payload".to_string(), Duration::from_millis(20))
            .await;

        assert!(matches!(result, Err(SocketError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_close_is_bounded() {
        let listener = Listener::new(Arc::new(StalledSink), CancellationToken::new());

        let result = listener.close(Duration::from_millis(20)).await;

        assert!(matches!(result, Err(SocketError::Timeout(_))));
    }
}
