#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use uuid::Uuid;

use ama::{
    server, AppState, DeliverySettings, EventSink, InMemoryRoomRepository, Listener,
    ListenerState, Subscription,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub state: AppState,
    pub repository: Arc<InMemoryRoomRepository>,
    pub router: Router,
    pub shutdown: CancellationToken,
    pub _worker_handle: JoinHandle<()>,
}

pub struct TestSetupBuilder {
    delivery: DeliverySettings,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            delivery: DeliverySettings {
                push_timeout: Duration::from_millis(500),
                close_timeout: Duration::from_millis(100),
                queue_capacity: 64,
                max_in_flight: 8,
            },
        }
    }

    pub fn build(self) -> TestSetup {
        let repository = Arc::new(InMemoryRoomRepository::new());
        let shutdown = CancellationToken::new();
        let (state, worker) = AppState::new(repository.clone(), self.delivery, shutdown.clone());
        let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

        TestSetup {
            router: server::router(state.clone()),
            state,
            repository,
            shutdown,
            _worker_handle: worker_handle,
        }
    }
}

impl TestSetup {
    /// Send a request through the router, returning status and JSON body
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn create_room(&self, theme: &str) -> Uuid {
        let (status, body) = self
            .request("POST", "/api/rooms", Some(serde_json::json!({ "theme": theme })))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn create_message(&self, room_id: Uuid, message: &str) -> Uuid {
        let (status, body) = self
            .request(
                "POST",
                &format!("/api/rooms/{}/messages", room_id),
                Some(serde_json::json!({ "message": message })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Register a listener the way the subscribe handler does and keep it
    /// running until it is cancelled
    pub async fn subscribe(
        &self,
        room_id: Uuid,
        sink: Arc<dyn EventSink>,
    ) -> (Listener, JoinHandle<ListenerState>) {
        let listener = Listener::new(sink, self.shutdown.child_token());
        let subscription =
            Subscription::new(room_id, listener.clone(), self.state.registry.clone())
                .activate()
                .await;
        let close_timeout = self.state.delivery.close_timeout;
        let handle = tokio::spawn(async move {
            subscription
                .wait(std::future::pending())
                .await
                .close(close_timeout)
                .await
        });
        (listener, handle)
    }

    /// Poll until the room has exactly `count` registered listeners
    pub async fn wait_for_listeners(&self, room_id: Uuid, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let current = self.state.registry.listener_count(room_id).await;
            if current == count {
                return;
            }
            assert!(
                Instant::now() < deadline,
                "room {} has {} listeners, expected {}",
                room_id,
                current,
                count
            );
            sleep(Duration::from_millis(5)).await;
        }
    }

    pub async fn join(handle: JoinHandle<ListenerState>) -> ListenerState {
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("subscription did not finish")
            .expect("subscription task panicked")
    }
}
