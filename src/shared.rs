use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::DeliverySettings;
use crate::event::{notification_channel, NotificationWorker, Notifier, SubscriptionRegistry};
use crate::room::{RoomRepository, RoomService};

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub registry: SubscriptionRegistry,
    pub delivery: DeliverySettings,
    /// Parent of every listener's cancellation token
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Wire the state together. The returned worker must be spawned for
    /// published events to reach listeners.
    pub fn new(
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        delivery: DeliverySettings,
        shutdown: CancellationToken,
    ) -> (Self, NotificationWorker) {
        let registry = SubscriptionRegistry::new();
        let notifier = Notifier::new(registry.clone(), delivery.push_timeout);
        let (notifications, worker) =
            notification_channel(notifier, delivery.queue_capacity, delivery.max_in_flight);

        let state = Self {
            room_service: Arc::new(RoomService::new(room_repository, notifications)),
            registry,
            delivery,
            shutdown,
        };
        (state, worker)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Upgrade failed: {0}")]
    UpgradeFailed(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            // store details stay in the logs
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "something went wrong".to_string(),
            ),
            AppError::UpgradeFailed(msg) => (
                StatusCode::BAD_REQUEST,
                format!("failed to upgrade to ws connection: {}", msg),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
