use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::{SplitStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{
    socket::WebSocketSink,
    subscription::{ListenerState, Subscription},
};
use crate::event::Listener;
use crate::room::parse_id;
use crate::shared::{AppError, AppState};

/// Live subscription endpoint
///
/// GET /subscribe/:room_id
/// Verifies the room before upgrading; a missing room never touches the registry.
#[instrument(name = "subscribe", skip(state, ws))]
pub async fn subscribe_handler(
    Path(raw_room_id): Path<String>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;

    if state.room_service.get_room(room_id).await?.is_none() {
        warn!(room_id = %room_id, "Room not found, rejecting subscription");
        return Err(AppError::NotFound("room not found".to_string()));
    }

    let ws = ws.map_err(|rejection| {
        warn!(
            room_id = %room_id,
            error = %rejection,
            "Failed to upgrade connection"
        );
        AppError::UpgradeFailed(rejection.body_text())
    })?;

    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(room_id = %room_id, error = %e, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_subscription(socket, room_id, state)))
}

/// Run one listener from registration until its connection is gone
async fn handle_subscription(socket: WebSocket, room_id: Uuid, state: AppState) {
    let (sender, receiver) = socket.split();
    let listener = Listener::new(
        Arc::new(WebSocketSink::new(sender)),
        state.shutdown.child_token(),
    );

    let final_state = Subscription::new(room_id, listener, state.registry.clone())
        .run(wait_for_disconnect(receiver), state.delivery.close_timeout)
        .await;

    debug_assert_eq!(final_state, ListenerState::Closed);
}

/// Resolves when the client closes the connection or the stream fails
///
/// Clients have nothing to say on this channel; inbound frames are dropped.
async fn wait_for_disconnect(mut receiver: SplitStream<WebSocket>) {
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Close(_)) => break,
            Ok(_) => debug!("Ignoring inbound frame"),
            Err(e) => {
                debug!(error = %e, "WebSocket receive failed");
                break;
            }
        }
    }
}
