use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    models::{MessageModel, RoomModel},
    parse_id,
    types::{CreateMessageRequest, CreateRoomRequest, IdResponse, ReactionCountResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /api/rooms
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<Json<IdResponse>, AppError> {
    info!("Creating new room");
    let id = state.room_service.create_room(&request.theme).await?;
    Ok(Json(IdResponse { id }))
}

/// HTTP handler for listing all rooms
///
/// GET /api/rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<Vec<RoomModel>>, AppError> {
    let rooms = state.room_service.list_rooms().await?;
    info!(room_count = rooms.len(), "Rooms listed successfully");
    Ok(Json(rooms))
}

/// POST /api/rooms/:room_id/messages
#[instrument(name = "create_message", skip(state, request))]
pub async fn create_message(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
    Json(request): Json<CreateMessageRequest>,
) -> Result<Json<IdResponse>, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let id = state
        .room_service
        .post_message(room_id, &request.message)
        .await?;
    Ok(Json(IdResponse { id }))
}

/// GET /api/rooms/:room_id/messages
#[instrument(name = "list_messages", skip(state))]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(raw_room_id): Path<String>,
) -> Result<Json<Vec<MessageModel>>, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let messages = state.room_service.list_messages(room_id).await?;
    Ok(Json(messages))
}

/// GET /api/rooms/:room_id/messages/:message_id
#[instrument(name = "get_message", skip(state))]
pub async fn get_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<MessageModel>, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let message_id = parse_id(&raw_message_id, "message id")?;
    let message = state.room_service.get_message(room_id, message_id).await?;
    Ok(Json(message))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "react_to_message", skip(state))]
pub async fn react_to_message(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let message_id = parse_id(&raw_message_id, "message id")?;
    let count = state.room_service.react(room_id, message_id).await?;
    Ok(Json(ReactionCountResponse { count }))
}

/// DELETE /api/rooms/:room_id/messages/:message_id/react
#[instrument(name = "remove_reaction", skip(state))]
pub async fn remove_reaction(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<Json<ReactionCountResponse>, AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let message_id = parse_id(&raw_message_id, "message id")?;
    let count = state
        .room_service
        .remove_reaction(room_id, message_id)
        .await?;
    Ok(Json(ReactionCountResponse { count }))
}

/// PATCH /api/rooms/:room_id/messages/:message_id/answer
#[instrument(name = "mark_answered", skip(state))]
pub async fn mark_answered(
    State(state): State<AppState>,
    Path((raw_room_id, raw_message_id)): Path<(String, String)>,
) -> Result<(), AppError> {
    let room_id = parse_id(&raw_room_id, "room id")?;
    let message_id = parse_id(&raw_message_id, "message id")?;
    state
        .room_service
        .mark_answered(room_id, message_id)
        .await
}
