use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub theme: String,
}

/// Request payload for posting a message to a room
#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub message: String,
}

/// Response carrying the id of a created room or message
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: Uuid,
}

/// Response for reaction updates
#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionCountResponse {
    pub count: i64,
}
