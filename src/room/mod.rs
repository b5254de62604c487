// Public API - what other modules can use
pub use handlers::{
    create_message, create_room, get_message, list_messages, list_rooms, mark_answered,
    react_to_message, remove_reaction,
};
pub use repository::RoomRepository;
pub use service::RoomService;

use uuid::Uuid;

use crate::shared::AppError;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
mod service;
pub mod types;

/// Parse an identifier taken from the request path
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("invalid {}", what)))
}
