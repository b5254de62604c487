use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    models::{MessageModel, RoomModel},
    repository::RoomRepository,
};
use crate::event::{NotificationSender, RoomEvent};
use crate::shared::AppError;

/// Room and message operations; successful writes are published to listeners
///
/// Publishing is queued, so callers never wait on delivery. A failed write
/// publishes nothing.
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    notifications: NotificationSender,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        notifications: NotificationSender,
    ) -> Self {
        Self {
            repository,
            notifications,
        }
    }

    #[instrument(skip(self))]
    pub async fn create_room(&self, theme: &str) -> Result<Uuid, AppError> {
        if theme.is_empty() {
            return Err(AppError::BadRequest("theme must not be empty".to_string()));
        }

        let room_id = self.repository.insert_room(theme).await?;
        info!(room_id = %room_id, "Room created");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        self.repository.get_rooms().await
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        self.repository.get_room(room_id).await
    }

    #[instrument(skip(self, message))]
    pub async fn post_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        self.require_room(room_id).await?;
        if message.is_empty() {
            return Err(AppError::BadRequest("message must not be empty".to_string()));
        }

        let message_id = self.repository.insert_message(room_id, message).await?;
        info!(room_id = %room_id, message_id = %message_id, "Message created");

        self.notifications
            .notify(RoomEvent::message_created(room_id, message_id, message));
        Ok(message_id)
    }

    #[instrument(skip(self))]
    pub async fn list_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        self.require_room(room_id).await?;
        self.repository.get_room_messages(room_id).await
    }

    /// Fetch a message, treating one that belongs to another room as missing
    #[instrument(skip(self))]
    pub async fn get_message(
        &self,
        room_id: Uuid,
        message_id: Uuid,
    ) -> Result<MessageModel, AppError> {
        match self.repository.get_message(message_id).await? {
            Some(message) if message.room_id == room_id => Ok(message),
            Some(_) => {
                debug!(
                    room_id = %room_id,
                    message_id = %message_id,
                    "Message belongs to a different room"
                );
                Err(AppError::NotFound("message not found".to_string()))
            }
            None => Err(AppError::NotFound("message not found".to_string())),
        }
    }

    #[instrument(skip(self))]
    pub async fn react(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        self.get_message(room_id, message_id).await?;

        let count = self.repository.react_to_message(message_id).await?;
        debug!(message_id = %message_id, count = count, "Reaction added");

        self.notifications
            .notify(RoomEvent::reaction_changed(room_id, message_id));
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn remove_reaction(&self, room_id: Uuid, message_id: Uuid) -> Result<i64, AppError> {
        self.get_message(room_id, message_id).await?;

        let count = self.repository.remove_reaction(message_id).await?;
        debug!(message_id = %message_id, count = count, "Reaction removed");

        self.notifications
            .notify(RoomEvent::reaction_changed(room_id, message_id));
        Ok(count)
    }

    #[instrument(skip(self))]
    pub async fn mark_answered(&self, room_id: Uuid, message_id: Uuid) -> Result<(), AppError> {
        self.get_message(room_id, message_id).await?;

        self.repository.mark_answered(message_id).await?;
        info!(message_id = %message_id, "Message marked as answered");

        self.notifications
            .notify(RoomEvent::reaction_changed(room_id, message_id));
        Ok(())
    }

    async fn require_room(&self, room_id: Uuid) -> Result<RoomModel, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound("room not found".to_string()))
    }
}
