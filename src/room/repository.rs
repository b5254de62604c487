use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::models::{MessageModel, RoomModel};
use crate::shared::AppError;

/// Trait for room and message storage operations
#[async_trait]
pub trait RoomRepository {
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError>;
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError>;
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Fails with `NotFound` if the room does not exist
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError>;
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError>;
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError>;

    /// Increments the reaction count and returns the new value
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError>;

    /// Decrements the reaction count (never below zero) and returns the new value
    async fn remove_reaction(&self, message_id: Uuid) -> Result<i64, AppError>;
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError>;
}

#[derive(Default)]
struct MemoryStore {
    rooms: Vec<RoomModel>,
    messages: Vec<MessageModel>,
}

impl MemoryStore {
    fn message_mut(&mut self, message_id: Uuid) -> Result<&mut MessageModel, AppError> {
        self.messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }
}

/// In-memory implementation of RoomRepository for development and testing
///
/// Data is kept in insertion order and lost when the process exits.
#[derive(Default)]
pub struct InMemoryRoomRepository {
    store: Mutex<MemoryStore>,
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> Result<MutexGuard<'_, MemoryStore>, AppError> {
        self.store.lock().map_err(|_| {
            warn!("In-memory store lock poisoned");
            AppError::Internal
        })
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        let store = self.store()?;
        let room = store.rooms.iter().find(|r| r.id == room_id).cloned();

        match &room {
            Some(r) => debug!(room_id = %room_id, theme = %r.theme, "Room found in memory"),
            None => debug!(room_id = %room_id, "Room not found in memory"),
        }
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError> {
        let room = RoomModel::new(theme);
        let room_id = room.id;
        self.store()?.rooms.push(room);

        debug!(room_id = %room_id, "Room created in memory");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        Ok(self.store()?.rooms.clone())
    }

    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let mut store = self.store()?;
        if !store.rooms.iter().any(|r| r.id == room_id) {
            debug!(room_id = %room_id, "Cannot insert message into missing room");
            return Err(AppError::NotFound("room not found".to_string()));
        }

        let model = MessageModel::new(room_id, message);
        let message_id = model.id;
        store.messages.push(model);

        debug!(room_id = %room_id, message_id = %message_id, "Message created in memory");
        Ok(message_id)
    }

    #[instrument(skip(self))]
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        let store = self.store()?;
        Ok(store
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        let store = self.store()?;
        Ok(store.messages.iter().find(|m| m.id == message_id).cloned())
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        let mut store = self.store()?;
        let message = store.message_mut(message_id)?;
        message.reaction_count += 1;
        Ok(message.reaction_count)
    }

    #[instrument(skip(self))]
    async fn remove_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        let mut store = self.store()?;
        let message = store.message_mut(message_id)?;
        message.reaction_count = (message.reaction_count - 1).max(0);
        Ok(message.reaction_count)
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let mut store = self.store()?;
        store.message_mut(message_id)?.answered = true;
        Ok(())
    }
}

/// PostgreSQL implementation of room repository
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn database_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        warn!(error = %e, operation = operation, "Database operation failed");
        AppError::DatabaseError(e.to_string())
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    #[instrument(skip(self))]
    async fn get_room(&self, room_id: Uuid) -> Result<Option<RoomModel>, AppError> {
        sqlx::query_as::<_, RoomModel>("SELECT id, theme FROM rooms WHERE id = $1")
            .bind(room_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error("get_room"))
    }

    #[instrument(skip(self))]
    async fn insert_room(&self, theme: &str) -> Result<Uuid, AppError> {
        let room_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO rooms (theme) VALUES ($1) RETURNING id",
        )
        .bind(theme)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error("insert_room"))?;

        debug!(room_id = %room_id, "Room created in database");
        Ok(room_id)
    }

    #[instrument(skip(self))]
    async fn get_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        sqlx::query_as::<_, RoomModel>("SELECT id, theme FROM rooms")
            .fetch_all(&self.pool)
            .await
            .map_err(database_error("get_rooms"))
    }

    #[instrument(skip(self, message))]
    async fn insert_message(&self, room_id: Uuid, message: &str) -> Result<Uuid, AppError> {
        let result = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO messages (room_id, message) VALUES ($1, $2) RETURNING id",
        )
        .bind(room_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(message_id) => {
                debug!(room_id = %room_id, message_id = %message_id, "Message created in database");
                Ok(message_id)
            }
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                debug!(room_id = %room_id, "Cannot insert message into missing room");
                Err(AppError::NotFound("room not found".to_string()))
            }
            Err(e) => Err(database_error("insert_message")(e)),
        }
    }

    #[instrument(skip(self))]
    async fn get_room_messages(&self, room_id: Uuid) -> Result<Vec<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered, created_at \
             FROM messages WHERE room_id = $1 ORDER BY created_at",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(database_error("get_room_messages"))
    }

    #[instrument(skip(self))]
    async fn get_message(&self, message_id: Uuid) -> Result<Option<MessageModel>, AppError> {
        sqlx::query_as::<_, MessageModel>(
            "SELECT id, room_id, message, reaction_count, answered, created_at \
             FROM messages WHERE id = $1",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("get_message"))
    }

    #[instrument(skip(self))]
    async fn react_to_message(&self, message_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = reaction_count + 1 \
             WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("react_to_message"))?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }

    #[instrument(skip(self))]
    async fn remove_reaction(&self, message_id: Uuid) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE messages SET reaction_count = GREATEST(reaction_count - 1, 0) \
             WHERE id = $1 RETURNING reaction_count",
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error("remove_reaction"))?
        .ok_or_else(|| AppError::NotFound("message not found".to_string()))
    }

    #[instrument(skip(self))]
    async fn mark_answered(&self, message_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE messages SET answered = TRUE WHERE id = $1")
            .bind(message_id)
            .execute(&self.pool)
            .await
            .map_err(database_error("mark_answered"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("message not found".to_string()));
        }
        Ok(())
    }
}
