use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload pushed to listeners
///
/// Serialized as `{"kind": "...", "value": {...}}`. The room is routing
/// metadata only and is never part of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum EventPayload {
    /// A message was posted to the room
    #[serde(rename = "message_created")]
    MessageCreated { id: Uuid, message: String },

    /// A message's reaction count or answered flag changed
    #[serde(rename = "message_reaction")]
    ReactionChanged { id: Uuid },
}

/// An immutable event addressed to one room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomEvent {
    room_id: Uuid,
    payload: EventPayload,
}

impl RoomEvent {
    pub fn new(room_id: Uuid, payload: EventPayload) -> Self {
        Self { room_id, payload }
    }

    pub fn message_created(room_id: Uuid, message_id: Uuid, message: impl Into<String>) -> Self {
        Self::new(
            room_id,
            EventPayload::MessageCreated {
                id: message_id,
                message: message.into(),
            },
        )
    }

    pub fn reaction_changed(room_id: Uuid, message_id: Uuid) -> Self {
        Self::new(room_id, EventPayload::ReactionChanged { id: message_id })
    }

    /// The room whose listeners receive this event
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Wire name of the event kind (for logging)
    pub fn event_type(&self) -> &'static str {
        match self.payload {
            EventPayload::MessageCreated { .. } => "message_created",
            EventPayload::ReactionChanged { .. } => "message_reaction",
        }
    }

    /// Serialize the payload as sent over a live connection
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_message_created_wire_shape() {
        let room_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event = RoomEvent::message_created(room_id, message_id, "hello");

        let wire: Value = serde_json::from_str(&event.to_wire().unwrap()).unwrap();

        assert_eq!(
            wire,
            json!({
                "kind": "message_created",
                "value": { "id": message_id.to_string(), "message": "hello" }
            })
        );
    }

    #[test]
    fn test_reaction_wire_shape_omits_room() {
        let room_id = Uuid::new_v4();
        let message_id = Uuid::new_v4();
        let event = RoomEvent::reaction_changed(room_id, message_id);

        let text = event.to_wire().unwrap();
        let wire: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(
            wire,
            json!({ "kind": "message_reaction", "value": { "id": message_id.to_string() } })
        );
        assert!(!text.contains(&room_id.to_string()));
        assert_eq!(event.room_id(), room_id);
        assert_eq!(event.event_type(), "message_reaction");
    }

    #[test]
    fn test_payload_parses_back_from_wire() {
        let event = RoomEvent::message_created(Uuid::new_v4(), Uuid::new_v4(), "question?");
        let parsed: EventPayload = serde_json::from_str(&event.to_wire().unwrap()).unwrap();
        assert_eq!(&parsed, event.payload());
    }
}
