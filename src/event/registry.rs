use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::listener::Listener;

/// Tracks, per room, the listeners currently connected
///
/// A single lock covers the whole map. It is only held for lookups and
/// mutations, never while pushing to a listener.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    // room_id -> listener_id -> listener
    rooms: Arc<Mutex<HashMap<Uuid, HashMap<Uuid, Listener>>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener to a room, creating the room's set on first use
    pub async fn register(&self, room_id: Uuid, listener: Listener) {
        let mut rooms = self.rooms.lock().await;
        let listeners = rooms.entry(room_id).or_default();
        listeners.insert(listener.id(), listener);

        debug!(
            room_id = %room_id,
            listeners = listeners.len(),
            "Listener registered"
        );
    }

    /// Remove a listener from a room. Returns false if it was not registered.
    pub async fn unregister(&self, room_id: Uuid, listener_id: Uuid) -> bool {
        let mut rooms = self.rooms.lock().await;

        let Some(listeners) = rooms.get_mut(&room_id) else {
            return false;
        };
        let removed = listeners.remove(&listener_id).is_some();
        let remaining = listeners.len();
        if remaining == 0 {
            rooms.remove(&room_id);
        }

        debug!(
            room_id = %room_id,
            listener_id = %listener_id,
            removed = removed,
            remaining = remaining,
            "Listener unregistered"
        );
        removed
    }

    /// Point-in-time copy of a room's live listeners
    ///
    /// Listeners already cancelled but not yet unregistered are left out.
    pub async fn listeners_for(&self, room_id: Uuid) -> Vec<Listener> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(&room_id)
            .map(|listeners| {
                listeners
                    .values()
                    .filter(|listener| !listener.is_cancelled())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of registered listeners for a room, cancelled or not
    pub async fn listener_count(&self, room_id: Uuid) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.get(&room_id).map_or(0, HashMap::len)
    }

    pub async fn is_registered(&self, room_id: Uuid, listener_id: Uuid) -> bool {
        let rooms = self.rooms.lock().await;
        rooms
            .get(&room_id)
            .is_some_and(|listeners| listeners.contains_key(&listener_id))
    }
}
