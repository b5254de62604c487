// Library crate for the live Q&A server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod room;
pub mod server;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::{Config, DeliverySettings};
pub use event::{EventPayload, Listener, Notifier, RoomEvent, SubscriptionRegistry};
pub use room::{repository::InMemoryRoomRepository, RoomRepository, RoomService};
pub use shared::{AppError, AppState};
pub use websockets::{EventSink, ListenerState, SocketError, Subscription};
