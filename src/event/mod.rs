// Live fan-out of room events to connected listeners
//
// Write handlers hand events to the `NotificationSender`; the worker drains the
// queue and the `Notifier` pushes each event to the listeners currently held by
// the `SubscriptionRegistry` for the event's room.

// Public API - what other modules can use
pub use events::{EventPayload, RoomEvent};
pub use listener::Listener;
pub use notifier::{notification_channel, NotificationSender, NotificationWorker, Notifier};
pub use registry::SubscriptionRegistry;

// Internal modules
mod events;
mod listener;
mod notifier;
mod registry;
