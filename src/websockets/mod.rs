// Public API
pub use handler::subscribe_handler;
pub use socket::{EventSink, SocketError, WebSocketSink};
pub use subscription::{ListenerState, Subscription};

// Internal modules
mod handler;
mod socket;
mod subscription;

#[cfg(test)]
pub(crate) use socket::test_utils;
