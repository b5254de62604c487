use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::event::{Listener, SubscriptionRegistry};

/// Lifecycle of one listener
///
/// `Pending -> Active -> Closing -> Closed`, never skipping a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    /// Room verified, not yet reachable by the notifier
    Pending,
    /// Registered; waiting for cancellation
    Active,
    /// Cancellation observed; cleanup pending
    Closing,
    /// Unregistered and stream closed
    Closed,
}

impl ListenerState {
    fn can_become(self, next: ListenerState) -> bool {
        matches!(
            (self, next),
            (ListenerState::Pending, ListenerState::Active)
                | (ListenerState::Active, ListenerState::Closing)
                | (ListenerState::Closing, ListenerState::Closed)
        )
    }
}

/// A listener's registration in one room, driven through its lifecycle
///
/// Each step consumes the subscription, so cleanup runs exactly once.
pub struct Subscription {
    room_id: Uuid,
    listener: Listener,
    registry: SubscriptionRegistry,
    state: ListenerState,
}

impl Subscription {
    pub fn new(room_id: Uuid, listener: Listener, registry: SubscriptionRegistry) -> Self {
        Self {
            room_id,
            listener,
            registry,
            state: ListenerState::Pending,
        }
    }

    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Register the listener so published events reach it
    pub async fn activate(mut self) -> Self {
        self.registry
            .register(self.room_id, self.listener.clone())
            .await;
        self.transition(ListenerState::Active);
        info!(
            room_id = %self.room_id,
            listener_id = %self.listener.id(),
            "New client connected"
        );
        self
    }

    /// Suspend until the listener is cancelled or `disconnected` resolves
    ///
    /// A disconnect cancels the listener itself, so the token is the single
    /// signal every path goes through.
    pub async fn wait<F>(mut self, disconnected: F) -> Self
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            _ = self.listener.cancelled() => {
                debug!(
                    room_id = %self.room_id,
                    listener_id = %self.listener.id(),
                    "Listener cancelled"
                );
            }
            _ = disconnected => {
                debug!(
                    room_id = %self.room_id,
                    listener_id = %self.listener.id(),
                    "Client disconnected"
                );
                self.listener.cancel();
            }
        }
        self.transition(ListenerState::Closing);
        self
    }

    /// Unregister the listener and close its stream
    pub async fn close(mut self, close_timeout: Duration) -> ListenerState {
        self.registry
            .unregister(self.room_id, self.listener.id())
            .await;

        if let Err(e) = self.listener.close(close_timeout).await {
            debug!(
                room_id = %self.room_id,
                listener_id = %self.listener.id(),
                error = %e,
                "Stream close did not complete cleanly"
            );
        }

        self.transition(ListenerState::Closed);
        info!(
            room_id = %self.room_id,
            listener_id = %self.listener.id(),
            "Listener closed"
        );
        self.state
    }

    /// Drive the whole lifecycle: register, wait, clean up
    pub async fn run<F>(self, disconnected: F, close_timeout: Duration) -> ListenerState
    where
        F: Future<Output = ()>,
    {
        self.activate()
            .await
            .wait(disconnected)
            .await
            .close(close_timeout)
            .await
    }

    fn transition(&mut self, next: ListenerState) {
        debug_assert!(
            self.state.can_become(next),
            "invalid listener transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(
            room_id = %self.room_id,
            listener_id = %self.listener.id(),
            from = ?self.state,
            to = ?next,
            "Listener state changed"
        );
        self.state = next;
    }
}
