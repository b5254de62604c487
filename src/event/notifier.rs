use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Semaphore,
};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{events::RoomEvent, registry::SubscriptionRegistry};

/// Delivers events to every listener registered for the event's room
///
/// One delivery attempt per listener per publish: no retry, no buffering. A
/// failed push cancels that listener; its subscription removes it from the
/// registry.
#[derive(Debug, Clone)]
pub struct Notifier {
    registry: SubscriptionRegistry,
    push_timeout: Duration,
}

impl Notifier {
    pub fn new(registry: SubscriptionRegistry, push_timeout: Duration) -> Self {
        Self {
            registry,
            push_timeout,
        }
    }

    /// Push one event to the listeners snapshotted for its room
    pub async fn publish(&self, event: &RoomEvent) {
        let room_id = event.room_id();
        let listeners = self.registry.listeners_for(room_id).await;

        if listeners.is_empty() {
            debug!(
                room_id = %room_id,
                event_type = event.event_type(),
                "No listeners for room"
            );
            return;
        }

        let text = match event.to_wire() {
            Ok(text) => text,
            Err(e) => {
                error!(
                    room_id = %room_id,
                    event_type = event.event_type(),
                    error = %e,
                    "Failed to serialize event"
                );
                return;
            }
        };

        let deliveries = listeners.iter().map(|listener| {
            let text = text.clone();
            async move {
                match listener.push(text, self.push_timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(
                            room_id = %room_id,
                            listener_id = %listener.id(),
                            error = %e,
                            "Failed to send event to listener"
                        );
                        listener.cancel();
                        false
                    }
                }
            }
        });
        let delivered = join_all(deliveries)
            .await
            .into_iter()
            .filter(|ok| *ok)
            .count();

        debug!(
            room_id = %room_id,
            event_type = event.event_type(),
            listeners = listeners.len(),
            delivered = delivered,
            "Room event published"
        );
    }
}

/// Handle used by write handlers to publish without waiting for delivery
#[derive(Debug, Clone)]
pub struct NotificationSender {
    queue: mpsc::Sender<RoomEvent>,
}

impl NotificationSender {
    /// Queue an event for publishing. Never blocks; drops the event when the
    /// queue is full or the worker has stopped.
    pub fn notify(&self, event: RoomEvent) {
        match self.queue.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    room_id = %event.room_id(),
                    event_type = event.event_type(),
                    "Notification queue full, dropping event"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    room_id = %event.room_id(),
                    event_type = event.event_type(),
                    "Notification worker stopped, dropping event"
                );
            }
        }
    }
}

/// Drains the notification queue into the `Notifier`
///
/// Each event is published in its own task, so a stalled listener in one
/// room holds up only that publish. At most `max_in_flight` publishes run at
/// once; past that the worker stops dequeuing.
pub struct NotificationWorker {
    notifier: Notifier,
    receiver: mpsc::Receiver<RoomEvent>,
    in_flight: Arc<Semaphore>,
}

impl NotificationWorker {
    /// Run until shutdown is signalled or every sender is dropped, then wait
    /// for publishes already started
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Notification worker started");
        let mut publishes = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(result) = publishes.join_next(), if !publishes.is_empty() => {
                    log_publish_result(result);
                }
                event = self.receiver.recv() => {
                    let Some(event) = event else { break };
                    let permit = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        permit = self.in_flight.clone().acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                    };
                    let notifier = self.notifier.clone();
                    publishes.spawn(async move {
                        notifier.publish(&event).await;
                        drop(permit);
                    });
                }
            }
        }

        // pushes are bounded by the push timeout, so this drains
        let pending = publishes.len();
        if pending > 0 {
            debug!(pending = pending, "Waiting for in-flight publishes");
        }
        while let Some(result) = publishes.join_next().await {
            log_publish_result(result);
        }

        info!("Notification worker stopped");
    }

    /// Take the queue without running the worker
    #[cfg(test)]
    pub(crate) fn into_receiver(self) -> mpsc::Receiver<RoomEvent> {
        self.receiver
    }
}

fn log_publish_result(result: Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Publish task failed");
    }
}

/// Create the queue between write handlers and the notification worker
pub fn notification_channel(
    notifier: Notifier,
    capacity: usize,
    max_in_flight: usize,
) -> (NotificationSender, NotificationWorker) {
    let (queue, receiver) = mpsc::channel(capacity.max(1));
    (
        NotificationSender { queue },
        NotificationWorker {
            notifier,
            receiver,
            in_flight: Arc::new(Semaphore::new(max_in_flight.max(1))),
        },
    )
}
