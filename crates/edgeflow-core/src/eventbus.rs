//! In-process event bus.
//!
//! The event bus fans published [`Event`]s out to every subscriber over a
//! broadcast channel. It is the default [`Publisher`] used when no external
//! event store is wired in; a store client can simply subscribe to it.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::event::Event;
use crate::publisher::{PublishError, Publisher};

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Broadcast event bus.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the specified capacity.
    ///
    /// The capacity determines how many events are buffered for slow subscribers.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Send an event to all current subscribers, returning how many got it.
    ///
    /// Fails with [`PublishError::NoSubscribers`] when nobody is listening;
    /// the event is dropped in that case.
    pub fn send(&self, event: Event) -> Result<usize, PublishError> {
        let id = event.id;
        self.tx
            .send(event)
            .map_err(|_| PublishError::NoSubscribers(id))
    }

    /// Subscribe to all events.
    ///
    /// If the subscriber falls behind, older events may be dropped.
    pub fn subscribe(&self) -> EventBusReceiver {
        EventBusReceiver {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for EventBus {
    async fn publish(&self, event: Event) -> Result<(), PublishError> {
        let device = event.device.clone();
        let receivers = self.send(event)?;
        tracing::trace!(%device, receivers, "Event published");
        Ok(())
    }
}

/// Receiver for all events from the event bus.
pub struct EventBusReceiver {
    rx: broadcast::Receiver<Event>,
}

impl EventBusReceiver {
    /// Receive the next event.
    ///
    /// Returns `None` once the event bus is closed.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event bus receiver lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Reading, ValueType};

    fn event(device: &str) -> Event {
        Event::new(
            device,
            vec![Reading::new(device, "Temperature", "21", ValueType::Int16, 0)],
        )
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_fails() {
        let bus = EventBus::new();
        let result = bus.publish(event("dev-1")).await;
        assert!(matches!(result, Err(PublishError::NoSubscribers(_))));
    }

    #[tokio::test]
    async fn test_publish_subscribe() {
        let bus = EventBus::with_capacity(4);
        let mut rx = bus.subscribe();

        bus.publish(event("dev-1")).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.device, "dev-1");
        assert_eq!(received.readings.len(), 1);
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(event("dev-1")).await.unwrap();
        drop(bus);

        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_skips_to_newest() {
        let bus = EventBus::with_capacity(2);
        let mut rx = bus.subscribe();
        for device in ["dev-1", "dev-2", "dev-3"] {
            bus.publish(event(device)).await.unwrap();
        }

        assert_eq!(rx.recv().await.unwrap().device, "dev-2");
        assert_eq!(rx.recv().await.unwrap().device, "dev-3");
    }
}
