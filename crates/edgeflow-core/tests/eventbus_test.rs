//! Event bus integration tests.
//!
//! Tests include:
//! - Multiple subscribers
//! - Publishing through the `Publisher` trait object
//! - Ordering of events from a single publisher

use edgeflow_core::{Event, EventBus, Publisher, Reading, SharedPublisher, ValueType};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

fn event(device: &str, value: &str) -> Event {
    Event::new(
        device,
        vec![Reading::new(device, "Level", value, ValueType::Uint16, 1_000)],
    )
}

#[tokio::test]
async fn test_event_bus_multiple_subscribers() {
    let bus = EventBus::new();
    let mut rx1 = bus.subscribe();
    let mut rx2 = bus.subscribe();

    assert_eq!(bus.send(event("tank-1", "42")).unwrap(), 2);

    let e1 = rx1.recv().await.unwrap();
    let e2 = rx2.recv().await.unwrap();
    assert_eq!(e1.id, e2.id);
    assert_eq!(e1.readings[0].value, "42");
}

#[tokio::test]
async fn test_event_bus_as_shared_publisher() {
    let bus = Arc::new(EventBus::new());
    let mut rx = bus.subscribe();
    let publisher: SharedPublisher = bus.clone();

    publisher.publish(event("tank-1", "7")).await.unwrap();

    let received = timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out")
        .unwrap();
    assert_eq!(received.device, "tank-1");
}

#[tokio::test]
async fn test_event_bus_preserves_order() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();

    for i in 0..10 {
        bus.publish(event("tank-1", &i.to_string())).await.unwrap();
    }

    for i in 0..10 {
        let received = rx.recv().await.unwrap();
        assert_eq!(received.readings[0].value, i.to_string());
    }
}

#[tokio::test]
async fn test_event_serializes_to_json() {
    let e = event("tank-1", "99");
    let json = serde_json::to_value(&e).unwrap();

    assert_eq!(json["device"], "tank-1");
    assert_eq!(json["readings"][0]["value_type"], "uint16");
    assert_eq!(json["readings"][0]["value"], "99");
}
