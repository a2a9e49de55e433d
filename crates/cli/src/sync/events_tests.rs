// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn enqueued(id: &str) -> SyncEvent {
    SyncEvent::Enqueued { task_id: id.to_string(), pending: 1 }
}

#[tokio::test]
async fn test_subscriber_receives_in_order() {
    let bus = EventBus::default();
    let mut sub = bus.subscribe();

    bus.emit(enqueued("a"));
    bus.emit(SyncEvent::Progress { progress: 50, completed: 1, total: 2 });

    assert_eq!(sub.recv().await, Some(enqueued("a")));
    assert_eq!(
        sub.recv().await,
        Some(SyncEvent::Progress { progress: 50, completed: 1, total: 2 })
    );
}

#[test]
fn test_emit_without_subscribers_is_fine() {
    let bus = EventBus::default();
    bus.emit(enqueued("a"));
    assert_eq!(bus.subscriber_count(), 0);
}

#[test]
fn test_events_before_subscribe_are_not_seen() {
    let bus = EventBus::default();
    bus.emit(enqueued("early"));
    let mut sub = bus.subscribe();
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let bus = EventBus::default();
    let mut sub = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);

    sub.unsubscribe();
    assert!(!sub.is_active());
    assert_eq!(bus.subscriber_count(), 0);

    bus.emit(enqueued("a"));
    assert_eq!(sub.recv().await, None);
}

#[test]
fn test_lagged_subscriber_skips_to_retained_events() {
    let bus = EventBus::new(2);
    let mut sub = bus.subscribe();
    for id in ["a", "b", "c", "d"] {
        bus.emit(enqueued(id));
    }

    assert_eq!(sub.try_recv(), Some(enqueued("c")));
    assert_eq!(sub.try_recv(), Some(enqueued("d")));
    assert_eq!(sub.try_recv(), None);
}

#[tokio::test]
async fn test_closed_bus_ends_subscription() {
    let bus = EventBus::default();
    let mut sub = bus.subscribe();
    drop(bus);
    assert_eq!(sub.recv().await, None);
}
