// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Progress channel for sync activity.
//!
//! Delivery is at-most-once and best-effort: a subscriber that falls more
//! than the channel capacity behind loses the oldest events.

use serde::Serialize;
use tokio::sync::broadcast;

use super::coordinator::SyncReport;

const DEFAULT_CAPACITY: usize = 64;

/// Events published by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    /// A task was persisted. `pending` is the queue length afterwards.
    Enqueued { task_id: String, pending: usize },
    /// A task settled during a drain.
    Progress { progress: u8, completed: usize, total: usize },
    /// A drain finished.
    Completed { report: SyncReport },
    /// A dispatch attempt failed, or storage failed mid-drain (`task_id` is
    /// `None`). `dropped` is true when the task was removed for good.
    Error { task_id: Option<String>, message: String, dropped: bool },
}

/// Broadcast sender shared by every producer of sync events.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        EventBus { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn emit(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription { rx: Some(self.tx.subscribe()) }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// A live subscription to sync events.
#[derive(Debug)]
pub struct Subscription {
    rx: Option<broadcast::Receiver<SyncEvent>>,
}

impl Subscription {
    /// Wait for the next event. `None` once unsubscribed or the bus is gone.
    pub async fn recv(&mut self) -> Option<SyncEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "sync event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next already-buffered event, without waiting.
    pub fn try_recv(&mut self) -> Option<SyncEvent> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "sync event subscriber lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Stop receiving. Later calls to `recv` return `None`.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
