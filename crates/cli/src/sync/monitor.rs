// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connectivity monitoring.
//!
//! The monitor holds the online/offline signal in a watch channel. Going
//! from offline to online requests one drain through a [`SyncTrigger`];
//! every other transition only updates the signal. A background probe can
//! feed the signal from a health endpoint.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::coordinator::SyncCoordinator;
use super::dispatch::{DispatchError, DispatchResult};

/// Effect of a connectivity update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// offline → online; a drain was requested.
    CameOnline,
    /// online → offline.
    WentOffline,
    /// Same state as before.
    Unchanged,
}

/// Coalescing request channel for drains.
///
/// Requests made while no runner is waiting are folded into one. Requests
/// made while the runner is draining are ignored; the running drain picks
/// up tasks enqueued before it finishes.
#[derive(Debug, Clone, Default)]
pub struct SyncTrigger {
    notify: Arc<Notify>,
    draining: Arc<AtomicBool>,
}

impl SyncTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the runner for a drain.
    pub fn request(&self) {
        if self.draining.load(Ordering::Acquire) {
            tracing::debug!("sync running, drain request ignored");
            return;
        }
        self.notify.notify_one();
    }

    /// Run `coordinator.run_sync()` once per request until cancelled.
    pub fn spawn_runner(
        &self,
        coordinator: Arc<SyncCoordinator>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let notify = Arc::clone(&self.notify);
        let draining = Arc::clone(&self.draining);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = notify.notified() => {
                        draining.store(true, Ordering::Release);
                        let report = coordinator.run_sync().await;
                        draining.store(false, Ordering::Release);
                        tracing::debug!(skipped = report.skipped, status = %report.status, "triggered sync done");
                    }
                }
            }
        })
    }
}

/// Tracks connectivity and requests a drain on reconnect.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
    trigger: SyncTrigger,
}

impl ConnectivityMonitor {
    pub fn new(initial_online: bool, trigger: SyncTrigger) -> Self {
        let (state, _) = watch::channel(initial_online);
        ConnectivityMonitor { state, trigger }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Receiver of the online signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    pub fn trigger(&self) -> &SyncTrigger {
        &self.trigger
    }

    /// Record the current connectivity.
    pub fn set_online(&self, online: bool) -> Transition {
        let was_online = self.state.send_replace(online);
        match (was_online, online) {
            (false, true) => {
                tracing::info!("connectivity restored, requesting sync");
                self.trigger.request();
                Transition::CameOnline
            }
            (true, false) => {
                tracing::info!("connectivity lost");
                Transition::WentOffline
            }
            _ => Transition::Unchanged,
        }
    }

    /// Poll `probe` every `interval` and feed the result to `set_online`.
    pub fn spawn_probe(
        self: &Arc<Self>,
        probe: Arc<dyn ConnectivityProbe>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let online = tokio::select! {
                            _ = cancel.cancelled() => break,
                            online = probe.check() => online,
                        };
                        monitor.set_online(online);
                    }
                }
            }
        })
    }
}

/// Boxed probe future.
pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = bool> + Send + 'a>>;

/// Source of reachability checks.
pub trait ConnectivityProbe: Send + Sync {
    /// True when the remote side is reachable.
    fn check(&self) -> ProbeFuture<'_>;
}

/// Probe that issues a GET to a health URL. Any HTTP response counts as
/// reachable; only transport failures count as offline.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> DispatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;
        Ok(HttpProbe { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ConnectivityProbe for HttpProbe {
    fn check(&self) -> ProbeFuture<'_> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(url = %self.url, error = %e, "health probe failed");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
