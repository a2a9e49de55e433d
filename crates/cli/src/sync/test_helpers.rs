// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use lx_core::{ManualClock, SyncTask};
use tokio::sync::watch;

use super::dispatch::{DispatchError, DispatchFuture, DispatchOutcome, Dispatcher};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16),
    Fail(DispatchError),
}

/// Mock dispatcher for testing without a real server.
///
/// Replies are scripted per endpoint; once a script runs out the default
/// reply is used. Every dispatched task is recorded in order.
#[derive(Clone)]
pub struct ScriptedDispatcher {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    default: Arc<Mutex<Reply>>,
    calls: Arc<Mutex<Vec<SyncTask>>>,
    /// Flipped to `false` after the given number of calls.
    offline_after: Arc<Mutex<Option<(usize, watch::Sender<bool>)>>>,
}

impl ScriptedDispatcher {
    /// Dispatcher that answers 200 unless scripted otherwise.
    pub fn new() -> Self {
        Self::with_default(Reply::Status(200))
    }

    pub fn with_default(reply: Reply) -> Self {
        ScriptedDispatcher {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            default: Arc::new(Mutex::new(reply)),
            calls: Arc::new(Mutex::new(Vec::new())),
            offline_after: Arc::new(Mutex::new(None)),
        }
    }

    /// Always failing with a network error.
    pub fn failing() -> Self {
        Self::with_default(Reply::Fail(DispatchError::Network("connection refused".into())))
    }

    /// Queue replies for `endpoint`, consumed one per call.
    pub fn script(&self, endpoint: &str, replies: impl IntoIterator<Item = Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .extend(replies);
    }

    pub fn set_default(&self, reply: Reply) {
        *self.default.lock().unwrap() = reply;
    }

    /// Signal offline on `online` once `calls` dispatches have been made.
    pub fn go_offline_after(&self, calls: usize, online: watch::Sender<bool>) {
        *self.offline_after.lock().unwrap() = Some((calls, online));
    }

    pub fn calls(&self) -> Vec<SyncTask> {
        self.calls.lock().unwrap().clone()
    }

    /// Task ids in dispatch order, one entry per attempt.
    pub fn call_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|t| t.id).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_reply(&self, task: &SyncTask) -> Reply {
        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&task.target_endpoint)
            .and_then(|queue| queue.pop_front());
        scripted.unwrap_or_else(|| self.default.lock().unwrap().clone())
    }
}

impl Dispatcher for ScriptedDispatcher {
    fn dispatch<'a>(&'a self, task: &'a SyncTask) -> DispatchFuture<'a> {
        Box::pin(async move {
            let count = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(task.clone());
                calls.len()
            };
            if let Some((after, online)) = self.offline_after.lock().unwrap().as_ref() {
                if count >= *after {
                    online.send_replace(false);
                }
            }
            match self.next_reply(task) {
                Reply::Status(status) => Ok(DispatchOutcome::from_status(status)),
                Reply::Fail(err) => Err(err),
            }
        })
    }
}

/// Manual clock starting at a fixed, non-zero instant.
pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(1_700_000_000_000))
}
