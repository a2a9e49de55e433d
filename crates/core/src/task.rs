// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync task types.
//!
//! A [`SyncTask`] is a persisted intent to deliver a payload to a remote
//! endpoint, carrying its own retry bookkeeping.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Delivery priority. Declaration order is dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Ordinal rank, 0 is dispatched first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 0,
            Priority::High => 1,
            Priority::Medium => 2,
            Priority::Low => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "critical" | "0" => Ok(Priority::Critical),
            "high" | "1" => Ok(Priority::High),
            "medium" | "med" | "2" => Ok(Priority::Medium),
            "low" | "3" => Ok(Priority::Low),
            _ => Err(Error::InvalidPriority(s.to_string())),
        }
    }
}

/// HTTP verbs a sync task may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// What a producer supplies when marking a change for sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub kind: String,
    pub payload: serde_json::Value,
    pub endpoint: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// `None` takes the coordinator's configured default.
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub priority: Priority,
}

impl TaskSpec {
    pub fn new(kind: impl Into<String>, endpoint: impl Into<String>, payload: serde_json::Value) -> Self {
        TaskSpec {
            kind: kind.into(),
            payload,
            endpoint: endpoint.into(),
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            max_attempts: None,
            priority: Priority::default(),
        }
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Reject a `TaskSpec` that cannot be delivered.
    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(Error::InvalidInput("task kind cannot be empty".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(Error::InvalidInput("task endpoint cannot be empty".to_string()));
        }
        if self.max_attempts == Some(0) {
            return Err(Error::InvalidInput("max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// A persisted delivery intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTask {
    pub id: String,
    pub kind: String,
    pub payload: serde_json::Value,
    pub target_endpoint: String,
    pub http_method: HttpMethod,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Dispatch attempts made so far.
    pub attempt: u32,
    pub max_attempts: u32,
    /// Milliseconds since Unix epoch.
    pub enqueued_at: u64,
    pub priority: Priority,
    /// Enqueue sequence, breaks ties between tasks enqueued in the same
    /// millisecond.
    #[serde(default)]
    pub seq: u64,
    /// Last failure, for status reporting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl SyncTask {
    /// Build a task from a validated spec.
    pub fn from_spec(
        id: String,
        spec: TaskSpec,
        default_max_attempts: u32,
        enqueued_at: u64,
        seq: u64,
    ) -> Self {
        SyncTask {
            id,
            kind: spec.kind,
            payload: spec.payload,
            target_endpoint: spec.endpoint,
            http_method: spec.method,
            headers: spec.headers,
            attempt: 0,
            max_attempts: spec.max_attempts.unwrap_or(default_max_attempts).max(1),
            enqueued_at,
            priority: spec.priority,
            seq,
            last_error: None,
        }
    }

    /// True once no further attempts are allowed.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Dispatch order: priority rank, then enqueue time, then sequence.
    pub fn dispatch_order(&self, other: &SyncTask) -> Ordering {
        self.priority
            .rank()
            .cmp(&other.priority.rank())
            .then_with(|| self.enqueued_at.cmp(&other.enqueued_at))
            .then_with(|| self.seq.cmp(&other.seq))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Sort tasks into dispatch order in place.
pub fn sort_for_dispatch(tasks: &mut [SyncTask]) {
    tasks.sort_by(|a, b| a.dispatch_order(b));
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
