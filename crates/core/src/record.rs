// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Stored records and their expiry rules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Free-form caller metadata attached to a record.
///
/// Producers use it to flag sync state (`{"sync": "pending"}`) and other
/// bookkeeping the engine does not interpret.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A persisted `(id, payload, timestamp, ttl, metadata)` tuple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: String,
    pub payload: T,
    /// Milliseconds since Unix epoch at the time of the last write.
    pub created_at: u64,
    /// Per-record ttl override in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl<T> Record<T> {
    /// The ttl that applies to this record: its own override, else the
    /// store-wide default.
    pub fn effective_ttl(&self, default_ttl: Option<Duration>) -> Option<u64> {
        self.ttl_ms.or_else(|| default_ttl.map(|d| d.as_millis() as u64))
    }

    /// Age of the record at `now_ms`. Saturates at zero for clock skew.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.created_at)
    }

    /// A record is expired once its age strictly exceeds its effective ttl.
    pub fn is_expired(&self, now_ms: u64, default_ttl: Option<Duration>) -> bool {
        match self.effective_ttl(default_ttl) {
            Some(ttl) => self.age_ms(now_ms) > ttl,
            None => false,
        }
    }

    /// True if every entry of `partial` is present in this record's metadata
    /// with an equal value. An empty match accepts every record.
    pub fn matches_metadata(&self, partial: &Metadata) -> bool {
        if partial.is_empty() {
            return true;
        }
        let Some(meta) = &self.metadata else {
            return false;
        };
        partial.iter().all(|(k, v)| meta.get(k) == Some(v))
    }

    /// Look up a single metadata entry.
    pub fn meta(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
