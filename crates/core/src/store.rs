// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Namespaced durable key-value store with expiry and capacity bounds.
//!
//! A [`Store`] is a typed view over one namespace of a shared [`Database`].
//!
//! - Reads never return a record older than its effective ttl. `get` also
//!   deletes the expired row it finds; list reads only filter, and
//!   [`Store::purge_expired`] removes the rest.
//! - Inserting a new id into a full namespace first evicts the oldest
//!   record by `created_at` (insertion age, not read recency).
//! - Overwriting an existing id never evicts.

use rusqlite::{params, OptionalExtension, Transaction};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{ClockSource, SystemClock};
use crate::codec::{Codec, JsonCodec};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::record::{Metadata, Record};

/// Prefix reserved for engine-internal namespaces.
pub const RESERVED_PREFIX: &str = "__";

/// Bounds applied to a single namespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Maximum number of records held; `None` is unbounded.
    pub capacity: Option<usize>,
    /// Ttl for records written without their own override.
    pub default_ttl: Option<Duration>,
}

impl StoreOptions {
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }
}

/// Raw row as read from SQLite, before payload decoding.
struct RawRecord {
    id: String,
    payload: Vec<u8>,
    created_at: u64,
    ttl_ms: Option<u64>,
    metadata: Option<String>,
}

const SELECT_COLUMNS: &str = "SELECT id, payload, created_at, ttl_ms, metadata FROM records";

fn map_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        id: row.get(0)?,
        payload: row.get(1)?,
        created_at: row.get::<_, i64>(2)? as u64,
        ttl_ms: row.get::<_, Option<i64>>(3)?.map(|v| v as u64),
        metadata: row.get(4)?,
    })
}

fn validate_namespace(namespace: &str, allow_reserved: bool) -> Result<()> {
    if namespace.trim().is_empty() {
        return Err(Error::InvalidNamespace(namespace.to_string()));
    }
    if !allow_reserved && namespace.starts_with(RESERVED_PREFIX) {
        return Err(Error::InvalidNamespace(namespace.to_string()));
    }
    Ok(())
}

/// Typed handle over one namespace.
pub struct Store<T, C = JsonCodec> {
    db: Database,
    namespace: String,
    options: StoreOptions,
    codec: C,
    clock: Arc<dyn ClockSource>,
    _payload: PhantomData<fn() -> T>,
}

impl<T, C: Clone> Clone for Store<T, C> {
    fn clone(&self) -> Self {
        Store {
            db: self.db.clone(),
            namespace: self.namespace.clone(),
            options: self.options,
            codec: self.codec.clone(),
            clock: Arc::clone(&self.clock),
            _payload: PhantomData,
        }
    }
}

impl<T> Store<T, JsonCodec>
where
    JsonCodec: Codec<T>,
{
    /// Open a JSON-encoded store over `namespace`.
    pub fn open(db: &Database, namespace: &str, options: StoreOptions) -> Result<Self> {
        Self::with_codec(db, namespace, options, JsonCodec)
    }
}

impl<T, C: Codec<T>> Store<T, C> {
    /// Open a store with a caller-supplied codec.
    pub fn with_codec(db: &Database, namespace: &str, options: StoreOptions, codec: C) -> Result<Self> {
        validate_namespace(namespace, false)?;
        Self::build(db, namespace, options, codec)
    }

    /// Open an engine-internal namespace (one starting with `__`).
    pub fn open_reserved(db: &Database, namespace: &str, options: StoreOptions, codec: C) -> Result<Self> {
        validate_namespace(namespace, true)?;
        if !namespace.starts_with(RESERVED_PREFIX) {
            return Err(Error::InvalidNamespace(namespace.to_string()));
        }
        Self::build(db, namespace, options, codec)
    }

    fn build(db: &Database, namespace: &str, options: StoreOptions, codec: C) -> Result<Self> {
        if options.capacity == Some(0) {
            return Err(Error::InvalidInput("store capacity must be at least 1".to_string()));
        }
        Ok(Store {
            db: db.clone(),
            namespace: namespace.to_string(),
            options,
            codec,
            clock: Arc::new(SystemClock),
            _payload: PhantomData,
        })
    }

    /// Replace the clock used for timestamps and expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = clock;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    fn decode(&self, raw: RawRecord) -> Result<Record<T>> {
        let payload = self.codec.decode(&raw.payload)?;
        let metadata = match raw.metadata {
            Some(text) => Some(serde_json::from_str::<Metadata>(&text).map_err(|e| {
                Error::CorruptedData(format!("metadata of '{}' in '{}': {e}", raw.id, self.namespace))
            })?),
            None => None,
        };
        Ok(Record { id: raw.id, payload, created_at: raw.created_at, ttl_ms: raw.ttl_ms, metadata })
    }

    fn expired(&self, raw: &RawRecord, now: u64) -> bool {
        let ttl = raw.ttl_ms.or_else(|| self.options.default_ttl.map(|d| d.as_millis() as u64));
        matches!(ttl, Some(ttl) if now.saturating_sub(raw.created_at) > ttl)
    }

    /// Get a record by id. `None` if absent or expired.
    pub fn get(&self, id: &str) -> Result<Option<Record<T>>> {
        let now = self.clock.now_ms();
        let raw = self.db.transaction(|tx| {
            let raw = tx
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE namespace = ?1 AND id = ?2"),
                    params![self.namespace, id],
                    map_raw,
                )
                .optional()?;
            match raw {
                Some(raw) if self.expired(&raw, now) => {
                    tx.execute(
                        "DELETE FROM records WHERE namespace = ?1 AND id = ?2",
                        params![self.namespace, id],
                    )?;
                    tracing::debug!(namespace = %self.namespace, id, "dropped expired record on read");
                    Ok(None)
                }
                other => Ok(other),
            }
        })?;
        raw.map(|r| self.decode(r)).transpose()
    }

    /// Insert or fully overwrite a record using the store's default ttl.
    pub fn put(&self, id: &str, payload: T, metadata: Option<Metadata>) -> Result<Record<T>> {
        self.write(id, payload, None, metadata)
    }

    /// Insert or fully overwrite a record with its own ttl.
    pub fn put_with_ttl(
        &self,
        id: &str,
        payload: T,
        ttl: Duration,
        metadata: Option<Metadata>,
    ) -> Result<Record<T>> {
        self.write(id, payload, Some(ttl.as_millis() as u64), metadata)
    }

    /// Insert or overwrite a record whose payload embeds its insertion
    /// sequence.
    ///
    /// `build` receives the sequence allocated inside the write
    /// transaction. Sequences strictly increase across every connection to
    /// the same database file while the newest row lives.
    pub fn put_sequenced(
        &self,
        id: &str,
        build: impl FnOnce(u64) -> T,
        metadata: Option<Metadata>,
    ) -> Result<Record<T>> {
        if id.is_empty() {
            return Err(Error::InvalidInput("record id cannot be empty".to_string()));
        }
        let meta_text = metadata.as_ref().map(serde_json::to_string).transpose()?;
        let now = self.clock.now_ms();

        let payload = self.db.transaction(|tx| {
            let seq = next_seq(tx)?;
            let payload = build(seq as u64);
            let bytes = self.codec.encode(&payload)?;
            let exists: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM records WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id],
                |row| row.get(0),
            )?;
            if !exists {
                if let Some(capacity) = self.options.capacity {
                    self.evict_to_fit(tx, capacity)?;
                }
            }
            insert_row(tx, &self.namespace, id, &bytes, now, None, meta_text.as_deref(), seq)?;
            Ok(payload)
        })?;

        Ok(Record { id: id.to_string(), payload, created_at: now, ttl_ms: None, metadata })
    }

    fn write(
        &self,
        id: &str,
        payload: T,
        ttl_ms: Option<u64>,
        metadata: Option<Metadata>,
    ) -> Result<Record<T>> {
        if id.is_empty() {
            return Err(Error::InvalidInput("record id cannot be empty".to_string()));
        }
        let bytes = self.codec.encode(&payload)?;
        let meta_text = metadata.as_ref().map(serde_json::to_string).transpose()?;
        let now = self.clock.now_ms();

        self.db.transaction(|tx| {
            let exists: bool = tx.query_row(
                "SELECT COUNT(*) > 0 FROM records WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id],
                |row| row.get(0),
            )?;
            if !exists {
                if let Some(capacity) = self.options.capacity {
                    self.evict_to_fit(tx, capacity)?;
                }
            }
            let seq = next_seq(tx)?;
            insert_row(tx, &self.namespace, id, &bytes, now, ttl_ms, meta_text.as_deref(), seq)
        })?;

        Ok(Record { id: id.to_string(), payload, created_at: now, ttl_ms, metadata })
    }

    /// Overwrite a record only if it still exists, keeping its ttl override.
    /// Returns `false` without writing when the id is absent.
    pub fn update(&self, id: &str, payload: T, metadata: Option<Metadata>) -> Result<bool> {
        let bytes = self.codec.encode(&payload)?;
        let meta_text = metadata.as_ref().map(serde_json::to_string).transpose()?;
        let now = self.clock.now_ms();

        self.db.transaction(|tx| {
            let existing = tx
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE namespace = ?1 AND id = ?2"),
                    params![self.namespace, id],
                    map_raw,
                )
                .optional()?;
            match existing {
                Some(raw) if !self.expired(&raw, now) => {
                    let seq = next_seq(tx)?;
                    let meta = meta_text.as_deref();
                    insert_row(tx, &self.namespace, id, &bytes, now, raw.ttl_ms, meta, seq)?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        })
    }

    /// Evict oldest records until one more insert fits under `capacity`.
    fn evict_to_fit(&self, tx: &Transaction<'_>, capacity: usize) -> Result<()> {
        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM records WHERE namespace = ?1",
            params![self.namespace],
            |row| row.get(0),
        )?;
        let excess = (count as usize + 1).saturating_sub(capacity);
        if excess == 0 {
            return Ok(());
        }

        let victims: Vec<String> = tx
            .prepare(
                "SELECT id FROM records WHERE namespace = ?1
                 ORDER BY created_at ASC, seq ASC LIMIT ?2",
            )?
            .query_map(params![self.namespace, excess as i64], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;

        for victim in victims {
            tx.execute(
                "DELETE FROM records WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, victim],
            )?;
            tracing::info!(namespace = %self.namespace, id = %victim, capacity, "capacity eviction");
        }
        Ok(())
    }

    /// Remove a record. Returns whether anything was deleted.
    pub fn remove(&self, id: &str) -> Result<bool> {
        let changed = self.db.transaction(|tx| {
            Ok(tx.execute(
                "DELETE FROM records WHERE namespace = ?1 AND id = ?2",
                params![self.namespace, id],
            )?)
        })?;
        Ok(changed > 0)
    }

    /// Remove every record in the namespace. Returns the number removed.
    pub fn clear(&self) -> Result<usize> {
        self.db.transaction(|tx| {
            Ok(tx.execute("DELETE FROM records WHERE namespace = ?1", params![self.namespace])?)
        })
    }

    /// All live records, oldest first.
    pub fn get_all(&self) -> Result<Vec<Record<T>>> {
        let now = self.clock.now_ms();
        let rows = self.db.transaction(|tx| {
            let rows = tx
                .prepare(&format!(
                    "{SELECT_COLUMNS} WHERE namespace = ?1 ORDER BY created_at ASC, seq ASC"
                ))?
                .query_map(params![self.namespace], map_raw)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .filter(|raw| !self.expired(raw, now))
            .map(|raw| self.decode(raw))
            .collect()
    }

    /// Atomically replace the whole namespace with `records`.
    ///
    /// Timestamps, ttls and metadata are taken from the records as given.
    /// When the list exceeds capacity the oldest entries are evicted, as if
    /// they had been inserted one by one.
    pub fn set_all(&self, records: Vec<Record<T>>) -> Result<()> {
        let mut encoded = Vec::with_capacity(records.len());
        for record in &records {
            if record.id.is_empty() {
                return Err(Error::InvalidInput("record id cannot be empty".to_string()));
            }
            let bytes = self.codec.encode(&record.payload)?;
            let meta = record.metadata.as_ref().map(serde_json::to_string).transpose()?;
            encoded.push((record, bytes, meta));
        }
        // Stable sort keeps list order among equal timestamps.
        encoded.sort_by_key(|(record, _, _)| record.created_at);

        self.db.transaction(|tx| {
            tx.execute("DELETE FROM records WHERE namespace = ?1", params![self.namespace])?;
            for (record, bytes, meta) in &encoded {
                let exists: bool = tx.query_row(
                    "SELECT COUNT(*) > 0 FROM records WHERE namespace = ?1 AND id = ?2",
                    params![self.namespace, record.id],
                    |row| row.get(0),
                )?;
                if !exists {
                    if let Some(capacity) = self.options.capacity {
                        self.evict_to_fit(tx, capacity)?;
                    }
                }
                insert_row(
                    tx,
                    &self.namespace,
                    &record.id,
                    bytes,
                    record.created_at,
                    record.ttl_ms,
                    meta.as_deref(),
                    next_seq(tx)?,
                )?;
            }
            Ok(())
        })
    }

    /// Live records accepted by `predicate`.
    pub fn find(&self, predicate: impl Fn(&Record<T>) -> bool) -> Result<Vec<Record<T>>> {
        Ok(self.get_all()?.into_iter().filter(|r| predicate(r)).collect())
    }

    /// Live records whose metadata contains every entry of `partial`.
    pub fn query(&self, partial: &Metadata) -> Result<Vec<Record<T>>> {
        self.find(|r| r.matches_metadata(partial))
    }

    /// Housekeeping: delete every expired record. Returns the number purged.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let default_ttl = self.options.default_ttl.map(|d| d.as_millis() as i64);
        let purged = self.db.transaction(|tx| {
            Ok(tx.execute(
                "DELETE FROM records
                 WHERE namespace = ?1
                   AND COALESCE(ttl_ms, ?2) IS NOT NULL
                   AND ?3 - created_at > COALESCE(ttl_ms, ?2)",
                params![self.namespace, default_ttl, now as i64],
            )?)
        })?;
        if purged > 0 {
            tracing::debug!(namespace = %self.namespace, purged, "purged expired records");
        }
        Ok(purged)
    }

    /// Number of live records.
    pub fn len(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        let rows = self.db.transaction(|tx| {
            let rows = tx
                .prepare(
                    "SELECT id, x'', created_at, ttl_ms, NULL FROM records WHERE namespace = ?1",
                )?
                .query_map(params![self.namespace], map_raw)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;
        Ok(rows.iter().filter(|raw| !self.expired(raw, now)).count())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Next insertion sequence, unique across the whole database file.
///
/// A bare `MAX` lets SQLite answer from `idx_records_seq`.
fn next_seq(tx: &Transaction<'_>) -> Result<i64> {
    let max: Option<i64> = tx.query_row("SELECT MAX(seq) FROM records", [], |row| row.get(0))?;
    Ok(max.unwrap_or(0) + 1)
}

#[allow(clippy::too_many_arguments)]
fn insert_row(
    tx: &Transaction<'_>,
    namespace: &str,
    id: &str,
    payload: &[u8],
    created_at: u64,
    ttl_ms: Option<u64>,
    metadata: Option<&str>,
    seq: i64,
) -> Result<()> {
    tx.execute(
        "INSERT OR REPLACE INTO records (namespace, id, payload, created_at, ttl_ms, metadata, seq)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            namespace,
            id,
            payload,
            created_at as i64,
            ttl_ms.map(|v| v as i64),
            metadata,
            seq
        ],
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
