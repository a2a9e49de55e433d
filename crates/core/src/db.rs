// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed storage engine shared by every store namespace.
//!
//! The [`Database`] handle is cheap to clone; all clones share one
//! connection. Store operations each run inside their own transaction, so
//! calls against the same namespace are serialized by the engine.

use rusqlite::{Connection, ErrorCode, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
-- One row per record; a namespace is a logical table
CREATE TABLE IF NOT EXISTS records (
    namespace TEXT NOT NULL,
    id TEXT NOT NULL,
    payload BLOB NOT NULL,
    created_at INTEGER NOT NULL,
    ttl_ms INTEGER,
    metadata TEXT,
    seq INTEGER NOT NULL,
    PRIMARY KEY (namespace, id)
);

-- Eviction scans oldest-first within a namespace
CREATE INDEX IF NOT EXISTS idx_records_age ON records(namespace, created_at, seq);

-- Next insertion sequence is MAX(seq) + 1
CREATE INDEX IF NOT EXISTS idx_records_seq ON records(seq);
"#;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: i64 = 2;

const DB_FILE_NAME: &str = "store.db";

/// Run schema creation on a database connection.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version < SCHEMA_VERSION {
        conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    Ok(())
}

/// Default on-disk location: `<data_dir>/lexsync/store.db`.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lexsync")
        .join(DB_FILE_NAME)
}

/// Map a storage-level SQLite failure to [`Error::StorageUnavailable`].
///
/// Errors that mean the backing file cannot be used at all are reported as
/// unavailable; everything else stays a plain database error.
pub(crate) fn classify(err: rusqlite::Error) -> Error {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::ReadOnly
            | ErrorCode::DatabaseCorrupt
            | ErrorCode::NotADatabase
            | ErrorCode::DiskFull
            | ErrorCode::PermissionDenied,
        ) => Error::StorageUnavailable(err.to_string()),
        _ => Error::Database(err),
    }
}

/// Shared SQLite connection handle.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open a database at the given path, creating and migrating if needed.
    ///
    /// Any failure is reported as [`Error::StorageUnavailable`]; there is no
    /// fallback to an in-memory store.
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |e: &dyn std::fmt::Display| {
            Error::StorageUnavailable(format!("{}: {e}", path.display()))
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| unavailable(&e))?;
            }
        }

        let conn = Connection::open(path).map_err(|e| unavailable(&e))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .map_err(|e| unavailable(&e))?;
        run_migrations(&conn).map_err(|e| unavailable(&e))?;

        Ok(Database { conn: Arc::new(Mutex::new(conn)), path: Some(path.to_path_buf()) })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Database { conn: Arc::new(Mutex::new(conn)), path: None })
    }

    /// Path of the backing file, `None` for in-memory databases.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lock the connection.
    ///
    /// A poisoned lock means a writer panicked mid-transaction; the handle
    /// is treated as unavailable from then on.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::StorageUnavailable("connection lock poisoned".to_string()))
    }

    /// Run `f` inside a single transaction, committing on success.
    ///
    /// The write lock is taken up front, so connections from other
    /// processes wait on the busy timeout instead of racing.
    pub(crate) fn transaction<R>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate).map_err(classify)?;
        let out = match f(&tx) {
            Ok(out) => out,
            Err(Error::Database(e)) => return Err(classify(e)),
            Err(e) => return Err(e),
        };
        tx.commit().map_err(classify)?;
        Ok(out)
    }

    /// List every namespace that currently holds at least one row.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT namespace FROM records ORDER BY namespace")
            .map_err(classify)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(classify)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(classify)?;
        Ok(names)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
