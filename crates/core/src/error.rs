// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for lx-core operations.

use thiserror::Error;

/// All possible errors that can occur in lx-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("storage unavailable: {0}\n  hint: check that the database path is writable")]
    StorageUnavailable(String),

    #[error("invalid namespace: '{0}'\n  hint: namespaces are non-empty and may not start with '__'")]
    InvalidNamespace(String),

    #[error("invalid priority: '{0}'\n  hint: valid priorities are: critical, high, medium, low")]
    InvalidPriority(String),

    #[error("invalid http method: '{0}'\n  hint: valid methods are: POST, PUT, PATCH, DELETE")]
    InvalidMethod(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for lx-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
