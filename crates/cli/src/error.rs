// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::DispatchError;

/// All possible errors that can occur in the lxrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] lx_core::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("sync task not found: {0}\n  hint: run 'lexsync pending' to list queued tasks")]
    TaskNotFound(String),

    #[error("record not found: {namespace}/{id}")]
    RecordNotFound { namespace: String, id: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for lxrs operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the underlying database could not be used at all.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::Core(lx_core::Error::StorageUnavailable(_)))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
