// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher abstraction for delivering sync tasks.
//!
//! Provides a trait-based delivery layer that enables:
//! - Real HTTP delivery for production
//! - Scripted dispatchers for unit testing

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use lx_core::{HttpMethod, SyncTask};

/// Error type for dispatch operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The remote could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the transport timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The request could not be built (bad URL or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// What the remote answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 2xx response.
    Delivered { status: u16 },
    /// Any other response.
    Rejected { status: u16 },
}

impl DispatchOutcome {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            DispatchOutcome::Delivered { status }
        } else {
            DispatchOutcome::Rejected { status }
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            DispatchOutcome::Delivered { status } | DispatchOutcome::Rejected { status } => *status,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered { .. })
    }
}

/// Boxed dispatch future.
pub type DispatchFuture<'a> =
    Pin<Box<dyn Future<Output = DispatchResult<DispatchOutcome>> + Send + 'a>>;

/// Delivery trait for sync tasks.
///
/// This trait abstracts over the actual delivery mechanism, allowing
/// for easy testing with mock implementations.
pub trait Dispatcher: Send + Sync {
    /// Issue one delivery attempt for `task`.
    fn dispatch<'a>(&'a self, task: &'a SyncTask) -> DispatchFuture<'a>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Arc<D> {
    fn dispatch<'a>(&'a self, task: &'a SyncTask) -> DispatchFuture<'a> {
        (**self).dispatch(task)
    }
}

/// HTTP dispatcher implementation using reqwest.
///
/// Sends the task payload as a JSON body with the task's method and headers.
/// A `DELETE` with a null payload is sent without a body. No authentication
/// is added; callers pass credentials through task headers.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
}

impl HttpDispatcher {
    /// Create a dispatcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> DispatchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::InvalidRequest(e.to_string()))?;
        Ok(HttpDispatcher { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        HttpDispatcher { client }
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> DispatchError {
    if err.is_timeout() {
        DispatchError::Timeout(err.to_string())
    } else if err.is_builder() {
        DispatchError::InvalidRequest(err.to_string())
    } else {
        DispatchError::Network(err.to_string())
    }
}

impl Dispatcher for HttpDispatcher {
    fn dispatch<'a>(&'a self, task: &'a SyncTask) -> DispatchFuture<'a> {
        Box::pin(async move {
            let mut request = self
                .client
                .request(to_reqwest_method(task.http_method), &task.target_endpoint);
            for (name, value) in &task.headers {
                request = request.header(name.as_str(), value.as_str());
            }
            let bodyless = task.http_method == HttpMethod::Delete && task.payload.is_null();
            if !bodyless {
                request = request.json(&task.payload);
            }

            let response = request.send().await.map_err(classify)?;
            Ok(DispatchOutcome::from_status(response.status().as_u16()))
        })
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
