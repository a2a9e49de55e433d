// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic purge of expired records.

use std::sync::Arc;
use std::time::Duration;

use lx_core::{BytesCodec, ClockSource, Database, Store, StoreOptions, RESERVED_PREFIX};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Resolves the bounds of a namespace by name.
pub type OptionsResolver = Arc<dyn Fn(&str) -> StoreOptions + Send + Sync>;

/// Purges expired records from every user namespace.
pub struct Housekeeper {
    db: Database,
    clock: Arc<dyn ClockSource>,
    options: OptionsResolver,
}

impl Housekeeper {
    pub fn new(db: Database, clock: Arc<dyn ClockSource>, options: OptionsResolver) -> Self {
        Housekeeper { db, clock, options }
    }

    /// One pass over all namespaces. Returns the total purged.
    ///
    /// Payloads are never decoded, so namespaces of any payload type can
    /// be purged through the same raw view.
    pub fn run_once(&self) -> Result<usize> {
        let mut total = 0;
        for namespace in self.db.namespaces()? {
            if namespace.starts_with(RESERVED_PREFIX) {
                continue;
            }
            let store: Store<Vec<u8>, BytesCodec> =
                Store::with_codec(&self.db, &namespace, (self.options)(&namespace), BytesCodec)?
                    .with_clock(Arc::clone(&self.clock));
            let purged = store.purge_expired()?;
            if purged > 0 {
                tracing::debug!(namespace = %namespace, purged, "housekeeping purge");
            }
            total += purged;
        }
        Ok(total)
    }

    /// Run a pass every `interval` until cancelled.
    pub fn spawn(self: Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once() {
                            tracing::error!(error = %e, "housekeeping pass failed");
                        }
                    }
                }
            }
        })
    }
}

impl std::fmt::Debug for Housekeeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Housekeeper").field("db", &self.db).finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "housekeeping_tests.rs"]
mod tests;
