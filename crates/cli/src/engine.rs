// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine context.
//!
//! An [`Engine`] owns the database handle, the sync coordinator, the
//! connectivity monitor and the housekeeper. Construction does no
//! background work; [`Engine::start`] spawns the drain runner, the
//! housekeeping pass and (when a health URL is configured) the probe, and
//! [`Engine::dispose`] stops and awaits them.

use std::sync::Arc;

use lx_core::{
    BytesCodec, ClockSource, Codec, Database, JsonCodec, Metadata, Record, Store, SyncTask,
    TaskSpec,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::sync::{
    ConnectivityMonitor, Dispatcher, EventBus, Housekeeper, HttpProbe, OptionsResolver,
    Subscription, SyncCoordinator, SyncOutcome, SyncReport, SyncState, SyncTrigger, Transition,
};

pub struct Engine {
    config: Arc<Config>,
    db: Database,
    clock: Arc<dyn ClockSource>,
    events: EventBus,
    monitor: Arc<ConnectivityMonitor>,
    coordinator: Arc<SyncCoordinator>,
    housekeeper: Arc<Housekeeper>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Engine {
    /// Open the configured database and wire the engine over it.
    pub fn init(
        config: Config,
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let db = Database::open(&config.database_path())?;
        Self::with_database(config, db, dispatcher, clock)
    }

    /// Wire the engine over an already open database.
    pub fn with_database(
        config: Config,
        db: Database,
        dispatcher: Arc<dyn Dispatcher>,
        clock: Arc<dyn ClockSource>,
    ) -> Result<Self> {
        let config = Arc::new(config);
        let events = EventBus::default();
        let monitor =
            Arc::new(ConnectivityMonitor::new(config.sync.assume_online, SyncTrigger::new()));
        let coordinator = Arc::new(SyncCoordinator::new(
            &db,
            dispatcher,
            config.coordinator_config(),
            Arc::clone(&clock),
            monitor.subscribe(),
            events.clone(),
        )?);

        let resolver_config = Arc::clone(&config);
        let resolver: OptionsResolver = Arc::new(move |ns: &str| resolver_config.store_options(ns));
        let housekeeper = Arc::new(Housekeeper::new(db.clone(), Arc::clone(&clock), resolver));

        tracing::debug!(db = ?db.path(), online = monitor.is_online(), "engine initialized");
        Ok(Engine {
            config,
            db,
            clock,
            events,
            monitor,
            coordinator,
            housekeeper,
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    /// Spawn the background tasks. Must be called inside a tokio runtime.
    ///
    /// Tasks left over from an earlier session are drained right away when
    /// the engine starts online.
    pub fn start(&mut self) -> Result<()> {
        if !self.tasks.is_empty() {
            return Ok(());
        }
        let trigger = self.monitor.trigger().clone();
        self.tasks.push(trigger.spawn_runner(Arc::clone(&self.coordinator), self.cancel.clone()));
        self.tasks.push(
            Arc::clone(&self.housekeeper)
                .spawn(self.config.housekeeping_interval(), self.cancel.clone()),
        );
        if let Some(url) = &self.config.sync.health_url {
            let probe = Arc::new(HttpProbe::new(url.clone(), self.config.request_timeout())?);
            self.tasks.push(self.monitor.spawn_probe(
                probe,
                self.config.probe_interval(),
                self.cancel.clone(),
            ));
        }
        if self.monitor.is_online() && !self.coordinator.pending()?.is_empty() {
            trigger.request();
        }
        tracing::info!(tasks = self.tasks.len(), "engine started");
        Ok(())
    }

    /// Stop background tasks and wait for them to finish.
    ///
    /// A drain in progress runs to completion first.
    pub async fn dispose(self) {
        self.cancel.cancel();
        for handle in self.tasks {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
        tracing::debug!("engine disposed");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    // Durable store

    /// Typed JSON store over `namespace` with its configured bounds.
    pub fn store<T>(&self, namespace: &str) -> Result<Store<T>>
    where
        JsonCodec: Codec<T>,
    {
        Ok(Store::open(&self.db, namespace, self.config.store_options(namespace))?
            .with_clock(Arc::clone(&self.clock)))
    }

    fn raw_store(&self, namespace: &str) -> Result<Store<Vec<u8>, BytesCodec>> {
        Ok(Store::with_codec(&self.db, namespace, self.config.store_options(namespace), BytesCodec)?
            .with_clock(Arc::clone(&self.clock)))
    }

    pub fn write<T>(
        &self,
        namespace: &str,
        id: &str,
        payload: T,
        metadata: Option<Metadata>,
    ) -> Result<Record<T>>
    where
        JsonCodec: Codec<T>,
    {
        Ok(self.store(namespace)?.put(id, payload, metadata)?)
    }

    pub fn read<T>(&self, namespace: &str, id: &str) -> Result<Option<Record<T>>>
    where
        JsonCodec: Codec<T>,
    {
        Ok(self.store(namespace)?.get(id)?)
    }

    /// Remove a record. Returns `false` when it was not present.
    pub fn delete(&self, namespace: &str, id: &str) -> Result<bool> {
        Ok(self.raw_store(namespace)?.remove(id)?)
    }

    /// Live records of `namespace`, optionally filtered.
    pub fn list<T>(
        &self,
        namespace: &str,
        predicate: Option<&dyn Fn(&Record<T>) -> bool>,
    ) -> Result<Vec<Record<T>>>
    where
        JsonCodec: Codec<T>,
    {
        let store = self.store(namespace)?;
        Ok(match predicate {
            Some(predicate) => store.find(predicate)?,
            None => store.get_all()?,
        })
    }

    /// Drop every record of `namespace`.
    pub fn clear(&self, namespace: &str) -> Result<usize> {
        Ok(self.raw_store(namespace)?.clear()?)
    }

    /// One housekeeping pass over all user namespaces.
    pub fn purge_expired(&self) -> Result<usize> {
        self.housekeeper.run_once()
    }

    /// User namespaces that currently hold records.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        Ok(self
            .db
            .namespaces()?
            .into_iter()
            .filter(|ns| !ns.starts_with(lx_core::RESERVED_PREFIX))
            .collect())
    }

    // Sync

    /// Queue a task for delivery and, when online, request a drain.
    pub fn mark_for_sync(&self, spec: TaskSpec) -> Result<SyncTask> {
        let task = self.coordinator.enqueue(spec)?;
        if self.monitor.is_online() {
            self.monitor.trigger().request();
        }
        Ok(task)
    }

    pub async fn run_sync(&self) -> SyncReport {
        self.coordinator.run_sync().await
    }

    pub async fn retry(&self, id: &str) -> Result<Option<SyncOutcome>> {
        self.coordinator.retry(id).await
    }

    pub fn state(&self) -> Result<SyncState> {
        self.coordinator.state()
    }

    /// Progress channel.
    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe()
    }

    pub fn set_online(&self, online: bool) -> Transition {
        self.monitor.set_online(online)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("db", &self.db)
            .field("online", &self.monitor.is_online())
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
