// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: turns delivery intents into ordered, retried deliveries.
//!
//! Tasks live in the reserved `__sync_queue` namespace of the durable store,
//! so they survive restarts. A drain dispatches them one at a time in
//! priority order (FIFO within a priority). A failing task is retried in
//! place until it is delivered or exhausts its attempts, so later tasks
//! never overtake it.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;

use lx_core::{
    sort_for_dispatch, ClockSource, Database, JsonCodec, Metadata, Store, StoreOptions, SyncTask,
    TaskSpec,
};

use super::dispatch::{DispatchOutcome, Dispatcher};
use super::events::{EventBus, SyncEvent};
use crate::error::{Error, Result};

/// Reserved namespace holding pending sync tasks.
pub const QUEUE_NAMESPACE: &str = "__sync_queue";

/// Retry settings for the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Attempts for tasks that do not set their own.
    pub default_max_attempts: u32,
    /// Delay before the first in-place retry; doubles per attempt. Zero
    /// retries immediately.
    pub retry_backoff: Duration,
    /// Cap on the retry delay.
    pub retry_backoff_max: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            default_max_attempts: 3,
            retry_backoff: Duration::ZERO,
            retry_backoff_max: Duration::from_secs(30),
        }
    }
}

impl CoordinatorConfig {
    /// Delay before retrying a task that has failed `failures` times.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        if self.retry_backoff.is_zero() || failures == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(failures - 1);
        self.retry_backoff.saturating_mul(factor).min(self.retry_backoff_max)
    }
}

/// Aggregate queue status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Failed,
    Success,
}

impl SyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::Idle => "idle",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Failed => "failed",
            SyncStatus::Success => "success",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Another drain was already running; nothing was done.
    pub skipped: bool,
    /// Dispatch calls made.
    pub attempts: u32,
    pub delivered: usize,
    /// Tasks removed after exhausting their attempts.
    pub dropped: usize,
    /// Tasks still queued after the drain.
    pub remaining: usize,
    /// The drain stopped early because connectivity went offline.
    pub interrupted: bool,
    /// Storage failed during the drain.
    pub storage_failed: bool,
    pub status: SyncStatus,
}

impl SyncReport {
    fn skipped(status: SyncStatus) -> Self {
        SyncReport { skipped: true, status, ..SyncReport::default() }
    }
}

/// Result of settling one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Delivered and removed from the queue.
    Delivered { status: u16 },
    /// Failed; the task stays queued with `attempt` attempts used.
    Retrying { attempt: u32, error: String },
    /// Failed for the last time; the task was removed.
    Dropped { attempts: u32, error: String },
    /// Not dispatched: the task vanished or a drain owns the queue.
    Skipped,
}

/// Snapshot of coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncState {
    pub is_online: bool,
    pub is_syncing: bool,
    /// Pending tasks in dispatch order.
    pub pending: Vec<SyncTask>,
    /// Progress of the current or last drain, 0-100.
    pub progress: u8,
    pub status: SyncStatus,
}

/// Compact view for status indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Indicator {
    pub offline: bool,
    pub pending_count: usize,
    /// Present only while a drain runs.
    pub syncing_progress: Option<u8>,
    pub failed: bool,
}

impl SyncState {
    pub fn indicator(&self) -> Indicator {
        Indicator {
            offline: !self.is_online,
            pending_count: self.pending.len(),
            syncing_progress: self.is_syncing.then_some(self.progress),
            failed: self.status == SyncStatus::Failed,
        }
    }
}

/// Best-effort hook for scheduling background delivery with the host
/// platform. Not required for correctness.
pub trait SyncHint: Send + Sync {
    fn pending_changed(&self, pending: usize);
}

/// Hint that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHint;

impl SyncHint for NoopHint {
    fn pending_changed(&self, _pending: usize) {}
}

fn pending_metadata() -> Metadata {
    let mut meta = Metadata::new();
    meta.insert("sync".to_string(), json!("pending"));
    meta
}

/// Clears the syncing flag when a drain ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Coordinates delivery of queued sync tasks.
pub struct SyncCoordinator {
    queue: Store<SyncTask>,
    dispatcher: Arc<dyn Dispatcher>,
    config: CoordinatorConfig,
    clock: Arc<dyn ClockSource>,
    online: watch::Receiver<bool>,
    events: EventBus,
    hint: Arc<dyn SyncHint>,
    syncing: AtomicBool,
    progress: AtomicU8,
    status: watch::Sender<SyncStatus>,
}

impl SyncCoordinator {
    /// Create a coordinator over the queue namespace of `db`.
    ///
    /// `online` is the connectivity signal; a drain only dispatches while
    /// it reads `true`.
    pub fn new(
        db: &Database,
        dispatcher: Arc<dyn Dispatcher>,
        config: CoordinatorConfig,
        clock: Arc<dyn ClockSource>,
        online: watch::Receiver<bool>,
        events: EventBus,
    ) -> Result<Self> {
        let queue = Store::<SyncTask, JsonCodec>::open_reserved(
            db,
            QUEUE_NAMESPACE,
            StoreOptions::default(),
            JsonCodec,
        )?
        .with_clock(Arc::clone(&clock));
        let (status, _) = watch::channel(SyncStatus::Idle);

        Ok(SyncCoordinator {
            queue,
            dispatcher,
            config,
            clock,
            online,
            events,
            hint: Arc::new(NoopHint),
            syncing: AtomicBool::new(false),
            progress: AtomicU8::new(0),
            status,
        })
    }

    /// Install a background-delivery hint.
    pub fn with_hint(mut self, hint: Arc<dyn SyncHint>) -> Self {
        self.hint = hint;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Receiver of aggregate status changes.
    pub fn watch_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn status(&self) -> SyncStatus {
        *self.status.borrow()
    }

    /// Persist a new task tagged pending.
    pub fn enqueue(&self, spec: TaskSpec) -> Result<SyncTask> {
        spec.validate()?;
        let id = uuid::Uuid::new_v4().to_string();
        let enqueued_at = self.clock.now_ms();
        let default_max_attempts = self.config.default_max_attempts;
        let record = self.queue.put_sequenced(
            &id,
            |seq| SyncTask::from_spec(id.clone(), spec, default_max_attempts, enqueued_at, seq),
            Some(pending_metadata()),
        )?;
        let task = record.payload;

        let pending = self.queue.len()?;
        tracing::debug!(
            task_id = %task.id,
            kind = %task.kind,
            priority = %task.priority,
            pending,
            "enqueued sync task"
        );
        self.events.emit(SyncEvent::Enqueued { task_id: task.id.clone(), pending });
        if self.is_online() {
            self.hint.pending_changed(pending);
        }
        Ok(task)
    }

    /// Pending tasks in dispatch order.
    pub fn pending(&self) -> Result<Vec<SyncTask>> {
        let mut tasks: Vec<SyncTask> =
            self.queue.get_all()?.into_iter().map(|r| r.payload).collect();
        sort_for_dispatch(&mut tasks);
        Ok(tasks)
    }

    pub fn get_task(&self, id: &str) -> Result<Option<SyncTask>> {
        Ok(self.queue.get(id)?.map(|r| r.payload))
    }

    /// Remove every pending task. Returns the number removed.
    pub fn clear_queue(&self) -> Result<usize> {
        let removed = self.queue.clear()?;
        tracing::info!(removed, "cleared sync queue");
        Ok(removed)
    }

    /// Snapshot of the coordinator state.
    pub fn state(&self) -> Result<SyncState> {
        Ok(SyncState {
            is_online: self.is_online(),
            is_syncing: self.is_syncing(),
            pending: self.pending()?,
            progress: self.progress.load(Ordering::Acquire),
            status: self.status(),
        })
    }

    /// Drain the queue. Never fails; problems are reported in the result.
    ///
    /// Returns a skipped report at once when another drain is running.
    pub async fn run_sync(&self) -> SyncReport {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("sync already in progress, skipping");
            return SyncReport::skipped(self.status());
        }
        let _guard = DrainGuard(&self.syncing);

        self.progress.store(0, Ordering::Release);
        self.status.send_replace(SyncStatus::Syncing);
        tracing::info!("sync started");

        let mut report = self.drain().await;
        report.status = if report.dropped > 0 || report.storage_failed {
            SyncStatus::Failed
        } else if report.remaining == 0 {
            SyncStatus::Success
        } else {
            SyncStatus::Idle
        };
        if report.remaining == 0 {
            self.progress.store(100, Ordering::Release);
        }
        self.status.send_replace(report.status);

        tracing::info!(
            delivered = report.delivered,
            dropped = report.dropped,
            remaining = report.remaining,
            attempts = report.attempts,
            interrupted = report.interrupted,
            status = %report.status,
            "sync finished"
        );
        self.events.emit(SyncEvent::Completed { report: report.clone() });
        report
    }

    async fn drain(&self) -> SyncReport {
        let mut report = SyncReport::default();
        let mut handled: HashSet<String> = HashSet::new();
        let mut completed = 0usize;
        let mut total = 0usize;

        'drain: loop {
            let batch: Vec<SyncTask> = match self.pending() {
                Ok(tasks) => tasks.into_iter().filter(|t| !handled.contains(&t.id)).collect(),
                Err(e) => {
                    self.storage_failure(&mut report, None, &e);
                    break;
                }
            };
            if batch.is_empty() {
                break;
            }
            total += batch.len();

            for task in batch {
                if !self.is_online() {
                    tracing::info!("went offline, stopping sync");
                    report.interrupted = true;
                    break 'drain;
                }
                handled.insert(task.id.clone());
                let task_id = task.id.clone();
                match self.settle(task, &mut report).await {
                    Ok(SyncOutcome::Retrying { .. }) => {
                        // Stopped retrying because connectivity dropped.
                        report.interrupted = true;
                        break 'drain;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        self.storage_failure(&mut report, Some(task_id), &e);
                        break 'drain;
                    }
                }

                completed += 1;
                let progress = (completed * 100 / total.max(1)).min(100) as u8;
                self.progress.store(progress, Ordering::Release);
                self.events.emit(SyncEvent::Progress { progress, completed, total });
            }
        }

        report.remaining = match self.queue.len() {
            Ok(n) => n,
            Err(e) => {
                self.storage_failure(&mut report, None, &Error::from(e));
                total.saturating_sub(completed)
            }
        };
        report
    }

    /// Attempt `task` until it is delivered, dropped, vanishes, or
    /// connectivity drops between attempts.
    async fn settle(&self, task: SyncTask, report: &mut SyncReport) -> Result<SyncOutcome> {
        let id = task.id;
        loop {
            let Some(current) = self.get_task(&id)? else {
                tracing::debug!(task_id = %id, "task removed before dispatch, skipping");
                return Ok(SyncOutcome::Skipped);
            };

            report.attempts += 1;
            let outcome = self.attempt(current).await?;
            match &outcome {
                SyncOutcome::Delivered { .. } => report.delivered += 1,
                SyncOutcome::Dropped { .. } => report.dropped += 1,
                SyncOutcome::Skipped => {}
                SyncOutcome::Retrying { attempt, .. } => {
                    if !self.is_online() {
                        return Ok(outcome);
                    }
                    let delay = self.config.backoff_for(*attempt);
                    if !delay.is_zero() {
                        tracing::debug!(task_id = %id, delay_ms = delay.as_millis() as u64, "backing off");
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
            }
            return Ok(outcome);
        }
    }

    /// One dispatch with bookkeeping.
    async fn attempt(&self, mut task: SyncTask) -> Result<SyncOutcome> {
        tracing::debug!(
            task_id = %task.id,
            attempt = task.attempt + 1,
            max_attempts = task.max_attempts,
            endpoint = %task.target_endpoint,
            "dispatching sync task"
        );
        let error = match self.dispatcher.dispatch(&task).await {
            Ok(DispatchOutcome::Delivered { status }) => {
                self.queue.remove(&task.id)?;
                tracing::debug!(task_id = %task.id, status, "delivered sync task");
                return Ok(SyncOutcome::Delivered { status });
            }
            Ok(DispatchOutcome::Rejected { status }) => format!("rejected with status {status}"),
            Err(e) => e.to_string(),
        };

        task.attempt += 1;
        task.last_error = Some(error.clone());
        if task.is_exhausted() {
            self.queue.remove(&task.id)?;
            tracing::error!(
                task_id = %task.id,
                kind = %task.kind,
                attempts = task.attempt,
                error = %error,
                "dropping sync task after exhausting retries"
            );
            self.events.emit(SyncEvent::Error {
                task_id: Some(task.id.clone()),
                message: error.clone(),
                dropped: true,
            });
            return Ok(SyncOutcome::Dropped { attempts: task.attempt, error });
        }

        tracing::warn!(
            task_id = %task.id,
            attempt = task.attempt,
            max_attempts = task.max_attempts,
            error = %error,
            "sync attempt failed"
        );
        if !self.queue.update(&task.id, task.clone(), Some(pending_metadata()))? {
            tracing::debug!(task_id = %task.id, "task removed during dispatch");
            return Ok(SyncOutcome::Skipped);
        }
        self.events.emit(SyncEvent::Error {
            task_id: Some(task.id.clone()),
            message: error.clone(),
            dropped: false,
        });
        Ok(SyncOutcome::Retrying { attempt: task.attempt, error })
    }

    /// One manual dispatch attempt outside a drain.
    ///
    /// `None` when no task has that id.
    pub async fn retry(&self, id: &str) -> Result<Option<SyncOutcome>> {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(task_id = id, "sync in progress, manual retry skipped");
            return Ok(self.get_task(id)?.map(|_| SyncOutcome::Skipped));
        }
        let _guard = DrainGuard(&self.syncing);

        let Some(task) = self.get_task(id)? else {
            return Ok(None);
        };
        let outcome = self.attempt(task).await?;
        match outcome {
            SyncOutcome::Dropped { .. } => {
                self.status.send_replace(SyncStatus::Failed);
            }
            SyncOutcome::Delivered { .. } if self.queue.is_empty()? => {
                self.status.send_replace(SyncStatus::Success);
            }
            _ => {}
        }
        Ok(Some(outcome))
    }

    fn storage_failure(&self, report: &mut SyncReport, task_id: Option<String>, err: &Error) {
        tracing::error!(error = %err, "storage failure during sync");
        report.storage_failed = true;
        self.events.emit(SyncEvent::Error { task_id, message: err.to_string(), dropped: false });
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
