// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound synchronization.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  offline→online  ┌─────────────┐     ┌─────────────┐
//! │   Monitor   │─────────────────►│ Coordinator │────►│ Dispatcher  │──► HTTP
//! │ (watch<bool>)│   SyncTrigger    │ (run_sync)  │     │   (trait)   │
//! └─────────────┘                  └─────────────┘     └─────────────┘
//!                                         │
//!                                         ▼
//!                                  ┌─────────────┐
//!                                  │    Queue    │  (__sync_queue namespace)
//!                                  │   (Store)   │
//!                                  └─────────────┘
//! ```
//!
//! - Durable queue of [`SyncTask`](lx_core::SyncTask)s, drained in priority
//!   then enqueue order
//! - Per-task retry bookkeeping persisted after every failed attempt
//! - Progress reported on a broadcast [`EventBus`]
//! - Injectable dispatcher and probe traits for testing

mod coordinator;
mod dispatch;
mod events;
mod housekeeping;
mod monitor;

pub use coordinator::{
    CoordinatorConfig, Indicator, NoopHint, SyncCoordinator, SyncHint, SyncOutcome, SyncReport,
    SyncState, SyncStatus, QUEUE_NAMESPACE,
};
pub use dispatch::{
    DispatchError, DispatchFuture, DispatchOutcome, DispatchResult, Dispatcher, HttpDispatcher,
};
pub use events::{EventBus, Subscription, SyncEvent};
pub use housekeeping::{Housekeeper, OptionsResolver};
pub use monitor::{ConnectivityMonitor, ConnectivityProbe, HttpProbe, ProbeFuture, SyncTrigger, Transition};

#[cfg(test)]
pub(crate) mod test_helpers;
