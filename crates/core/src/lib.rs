// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lx-core: durable storage primitives for lexsync
//!
//! This crate provides the namespaced record store, the SQLite database it
//! lives in, and the sync task types persisted by the coordinator.

pub mod clock;
pub mod codec;
pub mod db;
pub mod error;
pub mod record;
pub mod store;
pub mod task;

pub use clock::{ClockSource, ManualClock, SystemClock};
pub use codec::{BytesCodec, Codec, JsonCodec};
pub use db::Database;
pub use error::{Error, Result};
pub use record::{Metadata, Record};
pub use store::{Store, StoreOptions, RESERVED_PREFIX};
pub use task::{sort_for_dispatch, HttpMethod, Priority, SyncTask, TaskSpec};
