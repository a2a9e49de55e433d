// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! lxrs - offline-first persistence and synchronization engine.
//!
//! This crate provides the engine behind the `lexsync` CLI: a durable
//! namespaced record store (from `lx-core`), a persistent outbound sync
//! queue with bounded retries, and a connectivity monitor that drains the
//! queue on reconnect.
//!
//! # Main Components
//!
//! - [`Engine`] - Context owning the store, coordinator, monitor and housekeeper
//! - [`Config`] - TOML configuration (database path, bounds, retry settings)
//! - [`sync`] - Coordinator, dispatcher, connectivity monitor, progress events
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use lxrs::{Config, Engine};
//! use lxrs::sync::HttpDispatcher;
//!
//! let config = Config::resolve(None)?;
//! let dispatcher = HttpDispatcher::new(config.request_timeout())?;
//! let mut engine = Engine::init(config, Arc::new(dispatcher), Arc::new(SystemClock))?;
//! engine.start()?;
//!
//! engine.write("notes", "n1", json!({"title": "hi"}), None)?;
//! engine.mark_for_sync(TaskSpec::new("note.saved", "https://api.example.com/notes", json!({"id": "n1"})))?;
//!
//! engine.dispose().await;
//! ```

mod cli;
mod commands;

pub mod config;
pub mod engine;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, MethodArg, OutputFormat, PriorityArg};
pub use config::Config;
pub use engine::Engine;
pub use error::{Error, Result};

use commands::queue::EnqueueArgs;
use commands::Globals;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let globals = Globals { config: cli.config, offline: cli.offline };
    match cli.command {
        Command::Put { namespace, id, payload, ttl_ms, meta, output } => commands::store::put(
            &globals,
            &namespace,
            &id,
            &payload,
            ttl_ms,
            &meta.meta,
            output.output,
        ),
        Command::Get { namespace, id, output } => {
            commands::store::get(&globals, &namespace, &id, output.output)
        }
        Command::Rm { namespace, id } => commands::store::remove(&globals, &namespace, &id),
        Command::Ls { namespace, meta, output } => {
            commands::store::list(&globals, namespace.as_deref(), &meta.meta, output.output)
        }
        Command::Clear { namespace } => commands::store::clear(&globals, &namespace),
        Command::Purge => commands::store::purge(&globals),
        Command::Enqueue {
            kind,
            endpoint,
            payload,
            method,
            priority,
            max_attempts,
            headers,
            now,
            output,
        } => commands::queue::enqueue(
            &globals,
            EnqueueArgs { kind, endpoint, payload, method, priority, max_attempts, headers },
            now,
            output.output,
        ),
        Command::Pending { output } => commands::queue::pending(&globals, output.output),
        Command::Sync { output } => commands::queue::sync(&globals, output.output),
        Command::Retry { id, output } => commands::queue::retry(&globals, &id, output.output),
        Command::Status { output } => commands::queue::status(&globals, output.output),
        Command::DropQueue => commands::queue::drop_queue(&globals),
        Command::Watch { output } => commands::watch::run(&globals, output.output),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
