// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod queue;
pub mod store;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use lx_core::{Metadata, SystemClock};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::sync::HttpDispatcher;

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub offline: bool,
}

/// Resolve the configuration and apply global flags to it.
pub fn load_config(globals: &Globals) -> Result<Config> {
    let mut config = Config::resolve(globals.config.as_deref())?;
    if globals.offline {
        config.sync.assume_online = false;
        config.sync.health_url = None;
    }
    Ok(config)
}

/// Helper to open the engine from the current context.
pub fn open_engine(globals: &Globals) -> Result<Engine> {
    let config = load_config(globals)?;
    let dispatcher = HttpDispatcher::new(config.request_timeout())?;
    Engine::init(config, Arc::new(dispatcher), Arc::new(SystemClock))
}

/// Runtime for commands that drive async work.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))
}

/// Parse a JSON argument.
pub fn parse_json(what: &str, text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text)
        .map_err(|e| Error::InvalidArgument(format!("{what} is not valid JSON: {e}")))
}

/// Build metadata from `key=value` pairs. Values that parse as JSON keep
/// their type; anything else is stored as a string.
pub fn metadata_from(pairs: &[(String, String)]) -> Option<Metadata> {
    if pairs.is_empty() {
        return None;
    }
    Some(
        pairs
            .iter()
            .map(|(key, value)| {
                let value = serde_json::from_str(value)
                    .unwrap_or_else(|_| serde_json::Value::String(value.clone()));
                (key.clone(), value)
            })
            .collect(),
    )
}
