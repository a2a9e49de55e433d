// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration management.
//!
//! Configuration is read from a TOML file and includes:
//! - `database_path`: where the SQLite store lives
//! - `[store]`: default capacity and ttl applied to every namespace
//! - `[sync]`: retry, transport and connectivity settings
//! - `[namespaces.<name>]`: per-namespace overrides of `[store]`
//!
//! The file is located through `--config`, then `LEXSYNC_CONFIG`, then
//! `<config_dir>/lexsync/config.toml`. A missing file at the implicit
//! locations yields the defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lx_core::StoreOptions;

use crate::error::{Error, Result};
use crate::sync::CoordinatorConfig;

const CONFIG_DIR_NAME: &str = "lexsync";
const CONFIG_FILE_NAME: &str = "config.toml";
pub const CONFIG_ENV_VAR: &str = "LEXSYNC_CONFIG";

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database file; defaults to `<data_dir>/lexsync/store.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    /// Seconds between expired-record purges (default: 300).
    #[serde(default = "default_housekeeping_interval_secs")]
    pub housekeeping_interval_secs: u64,
    /// Bounds applied to every namespace without an override.
    #[serde(default)]
    pub store: NamespaceConfig,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub namespaces: BTreeMap<String, NamespaceConfig>,
}

/// Capacity and ttl bounds for a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ttl_ms: Option<u64>,
}

/// Sync coordinator and connectivity settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Attempts allowed for tasks that do not set their own (default: 3).
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,
    /// Initial delay between in-place retry attempts. 0 = retry immediately.
    #[serde(default)]
    pub retry_backoff_ms: u64,
    /// Cap on the exponential retry delay (default: 30000).
    #[serde(default = "default_retry_backoff_max_ms")]
    pub retry_backoff_max_ms: u64,
    /// Per-request timeout for dispatch and probes (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Health endpoint polled to detect connectivity. Unset disables the probe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_url: Option<String>,
    /// Seconds between connectivity probes (default: 15).
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
    /// Initial connectivity when no probe is configured (default: true).
    #[serde(default = "default_assume_online")]
    pub assume_online: bool,
}

fn default_housekeeping_interval_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_max_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_probe_interval_secs() -> u64 {
    15
}

fn default_assume_online() -> bool {
    true
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            default_max_attempts: default_max_attempts(),
            retry_backoff_ms: 0,
            retry_backoff_max_ms: default_retry_backoff_max_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            health_url: None,
            probe_interval_secs: default_probe_interval_secs(),
            assume_online: default_assume_online(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            housekeeping_interval_secs: default_housekeeping_interval_secs(),
            store: NamespaceConfig::default(),
            sync: SyncSettings::default(),
            namespaces: BTreeMap::new(),
        }
    }
}

impl NamespaceConfig {
    fn validate(&self, scope: &str) -> Result<()> {
        if self.capacity == Some(0) {
            return Err(Error::Config(format!("{scope}: capacity must be at least 1")));
        }
        if self.default_ttl_ms == Some(0) {
            return Err(Error::Config(format!("{scope}: default_ttl_ms must be at least 1")));
        }
        Ok(())
    }
}

impl Config {
    /// Loads configuration from the given file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parses and validates configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves the configuration for this process.
    ///
    /// An explicit path must exist. The environment and default locations
    /// fall back to defaults when no file is present.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match implicit_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Config::default())
            }
            None => Ok(Config::default()),
        }
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.housekeeping_interval_secs == 0 {
            return Err(Error::Config("housekeeping_interval_secs must be at least 1".to_string()));
        }
        if self.sync.default_max_attempts == 0 {
            return Err(Error::Config("sync.default_max_attempts must be at least 1".to_string()));
        }
        if self.sync.request_timeout_secs == 0 {
            return Err(Error::Config("sync.request_timeout_secs must be at least 1".to_string()));
        }
        if self.sync.probe_interval_secs == 0 {
            return Err(Error::Config("sync.probe_interval_secs must be at least 1".to_string()));
        }
        self.store.validate("store")?;
        for (name, ns) in &self.namespaces {
            ns.validate(&format!("namespaces.{name}"))?;
        }
        Ok(())
    }

    /// Database file, explicit or the platform default.
    pub fn database_path(&self) -> PathBuf {
        self.database_path.clone().unwrap_or_else(lx_core::db::default_db_path)
    }

    /// Store bounds for `namespace`. Override fields fall back to `[store]`
    /// individually.
    pub fn store_options(&self, namespace: &str) -> StoreOptions {
        let ns = self.namespaces.get(namespace);
        let capacity = ns.and_then(|n| n.capacity).or(self.store.capacity);
        let ttl_ms = ns.and_then(|n| n.default_ttl_ms).or(self.store.default_ttl_ms);
        StoreOptions { capacity, default_ttl: ttl_ms.map(Duration::from_millis) }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            default_max_attempts: self.sync.default_max_attempts,
            retry_backoff: Duration::from_millis(self.sync.retry_backoff_ms),
            retry_backoff_max: Duration::from_millis(self.sync.retry_backoff_max_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.sync.request_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.sync.probe_interval_secs)
    }

    pub fn housekeeping_interval(&self) -> Duration {
        Duration::from_secs(self.housekeeping_interval_secs)
    }
}

/// Config path from `LEXSYNC_CONFIG`, else the per-user config directory.
pub fn implicit_config_path() -> Option<PathBuf> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
