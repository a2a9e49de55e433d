// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Test infrastructure for command testing without filesystem setup.
//!
//! `TestContext` wraps an engine over an in-memory database with a
//! scripted dispatcher and a manual clock, so command logic can be tested
//! without a config file or network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::commands::testing::TestContext;
//!
//! #[test]
//! fn test_some_command() {
//!     let ctx = TestContext::new();
//!     ctx.put("notes", "n1", json!({"title": "hi"}));
//!     // Test command logic using ctx.engine
//! }
//! ```

use std::sync::Arc;

use lx_core::{Database, ManualClock};
use serde_json::Value;

use crate::config::Config;
use crate::engine::Engine;
use crate::sync::test_helpers::{test_clock, ScriptedDispatcher};

/// Test context providing an in-memory engine for testing.
pub struct TestContext {
    pub engine: Engine,
    pub dispatcher: ScriptedDispatcher,
    pub clock: Arc<ManualClock>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Online engine with default config.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Engine that starts offline.
    pub fn offline() -> Self {
        let mut config = Config::default();
        config.sync.assume_online = false;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        let dispatcher = ScriptedDispatcher::new();
        let clock = test_clock();
        let engine = Engine::with_database(
            config,
            Database::open_in_memory().expect("Failed to create in-memory database"),
            Arc::new(dispatcher.clone()),
            clock.clone(),
        )
        .expect("Failed to build engine");
        TestContext { engine, dispatcher, clock }
    }

    /// Write a JSON record directly.
    pub fn put(&self, namespace: &str, id: &str, payload: Value) -> &Self {
        self.engine.write(namespace, id, payload, None).unwrap();
        self
    }
}

#[test]
fn test_metadata_from_keeps_json_types() {
    let meta = super::metadata_from(&[
        ("rev".to_string(), "2".to_string()),
        ("status".to_string(), "draft".to_string()),
        ("flag".to_string(), "true".to_string()),
    ])
    .unwrap();
    assert_eq!(meta["rev"], serde_json::json!(2));
    assert_eq!(meta["status"], serde_json::json!("draft"));
    assert_eq!(meta["flag"], serde_json::json!(true));
}

#[test]
fn test_metadata_from_empty_is_none() {
    assert!(super::metadata_from(&[]).is_none());
}

#[test]
fn test_parse_json_rejects_garbage() {
    let err = super::parse_json("payload", "{nope").unwrap_err();
    assert!(err.to_string().contains("payload is not valid JSON"));
}

#[test]
fn test_load_config_offline_flag() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sync]\nhealth_url = \"http://localhost:1/health\"\n").unwrap();

    let globals = super::Globals { config: Some(path), offline: true };
    let config = super::load_config(&globals).unwrap();
    assert!(!config.sync.assume_online);
    assert!(config.sync.health_url.is_none());
}
