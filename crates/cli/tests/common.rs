// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// Temporary workspace with its own config and database.
pub struct Workspace {
    pub temp: TempDir,
    pub config: PathBuf,
}

impl Workspace {
    /// Workspace with only `database_path` set.
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// Workspace whose config is `database_path` followed by `extra`.
    pub fn with_config(extra: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("store.db");
        let config = temp.path().join("config.toml");
        let text = format!("database_path = {:?}\n{}", db.display().to_string(), extra);
        std::fs::write(&config, text).unwrap();
        Workspace { temp, config }
    }

    /// `lexsync --config <workspace config>`.
    pub fn lx(&self) -> Command {
        let mut cmd = lexsync();
        cmd.arg("--config").arg(&self.config);
        cmd
    }

    /// Same as [`Workspace::lx`] with the network treated as unreachable.
    pub fn lx_offline(&self) -> Command {
        let mut cmd = self.lx();
        cmd.arg("--offline");
        cmd
    }

    /// Run `args` and return stdout.
    pub fn stdout(&self, args: &[&str]) -> String {
        let output = self.lx().args(args).output().unwrap();
        assert!(output.status.success(), "{:?} failed: {}", args, String::from_utf8_lossy(&output.stderr));
        String::from_utf8_lossy(&output.stdout).to_string()
    }
}

pub fn lexsync() -> Command {
    let mut cmd = cargo_bin_cmd!("lexsync");
    cmd.env_remove("LEXSYNC_CONFIG").env("RUST_LOG", "warn");
    cmd
}

/// Queue a task offline and return its id.
pub fn enqueue(ws: &Workspace, kind: &str, endpoint: &str, extra: &[&str]) -> String {
    let output = ws
        .lx_offline()
        .args(["enqueue", kind, endpoint, "-o", "json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(output.status.success(), "enqueue failed: {}", String::from_utf8_lossy(&output.stderr));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    value["task"]["id"].as_str().unwrap().to_string()
}
