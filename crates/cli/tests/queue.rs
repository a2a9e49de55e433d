// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn enqueue_offline_stays_pending() {
    let ws = Workspace::new();
    ws.lx_offline()
        .args(["enqueue", "note.saved", "https://api.test/notes", "--payload", "{\"id\":1}"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued"))
        .stdout(predicate::str::contains("medium POST https://api.test/notes"));

    ws.lx_offline()
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("0/3  POST https://api.test/notes  note.saved"));
}

#[test]
fn pending_lists_in_priority_then_enqueue_order() {
    let ws = Workspace::new();
    let low = enqueue(&ws, "a", "https://api.test/low", &["-p", "low"]);
    let first_medium = enqueue(&ws, "b", "https://api.test/m1", &[]);
    let critical = enqueue(&ws, "c", "https://api.test/crit", &["-p", "critical"]);
    let second_medium = enqueue(&ws, "d", "https://api.test/m2", &[]);

    let out = ws.stdout(&["--offline", "pending", "-o", "json"]);
    let tasks: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    let ids: Vec<&str> = tasks.iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![critical.as_str(), first_medium.as_str(), second_medium.as_str(), low.as_str()]);
}

#[test]
fn sync_offline_dispatches_nothing() {
    let ws = Workspace::new();
    enqueue(&ws, "note.saved", "https://api.test/notes", &[]);

    ws.lx_offline()
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 delivered, 0 dropped, 1 remaining (offline)"));
}

#[test]
fn status_reports_offline_and_pending() {
    let ws = Workspace::new();
    enqueue(&ws, "note.saved", "https://api.test/notes", &[]);
    enqueue(&ws, "note.saved", "https://api.test/notes", &[]);

    ws.lx_offline()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("connectivity: offline"))
        .stdout(predicate::str::contains("pending: 2"));

    let out = ws.stdout(&["--offline", "status", "-o", "json"]);
    let status: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(status["indicator"]["offline"], true);
    assert_eq!(status["indicator"]["pending_count"], 2);
}

#[test]
fn drop_queue_removes_everything() {
    let ws = Workspace::new();
    enqueue(&ws, "a", "https://api.test/a", &[]);
    enqueue(&ws, "b", "https://api.test/b", &[]);

    ws.lx_offline()
        .arg("drop-queue")
        .assert()
        .success()
        .stdout(predicate::str::contains("dropped 2 task(s)"));
    ws.lx_offline()
        .arg("pending")
        .assert()
        .success()
        .stdout(predicate::str::contains("no pending tasks"));
}

#[test]
fn retry_unknown_task_fails_with_hint() {
    let ws = Workspace::new();
    ws.lx_offline()
        .args(["retry", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sync task not found: ghost"))
        .stderr(predicate::str::contains("lexsync pending"));
}

#[test]
fn enqueue_rejects_invalid_payload() {
    let ws = Workspace::new();
    ws.lx_offline()
        .args(["enqueue", "k", "https://api.test/a", "--payload", "{"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("payload is not valid JSON"));
}
