// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod common;
use common::*;

#[test]
fn put_then_get_prints_payload() {
    let ws = Workspace::new();
    ws.lx()
        .args(["put", "notes", "n1", r#"{"title":"hi"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored notes/n1"));

    ws.lx()
        .args(["get", "notes", "n1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("{\"title\":\"hi\"}\n"));
}

#[test]
fn get_missing_record_fails() {
    let ws = Workspace::new();
    ws.lx()
        .args(["get", "notes", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("record not found: notes/ghost"));
}

#[test]
fn put_rejects_invalid_json() {
    let ws = Workspace::new();
    ws.lx()
        .args(["put", "notes", "n1", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("payload is not valid JSON"));
}

#[test]
fn put_rejects_reserved_namespace() {
    let ws = Workspace::new();
    ws.lx().args(["put", "__sync_queue", "x", "1"]).assert().failure();
}

#[test]
fn records_persist_across_invocations_and_rm_removes() {
    let ws = Workspace::new();
    ws.lx().args(["put", "notes", "a", "1"]).assert().success();
    ws.lx().args(["put", "notes", "b", "2"]).assert().success();

    assert_eq!(ws.stdout(&["ls", "notes"]), "a\t1\nb\t2\n");

    ws.lx()
        .args(["rm", "notes", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed notes/a"));
    ws.lx()
        .args(["rm", "notes", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("was not present"));
    assert_eq!(ws.stdout(&["ls", "notes"]), "b\t2\n");
}

#[test]
fn ls_filters_by_metadata() {
    let ws = Workspace::new();
    ws.lx().args(["put", "notes", "a", "1", "-m", "status=draft"]).assert().success();
    ws.lx().args(["put", "notes", "b", "2", "-m", "status=final"]).assert().success();

    assert_eq!(ws.stdout(&["ls", "notes", "-m", "status=draft"]), "a\t1\n");
}

#[test]
fn ls_without_namespace_lists_namespaces() {
    let ws = Workspace::new();
    ws.lx().args(["put", "notes", "a", "1"]).assert().success();
    ws.lx().args(["put", "drafts", "a", "1"]).assert().success();
    enqueue(&ws, "note.saved", "https://api.test/notes", &[]);

    assert_eq!(ws.stdout(&["ls"]), "drafts\nnotes\n");
}

#[test]
fn ls_json_output_is_an_array_of_records() {
    let ws = Workspace::new();
    ws.lx().args(["put", "notes", "a", "{\"x\":1}"]).assert().success();

    let out = ws.stdout(&["ls", "notes", "-o", "json"]);
    let records: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(records[0]["id"], "a");
    assert_eq!(records[0]["payload"]["x"], 1);
}

#[test]
fn capacity_from_config_evicts_oldest() {
    let ws = Workspace::with_config("[namespaces.recent]\ncapacity = 2\n");
    for id in ["a", "b", "c"] {
        ws.lx().args(["put", "recent", id, "1"]).assert().success();
        // Distinct creation timestamps.
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(ws.stdout(&["ls", "recent"]), "b\t1\nc\t1\n");
}

#[test]
fn clear_and_purge() {
    let ws = Workspace::new();
    ws.lx().args(["put", "notes", "a", "1"]).assert().success();
    ws.lx().args(["put", "cache", "k", "1", "--ttl-ms", "1"]).assert().success();
    std::thread::sleep(std::time::Duration::from_millis(20));

    ws.lx()
        .arg("purge")
        .assert()
        .success()
        .stdout(predicate::str::contains("purged 1 expired record(s)"));
    ws.lx()
        .args(["clear", "notes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 record(s) from notes"));
    assert_eq!(ws.stdout(&["ls"]), "");
}

#[test]
fn missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();
    lexsync()
        .arg("--config")
        .arg(temp.path().join("missing.toml"))
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}
