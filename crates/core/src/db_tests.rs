// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use super::*;
use tempfile::tempdir;

#[test]
fn open_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("store.db");

    let db = Database::open(&path).unwrap();
    assert!(path.exists());
    assert_eq!(db.path(), Some(path.as_path()));
}

#[test]
fn open_runs_migrations() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.lock().unwrap();

    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();
    assert!(tables.contains(&"records".to_string()));

    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0)).unwrap();
    assert_eq!(version, SCHEMA_VERSION);
}

#[test]
fn migrations_are_idempotent() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.lock().unwrap();
    run_migrations(&conn).unwrap();
    run_migrations(&conn).unwrap();
}

#[test]
fn open_fails_closed_when_parent_is_a_file() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();

    let err = Database::open(&blocker.join("store.db")).unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)), "got {err:?}");
}

#[test]
fn open_fails_closed_on_garbage_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");
    std::fs::write(&path, vec![0xAB; 4096]).unwrap();

    let err = Database::open(&path).unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)), "got {err:?}");
}

#[test]
fn poisoned_lock_reports_unavailable() {
    let db = Database::open_in_memory().unwrap();
    let clone = db.clone();

    let _ = std::thread::spawn(move || {
        let _guard = clone.lock().unwrap();
        panic!("writer died");
    })
    .join();

    let err = db.namespaces().unwrap_err();
    assert!(matches!(err, Error::StorageUnavailable(_)));
}

#[test]
fn namespaces_lists_distinct_names() {
    let db = Database::open_in_memory().unwrap();
    {
        let conn = db.lock().unwrap();
        conn.execute_batch(
            "INSERT INTO records VALUES ('docs', 'a', x'00', 0, NULL, NULL, 1);
             INSERT INTO records VALUES ('docs', 'b', x'00', 0, NULL, NULL, 2);
             INSERT INTO records VALUES ('costs', 'a', x'00', 0, NULL, NULL, 3);",
        )
        .unwrap();
    }

    assert_eq!(db.namespaces().unwrap(), vec!["costs".to_string(), "docs".to_string()]);
}

#[test]
fn data_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.db");
    {
        let db = Database::open(&path).unwrap();
        let conn = db.lock().unwrap();
        conn.execute("INSERT INTO records VALUES ('docs', 'a', x'00', 0, NULL, NULL, 1)", [])
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.namespaces().unwrap(), vec!["docs".to_string()]);
}

#[test]
fn default_db_path_ends_with_store_db() {
    let path = default_db_path();
    assert!(path.ends_with("lexsync/store.db"));
}

#[test]
fn next_sequence_lookup_uses_index() {
    let db = Database::open_in_memory().unwrap();
    let conn = db.lock().unwrap();

    let plan: Vec<String> = conn
        .prepare("EXPLAIN QUERY PLAN SELECT MAX(seq) FROM records")
        .unwrap()
        .query_map([], |row| row.get(3))
        .unwrap()
        .collect::<std::result::Result<_, _>>()
        .unwrap();
    assert!(plan.iter().any(|step| step.contains("idx_records_seq")), "plan {plan:?}");
}
