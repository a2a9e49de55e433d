// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sync::{SyncReport, SyncStatus};
use yare::parameterized;

#[parameterized(
    enqueued = { SyncEvent::Enqueued { task_id: "t1".into(), pending: 2 }, "enqueued t1 (2 pending)" },
    progress = { SyncEvent::Progress { progress: 50, completed: 1, total: 2 }, "progress 50% (1/2)" },
    dropped = {
        SyncEvent::Error { task_id: Some("t1".into()), message: "boom".into(), dropped: true },
        "dropped t1: boom"
    },
    failed_attempt = {
        SyncEvent::Error { task_id: Some("t1".into()), message: "boom".into(), dropped: false },
        "attempt failed for t1: boom"
    },
    storage = {
        SyncEvent::Error { task_id: None, message: "disk".into(), dropped: false },
        "error: disk"
    },
)]
fn test_format_event(event: SyncEvent, expected: &str) {
    assert_eq!(format_event(&event), expected);
}

#[test]
fn test_format_completed_event() {
    let report = SyncReport { delivered: 1, status: SyncStatus::Success, ..SyncReport::default() };
    assert_eq!(
        format_event(&SyncEvent::Completed { report }),
        "sync success: 1 delivered, 0 dropped, 0 remaining"
    );
}
