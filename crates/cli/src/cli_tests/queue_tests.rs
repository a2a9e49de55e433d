// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use super::*;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_enqueue_defaults() {
    let cli = parse(&["lexsync", "enqueue", "note.saved", "https://api.test/notes"]).unwrap();
    match cli.command {
        Command::Enqueue {
            kind,
            endpoint,
            payload,
            method,
            priority,
            max_attempts,
            headers,
            now,
            ..
        } => {
            assert_eq!(kind, "note.saved");
            assert_eq!(endpoint, "https://api.test/notes");
            assert_eq!(payload, None);
            assert_eq!(method, MethodArg::Post);
            assert_eq!(priority, PriorityArg::Medium);
            assert_eq!(max_attempts, None);
            assert!(headers.is_empty());
            assert!(!now);
        }
        _ => panic!("Expected Enqueue command"),
    }
}

#[test]
fn test_enqueue_all_options() {
    let cli = parse(&[
        "lexsync",
        "enqueue",
        "note.deleted",
        "https://api.test/notes/1",
        "-X",
        "delete",
        "-p",
        "critical",
        "--max-attempts",
        "5",
        "-H",
        "Authorization: Bearer t",
        "--header",
        "X-Trace=abc",
        "--now",
    ])
    .unwrap();
    match cli.command {
        Command::Enqueue { method, priority, max_attempts, headers, now, .. } => {
            assert_eq!(method, MethodArg::Delete);
            assert_eq!(priority, PriorityArg::Critical);
            assert_eq!(max_attempts, Some(5));
            assert_eq!(
                headers,
                vec![
                    ("Authorization".to_string(), "Bearer t".to_string()),
                    ("X-Trace".to_string(), "abc".to_string())
                ]
            );
            assert!(now);
        }
        _ => panic!("Expected Enqueue command"),
    }
}

#[parameterized(
    zero_attempts = { &["lexsync", "enqueue", "k", "https://a.test", "--max-attempts", "0"] },
    unknown_priority = { &["lexsync", "enqueue", "k", "https://a.test", "-p", "urgent"] },
    unknown_method = { &["lexsync", "enqueue", "k", "https://a.test", "-X", "get"] },
    bad_header = { &["lexsync", "enqueue", "k", "https://a.test", "-H", "novalue"] },
    empty_kind = { &["lexsync", "enqueue", "", "https://a.test"] },
)]
fn test_enqueue_rejects(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[parameterized(
    pending = { "pending" },
    sync = { "sync" },
    status = { "status" },
    drop_queue = { "drop-queue" },
    watch = { "watch" },
)]
fn test_queue_commands_parse(name: &str) {
    assert!(parse(&["lexsync", name]).is_ok());
}

#[test]
fn test_retry_requires_id() {
    assert!(parse(&["lexsync", "retry"]).is_err());
    match parse(&["lexsync", "retry", "abc", "-o", "json"]).unwrap().command {
        Command::Retry { id, output } => {
            assert_eq!(id, "abc");
            assert_eq!(output.output, OutputFormat::Json);
        }
        _ => panic!("Expected Retry command"),
    }
}

#[test]
fn test_priority_and_method_conversions() {
    assert_eq!(lx_core::Priority::from(PriorityArg::Low), lx_core::Priority::Low);
    assert_eq!(lx_core::HttpMethod::from(MethodArg::Patch), lx_core::HttpMethod::Patch);
}

#[parameterized(
    colon = { "Accept: application/json", "Accept", "application/json" },
    equals = { "X-Id=7", "X-Id", "7" },
    value_with_colon = { "X-Url: http://a", "X-Url", "http://a" },
)]
fn test_parse_header(input: &str, name: &str, value: &str) {
    assert_eq!(parse_header(input).unwrap(), (name.to_string(), value.to_string()));
}
