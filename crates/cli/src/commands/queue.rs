// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue commands.

use lx_core::clock::to_datetime;
use lx_core::{SyncTask, TaskSpec};
use serde_json::json;

use super::{open_engine, parse_json, runtime, Globals};
use crate::cli::{MethodArg, OutputFormat, PriorityArg};
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::sync::{SyncOutcome, SyncReport, SyncState};

/// Arguments of `enqueue`.
#[derive(Debug, Clone)]
pub struct EnqueueArgs {
    pub kind: String,
    pub endpoint: String,
    pub payload: Option<String>,
    pub method: MethodArg,
    pub priority: PriorityArg,
    pub max_attempts: Option<u32>,
    pub headers: Vec<(String, String)>,
}

pub fn enqueue(globals: &Globals, args: EnqueueArgs, now: bool, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let task = enqueue_impl(&engine, args)?;
    let report = if now { Some(runtime()?.block_on(engine.run_sync())) } else { None };

    match format {
        OutputFormat::Text => {
            println!("queued {} ({} {} {})", task.id, task.priority, task.http_method, task.target_endpoint);
            if let Some(report) = &report {
                println!("{}", format_report(report));
            }
        }
        OutputFormat::Json => {
            let output = json!({ "task": task, "report": report });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub(crate) fn enqueue_impl(engine: &Engine, args: EnqueueArgs) -> Result<SyncTask> {
    let payload = match &args.payload {
        Some(text) => parse_json("payload", text)?,
        None => serde_json::Value::Null,
    };
    let mut spec = TaskSpec::new(args.kind, args.endpoint, payload)
        .method(args.method.into())
        .priority(args.priority.into());
    if let Some(max_attempts) = args.max_attempts {
        spec = spec.max_attempts(max_attempts);
    }
    for (name, value) in args.headers {
        spec = spec.header(name, value);
    }
    engine.mark_for_sync(spec)
}

pub fn pending(globals: &Globals, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let tasks = engine.coordinator().pending()?;
    match format {
        OutputFormat::Text => {
            if tasks.is_empty() {
                println!("no pending tasks");
            }
            for task in &tasks {
                println!("{}", format_task_line(task));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tasks)?),
    }
    Ok(())
}

/// `id  priority  attempt/max  METHOD endpoint  kind  enqueued-at[  (last error)]`
pub(crate) fn format_task_line(task: &SyncTask) -> String {
    let mut line = format!(
        "{}  {}  {}/{}  {} {}  {}  {}",
        task.id,
        task.priority,
        task.attempt,
        task.max_attempts,
        task.http_method,
        task.target_endpoint,
        task.kind,
        to_datetime(task.enqueued_at).format("%Y-%m-%d %H:%M:%S")
    );
    if let Some(error) = &task.last_error {
        line.push_str(&format!("  ({})", error));
    }
    line
}

pub fn sync(globals: &Globals, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let report = runtime()?.block_on(engine.run_sync());
    match format {
        OutputFormat::Text => println!("{}", format_report(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

pub(crate) fn format_report(report: &SyncReport) -> String {
    if report.skipped {
        return "sync already in progress".to_string();
    }
    let mut line = format!(
        "sync {}: {} delivered, {} dropped, {} remaining",
        report.status, report.delivered, report.dropped, report.remaining
    );
    if report.interrupted {
        line.push_str(" (offline)");
    }
    if report.storage_failed {
        line.push_str(" (storage failure)");
    }
    line
}

pub fn retry(globals: &Globals, id: &str, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let outcome = runtime()?.block_on(retry_impl(&engine, id))?;
    match format {
        OutputFormat::Text => println!("{}", format_outcome(id, &outcome)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

pub(crate) async fn retry_impl(engine: &Engine, id: &str) -> Result<SyncOutcome> {
    engine.retry(id).await?.ok_or_else(|| Error::TaskNotFound(id.to_string()))
}

pub(crate) fn format_outcome(id: &str, outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Delivered { status } => format!("{} delivered (HTTP {})", id, status),
        SyncOutcome::Retrying { attempt, error } => {
            format!("{} failed on attempt {}: {}", id, attempt, error)
        }
        SyncOutcome::Dropped { attempts, error } => {
            format!("{} dropped after {} attempts: {}", id, attempts, error)
        }
        SyncOutcome::Skipped => format!("{} skipped, a sync is in progress", id),
    }
}

pub fn status(globals: &Globals, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let state = engine.state()?;
    match format {
        OutputFormat::Text => println!("{}", format_state(&state)),
        OutputFormat::Json => {
            let output = json!({ "state": state, "indicator": state.indicator() });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub(crate) fn format_state(state: &SyncState) -> String {
    let indicator = state.indicator();
    let mut out = format!(
        "connectivity: {}\nstatus: {}\npending: {}",
        if indicator.offline { "offline" } else { "online" },
        state.status,
        indicator.pending_count
    );
    if let Some(progress) = indicator.syncing_progress {
        out.push_str(&format!("\nprogress: {}%", progress));
    }
    out
}

pub fn drop_queue(globals: &Globals) -> Result<()> {
    let engine = open_engine(globals)?;
    let removed = engine.coordinator().clear_queue()?;
    println!("dropped {} task(s)", removed);
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
