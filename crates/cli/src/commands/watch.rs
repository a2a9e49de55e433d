// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground engine: runs the background tasks and prints sync events
//! until Ctrl-C.

use super::queue::format_report;
use super::{open_engine, runtime, Globals};
use crate::cli::OutputFormat;
use crate::engine::Engine;
use crate::error::Result;
use crate::sync::SyncEvent;

pub fn run(globals: &Globals, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    runtime()?.block_on(run_async(engine, format))
}

async fn run_async(mut engine: Engine, format: OutputFormat) -> Result<()> {
    let mut events = engine.subscribe();
    engine.start()?;
    tracing::info!(
        online = engine.monitor().is_online(),
        probe = engine.config().sync.health_url.as_deref().unwrap_or("none"),
        "watching, press Ctrl-C to stop"
    );

    let result = loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(Into::into),
            event = events.recv() => match event {
                Some(event) => match format {
                    OutputFormat::Text => println!("{}", format_event(&event)),
                    OutputFormat::Json => match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => break Err(e.into()),
                    },
                },
                None => break Ok(()),
            },
        }
    };

    events.unsubscribe();
    engine.dispose().await;
    result
}

pub(crate) fn format_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Enqueued { task_id, pending } => {
            format!("enqueued {} ({} pending)", task_id, pending)
        }
        SyncEvent::Progress { progress, completed, total } => {
            format!("progress {}% ({}/{})", progress, completed, total)
        }
        SyncEvent::Completed { report } => format_report(report),
        SyncEvent::Error { task_id: Some(id), message, dropped: true } => {
            format!("dropped {}: {}", id, message)
        }
        SyncEvent::Error { task_id: Some(id), message, dropped: false } => {
            format!("attempt failed for {}: {}", id, message)
        }
        SyncEvent::Error { task_id: None, message, .. } => format!("error: {}", message),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
