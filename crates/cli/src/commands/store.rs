// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record commands: put, get, rm, ls, clear, purge.

use std::time::Duration;

use lx_core::{Metadata, Record};
use serde_json::Value;

use super::{metadata_from, open_engine, parse_json, Globals};
use crate::cli::OutputFormat;
use crate::engine::Engine;
use crate::error::{Error, Result};

pub fn put(
    globals: &Globals,
    namespace: &str,
    id: &str,
    payload: &str,
    ttl_ms: Option<u64>,
    meta: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let engine = open_engine(globals)?;
    let record = put_impl(&engine, namespace, id, payload, ttl_ms, metadata_from(meta))?;
    match format {
        OutputFormat::Text => println!("stored {}/{}", namespace, record.id),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}

pub(crate) fn put_impl(
    engine: &Engine,
    namespace: &str,
    id: &str,
    payload: &str,
    ttl_ms: Option<u64>,
    metadata: Option<Metadata>,
) -> Result<Record<Value>> {
    let payload = parse_json("payload", payload)?;
    let store = engine.store::<Value>(namespace)?;
    let record = match ttl_ms {
        Some(ms) => store.put_with_ttl(id, payload, Duration::from_millis(ms), metadata)?,
        None => store.put(id, payload, metadata)?,
    };
    Ok(record)
}

pub fn get(globals: &Globals, namespace: &str, id: &str, format: OutputFormat) -> Result<()> {
    let engine = open_engine(globals)?;
    let record = get_impl(&engine, namespace, id)?;
    match format {
        OutputFormat::Text => println!("{}", serde_json::to_string(&record.payload)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}

/// A missing or expired record is an error at the command line.
pub(crate) fn get_impl(engine: &Engine, namespace: &str, id: &str) -> Result<Record<Value>> {
    engine.read::<Value>(namespace, id)?.ok_or_else(|| Error::RecordNotFound {
        namespace: namespace.to_string(),
        id: id.to_string(),
    })
}

pub fn remove(globals: &Globals, namespace: &str, id: &str) -> Result<()> {
    let engine = open_engine(globals)?;
    if engine.delete(namespace, id)? {
        println!("removed {}/{}", namespace, id);
    } else {
        println!("{}/{} was not present", namespace, id);
    }
    Ok(())
}

pub fn list(
    globals: &Globals,
    namespace: Option<&str>,
    meta: &[(String, String)],
    format: OutputFormat,
) -> Result<()> {
    let engine = open_engine(globals)?;
    let Some(namespace) = namespace else {
        let namespaces = engine.namespaces()?;
        match format {
            OutputFormat::Text => namespaces.iter().for_each(|ns| println!("{}", ns)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&namespaces)?),
        }
        return Ok(());
    };

    let records = list_impl(&engine, namespace, metadata_from(meta).as_ref())?;
    match format {
        OutputFormat::Text => {
            for record in &records {
                println!("{}", format_record_line(record));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
    }
    Ok(())
}

pub(crate) fn list_impl(
    engine: &Engine,
    namespace: &str,
    partial: Option<&Metadata>,
) -> Result<Vec<Record<Value>>> {
    match partial {
        Some(partial) => Ok(engine.store::<Value>(namespace)?.query(partial)?),
        None => engine.list::<Value>(namespace, None),
    }
}

/// `id<TAB>payload` with the payload as compact JSON.
pub(crate) fn format_record_line(record: &Record<Value>) -> String {
    format!("{}\t{}", record.id, record.payload)
}

pub fn clear(globals: &Globals, namespace: &str) -> Result<()> {
    let engine = open_engine(globals)?;
    let removed = engine.clear(namespace)?;
    println!("removed {} record(s) from {}", removed, namespace);
    Ok(())
}

pub fn purge(globals: &Globals) -> Result<()> {
    let engine = open_engine(globals)?;
    let purged = engine.purge_expired()?;
    println!("purged {} expired record(s)", purged);
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
