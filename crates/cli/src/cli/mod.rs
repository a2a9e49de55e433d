// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::{parse_header, parse_key_value, MetaArgs, OutputArgs};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Task priority as accepted on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum PriorityArg {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl From<PriorityArg> for lx_core::Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Critical => lx_core::Priority::Critical,
            PriorityArg::High => lx_core::Priority::High,
            PriorityArg::Medium => lx_core::Priority::Medium,
            PriorityArg::Low => lx_core::Priority::Low,
        }
    }
}

/// HTTP method as accepted on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    #[default]
    Post,
    Put,
    Patch,
    Delete,
}

impl From<MethodArg> for lx_core::HttpMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Post => lx_core::HttpMethod::Post,
            MethodArg::Put => lx_core::HttpMethod::Put,
            MethodArg::Patch => lx_core::HttpMethod::Patch,
            MethodArg::Delete => lx_core::HttpMethod::Delete,
        }
    }
}

const COMMANDS_HELP: &str = "\
Store:
  put         Write a record
  get         Read a record
  rm          Remove a record
  ls          List records (or namespaces)
  clear       Remove every record in a namespace
  purge       Delete expired records everywhere

Sync:
  enqueue     Queue a task for delivery
  pending     List queued tasks
  sync        Drain the queue now
  retry       Attempt one task again
  status      Show sync state
  drop-queue  Discard every queued task
  watch       Run the engine until interrupted";

const QUICKSTART_HELP: &str = "\
Get started:
  lexsync put notes n1 '{\"title\":\"hi\"}'              Store a record
  lexsync enqueue note.saved https://api.test/notes   Queue a delivery
  lexsync sync                                        Deliver queued tasks";

#[derive(Parser)]
#[command(name = "lexsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first local store with a durable outbound sync queue")]
#[command(before_help = COMMANDS_HELP)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Configuration file (default: $LEXSYNC_CONFIG, then the user config dir)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Treat the network as unreachable; no probe, no dispatch
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    // ─────────────────────────────────────────────────────────────────────────
    // Store
    // ─────────────────────────────────────────────────────────────────────────
    /// Write a record, replacing any existing one with the same id
    #[command(after_help = "\
Examples:
  lexsync put notes n1 '{\"title\":\"hi\"}'           Store a JSON payload
  lexsync put cache k1 42 --ttl-ms 60000           Expire after one minute
  lexsync put notes n2 '\"draft\"' -m status=draft    Attach metadata")]
    Put {
        #[arg(value_parser = non_empty_string)]
        namespace: String,

        #[arg(value_parser = non_empty_string)]
        id: String,

        /// Payload as JSON
        payload: String,

        /// Record ttl in milliseconds (overrides the namespace default)
        #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
        ttl_ms: Option<u64>,

        #[command(flatten)]
        meta: MetaArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Read a record
    Get {
        namespace: String,
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove a record
    Rm {
        namespace: String,
        id: String,
    },

    /// List live records of a namespace, or the namespaces when none is given
    #[command(after_help = "\
Examples:
  lexsync ls                          List namespaces
  lexsync ls notes                    List records in notes
  lexsync ls notes -m status=draft    Records whose metadata matches")]
    Ls {
        namespace: Option<String>,

        #[command(flatten)]
        meta: MetaArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Remove every record in a namespace
    Clear { namespace: String },

    /// Delete expired records from every namespace
    Purge,

    // ─────────────────────────────────────────────────────────────────────────
    // Sync
    // ─────────────────────────────────────────────────────────────────────────
    /// Queue a task for delivery
    #[command(after_help = "\
Examples:
  lexsync enqueue note.saved https://api.test/notes --payload '{\"id\":1}'
  lexsync enqueue note.deleted https://api.test/notes/1 -X delete -p high
  lexsync enqueue ping https://api.test/ping -H 'Authorization: Bearer t' --now")]
    Enqueue {
        /// Caller-defined kind tag
        #[arg(value_parser = non_empty_string)]
        kind: String,

        /// Target URL
        #[arg(value_parser = non_empty_string)]
        endpoint: String,

        /// Request body as JSON (default: null)
        #[arg(long)]
        payload: Option<String>,

        #[arg(long = "method", short = 'X', value_enum, default_value = "post")]
        method: MethodArg,

        #[arg(long, short = 'p', value_enum, default_value = "medium")]
        priority: PriorityArg,

        /// Attempts before the task is dropped (default: from config)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        max_attempts: Option<u32>,

        /// Request header as 'Name: value' (repeatable)
        #[arg(long = "header", short = 'H', value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// Drain the queue right after enqueueing
        #[arg(long)]
        now: bool,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List queued tasks in dispatch order
    Pending {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Drain the queue now
    Sync {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Attempt one queued task again
    Retry {
        id: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show connectivity, queue and drain state
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Discard every queued task
    DropQueue,

    /// Run the monitor, sync runner and housekeeper until Ctrl-C
    Watch {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
