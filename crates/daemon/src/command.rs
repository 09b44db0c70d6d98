// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The control socket's argument grammar, parsed with `clap`'s derive API
//! on both sides of the wire: the admin client builds the argv this
//! defines, and the listener re-parses it with `try_parse_from` — the
//! structural-`Result` replacement for the original's stderr-redirection
//! capture of `argparse`'s `SystemExit`.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser, PartialEq)]
#[command(name = "ltoarc", no_binary_name = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Command {
    /// List queued, running, and failed tasks.
    Queue,
    /// Render the catalog summary grouped by archival state and tape.
    Summary,
    /// Cancel one or more queued tasks, or flag running ones for cancellation.
    Abort {
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Clear one or more failed tasks' errors so the worker picks them up again.
    Requeue {
        #[arg(required = true)]
        task_ids: Vec<String>,
    },
    /// Size (and optionally compress) a directory ahead of archival.
    Prepare {
        folder: String,
        description: String,
        #[arg(long)]
        compress: bool,
        #[arg(long, default_value_t = 0)]
        priority: i64,
    },
    /// Copy a prepared directory onto a tape.
    Archive {
        folder: String,
        tapelabel: String,
        #[arg(short = 't', long)]
        targetname: Option<String>,
        #[arg(long, default_value_t = 100)]
        priority: i64,
    },
    /// Copy an archived directory back off tape.
    Restore {
        folder: String,
        restore_path: String,
        #[arg(short = 's', long)]
        subfolder: Option<String>,
        #[arg(long, default_value_t = 100)]
        priority: i64,
    },
    /// Mount a tape and export it over NFS for a bounded window.
    Explore {
        tapelabel: String,
        #[arg(short = 't', long, default_value_t = 600)]
        time: u64,
        #[arg(short = 'e', long)]
        email: Option<String>,
        #[arg(long, default_value_t = 20)]
        priority: i64,
    },
    /// Report subdirectory sizes bucketed by age, optionally emailed.
    Inventory {
        folders: Vec<String>,
        #[arg(long, default_value_t = 200)]
        priority: i64,
    },
    /// Report which archived directories could be deleted from source.
    Deleteable {
        #[arg(long = "ignore")]
        ignore: Vec<String>,
    },
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
