// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-copy consistency check: compare the file lists (path + size) of a
//! source directory and its copy.
//!
//! Grounded on the original service's `check_folders_equal`: both sides are
//! listed with `find -type f -printf "%p %s\n"`, the path prefix stripped so
//! only the relative listing is compared, then sorted and diffed. On a
//! mismatch the original writes the two listings to `/tmp/source.txt` and
//! `/tmp/target.txt` for a human to diff by hand; we do the same so the
//! failure is actually debuggable after the fact.

use crate::error::TaskError;
use ltoarc_adapters::run_command_in;
use ltoarc_core::{AbortSignal, ProgressSink};

const SOURCE_DUMP_PATH: &str = "/tmp/source.txt";
const TARGET_DUMP_PATH: &str = "/tmp/target.txt";

/// Returns `true` if `source` and `dest` contain the same files (by relative
/// path and size). `source_excludes`/`dest_excludes` are extra `find`
/// arguments (e.g. `-not -path ...`) applied to each side respectively.
pub async fn folders_equal(
    source: &str,
    source_excludes: &[String],
    dest: &str,
    dest_excludes: &[String],
    progress: &dyn ProgressSink,
) -> Result<bool, TaskError> {
    let source_listing = list_files(source, source_excludes, progress).await?;
    let dest_listing = list_files(dest, dest_excludes, progress).await?;

    let mut source_sorted = source_listing.clone();
    let mut dest_sorted = dest_listing.clone();
    source_sorted.sort();
    dest_sorted.sort();

    if source_sorted == dest_sorted {
        return Ok(true);
    }

    tokio::fs::write(SOURCE_DUMP_PATH, source_sorted.join("\n")).await.ok();
    tokio::fs::write(TARGET_DUMP_PATH, dest_sorted.join("\n")).await.ok();
    Ok(false)
}

async fn list_files(
    root: &str,
    excludes: &[String],
    progress: &dyn ProgressSink,
) -> Result<Vec<String>, TaskError> {
    let mut args: Vec<&str> = excludes.iter().map(String::as_str).collect();
    args.extend([".", "-type", "f", "-printf", "%p %s\n"]);
    let no_abort: Option<&AbortSignal> = None;
    let (stdout, _) = run_command_in("find", &args, Some(root), progress, no_abort, None).await?;
    Ok(stdout.lines().map(str::to_string).collect())
}

#[cfg(test)]
#[path = "verify_tests.rs"]
mod tests;
