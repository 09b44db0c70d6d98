// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `prepare`: size (and optionally compress) a directory before archival.
//!
//! Grounded on the original service's `get_size`, generalized with the
//! inode-count/compress-flag branch the distilled procedure adds on top.

use crate::context::TaskContext;
use crate::error::TaskError;
use ltoarc_adapters::run_command;
use ltoarc_core::{AbortSignal, ProgressSink};

/// Above this many files, a directory is tarred before being measured and
/// archived, regardless of the caller's `compress` flag.
pub const AUTO_COMPRESS_INODE_THRESHOLD: u64 = 500_000;

pub async fn run(
    ctx: &TaskContext,
    folder: &str,
    compress: bool,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    progress.report(&format!("Querying size of folder {folder}"));
    let (stdout, _) = run_command("du", &["-s", folder], progress, Some(abort), None).await?;
    if abort.is_set() {
        ctx.catalog.remove_preparing(folder)?;
        return Ok(format!("Prepare of {folder} aborted"));
    }
    let mut size_kb = parse_du_output(&stdout)?;

    let (inode_stdout, _) =
        run_command("du", &["-s", "--inodes", folder], progress, Some(abort), None).await?;
    if abort.is_set() {
        ctx.catalog.remove_preparing(folder)?;
        return Ok(format!("Prepare of {folder} aborted"));
    }
    let inode_count = parse_du_output(&inode_stdout)?;

    let mut compressed = false;
    if inode_count > AUTO_COMPRESS_INODE_THRESHOLD || compress {
        compressed = true;
        let archive_path = format!("{folder}.tar.gz");
        progress.report(&format!("Compressing {folder}..."));
        run_command(
            "tar",
            &["czf", &archive_path, folder],
            progress,
            Some(abort),
            None,
        )
        .await?;
        if abort.is_set() {
            ctx.catalog.remove_preparing(folder)?;
            return Ok(format!("Prepare of {folder} aborted"));
        }
        let (archive_stdout, _) =
            run_command("du", &["-s", &archive_path], progress, Some(abort), None).await?;
        size_kb = parse_du_output(&archive_stdout)?;
    }

    if abort.is_set() {
        ctx.catalog.remove_preparing(folder)?;
        return Ok(format!("Prepare of {folder} aborted"));
    }

    ctx.catalog.set_prepared(folder, size_kb, compressed)?;
    Ok(format!("Prepared {folder} ({size_kb} KiB, compressed={compressed})"))
}

fn parse_du_output(stdout: &str) -> Result<u64, TaskError> {
    stdout
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| TaskError::Other(format!("unparseable du output: {stdout:?}")))
}

#[cfg(test)]
#[path = "prepare_tests.rs"]
mod tests;
