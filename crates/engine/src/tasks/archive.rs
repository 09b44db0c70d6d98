// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `archive`: mount the target tape, copy a prepared directory onto it, and
//! verify the copy, advancing the record through `archiving` to `archived`.
//!
//! Grounded on the original service's `archive` coroutine. The precondition
//! checks (record is `prepared`, space fits, tape known, unique target) are
//! the enqueuing handler's job, not this procedure's — by the time this
//! runs the record is already `archiving_queued`.

use crate::context::TaskContext;
use crate::error::TaskError;
use ltoarc_adapters::{run_command, run_command_in, TapeContent, DEFAULT_MOUNT_PATH};
use ltoarc_core::{AbortSignal, ProgressSink};

const MAX_UNMOUNT_ATTEMPTS: u32 = 10;
const UNMOUNT_BACKOFF: std::time::Duration = std::time::Duration::from_secs(30);

pub async fn run(
    ctx: &TaskContext,
    folder: &str,
    tape: &str,
    target_filename: &str,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    let record = ctx.catalog.get(folder)?;
    let on_tape: Vec<TapeContent> = ctx
        .catalog
        .get_directories_on_tape(tape)
        .into_iter()
        .map(|r| TapeContent {
            path_on_tape: r.path_on_tape.clone().unwrap_or_default(),
            archived: r.state == ltoarc_core::ArchiveState::Archived,
        })
        .collect();

    ctx.library
        .ensure_tape_mounted(tape, &on_tape, progress, abort, DEFAULT_MOUNT_PATH)
        .await?;
    if abort.is_set() {
        return Ok(format!("Archive of {folder} aborted before copy began"));
    }

    let (df_stdout, _) = run_command("df", &[], progress, None, None).await?;
    let available_kb = parse_df_available(&df_stdout, DEFAULT_MOUNT_PATH)?;
    let required_kb = record.size.unwrap_or(0);
    if required_kb > available_kb {
        return Err(TaskError::InsufficientSpace {
            tape: tape.to_string(),
            available_kb,
            required_kb,
        });
    }

    let compressed = record.compressed.unwrap_or(false);
    let path_on_tape = if compressed {
        format!("{target_filename}.tar.gz")
    } else {
        target_filename.to_string()
    };
    ctx.catalog.set_archiving(folder, &path_on_tape)?;
    let dest = format!("{DEFAULT_MOUNT_PATH}/{path_on_tape}");

    if compressed {
        if tokio::fs::metadata(&dest).await.is_ok() {
            return Err(TaskError::Other(format!("refusing to overwrite existing {dest}")));
        }
        let source = format!("{folder}.tar.gz");
        run_command(
            "rsync",
            &["-auvp", "--info=progress2", &source, &dest],
            progress,
            Some(abort),
            None,
        )
        .await?;
        tokio::fs::remove_file(&source).await.ok();
    } else {
        tokio::fs::create_dir(&dest).await?;

        let excludes = ctx.exclude_find_args();
        let mut find_args: Vec<&str> = excludes.iter().map(String::as_str).collect();
        find_args.extend([".", "-type", "f"]);
        progress.report("Assembling a list of files...");
        let (files, _) = run_command_in(
            "find",
            &find_args,
            Some(folder),
            progress,
            Some(abort),
            None,
        )
        .await?;

        if abort.is_set() {
            tokio::fs::remove_dir(&dest).await.ok();
            return Ok(format!("Archive of {folder} aborted before copy began"));
        }

        progress.report("Ordering the files for writing to tape...");
        run_command_in(
            "ordered_copy",
            &["-t", &dest, "--keep-tree=."],
            Some(folder),
            progress,
            Some(abort),
            Some(&files),
        )
        .await
        .map(|(stdout, _)| {
            for line in stdout.lines() {
                progress.report(&format!("Copying: {line}"));
            }
        })?;

        if abort.is_set() {
            tokio::fs::remove_dir(&dest).await.ok();
            return Ok(format!("Archive of {folder} aborted after copy began"));
        }

        progress.report("Checking that the folders are equal...");
        let equal = crate::tasks::verify::folders_equal(folder, &[], &dest, &[], progress).await?;
        if !equal {
            return Err(TaskError::ConsistencyCheckFailed);
        }
    }

    let (size_stdout, _) = run_command("du", &["-s", &dest], progress, None, None).await?;
    let final_size_kb: u64 = size_stdout
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(required_kb);
    ctx.catalog.set_archived(folder, Some(final_size_kb))?;

    let mut last_err = None;
    for attempt in 0..MAX_UNMOUNT_ATTEMPTS {
        match ctx
            .library
            .ensure_tape_unmounted(progress, DEFAULT_MOUNT_PATH)
            .await
        {
            Ok(()) => {
                last_err = None;
                break;
            }
            Err(e) => {
                last_err = Some(e);
                if attempt + 1 < MAX_UNMOUNT_ATTEMPTS {
                    tokio::time::sleep(UNMOUNT_BACKOFF).await;
                }
            }
        }
    }
    if let Some(e) = last_err {
        return Err(e.into());
    }

    Ok(format!("Archived {folder} to tape {tape}"))
}

/// Parses `df`'s fixed-width table for the row mounted at `mount_point`,
/// returning the "Available" column (4th whitespace-separated field).
pub fn parse_df_available(stdout: &str, mount_point: &str) -> Result<u64, TaskError> {
    for line in stdout.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.last() == Some(&mount_point) {
            return fields
                .get(3)
                .and_then(|s| s.parse().ok())
                .ok_or(TaskError::UnparseableDiskFree);
        }
    }
    Err(TaskError::UnparseableDiskFree)
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
