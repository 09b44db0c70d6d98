// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `restore`: copy an archived directory (or a subfolder of it) off tape
//! and back onto local disk.
//!
//! Grounded on the original service's `restore` coroutine. The handler has
//! already confirmed the record is `archived` and that `restore_path` is
//! either absent or an empty directory before this runs.

use crate::context::TaskContext;
use crate::error::TaskError;
use ltoarc_adapters::{run_command, TapeContent, DEFAULT_MOUNT_PATH};
use ltoarc_core::{AbortSignal, ArchiveState, ProgressSink};

pub async fn run(
    ctx: &TaskContext,
    folder: &str,
    restore_path: &str,
    subfolder: &str,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    let record = ctx.catalog.get(folder)?;
    let path_on_tape = record.path_on_tape.clone().ok_or_else(|| {
        TaskError::Other(format!("{folder} has no path_on_tape despite being archived"))
    })?;
    let tape = record
        .tape
        .clone()
        .ok_or_else(|| TaskError::Other(format!("{folder} has no tape despite being archived")))?;

    let on_tape: Vec<TapeContent> = ctx
        .catalog
        .get_directories_on_tape(&tape)
        .into_iter()
        .map(|r| TapeContent {
            path_on_tape: r.path_on_tape.clone().unwrap_or_default(),
            archived: r.state == ArchiveState::Archived,
        })
        .collect();

    ctx.library
        .ensure_tape_mounted(&tape, &on_tape, progress, abort, DEFAULT_MOUNT_PATH)
        .await?;
    if abort.is_set() {
        return Ok(format!("Restore of {folder} aborted before copy began"));
    }

    tokio::fs::create_dir_all(restore_path).await?;

    let source = if subfolder.is_empty() {
        format!("{DEFAULT_MOUNT_PATH}/{path_on_tape}")
    } else {
        format!("{DEFAULT_MOUNT_PATH}/{path_on_tape}/{subfolder}")
    };

    progress.report(&format!("Restoring: {source} -> {restore_path}"));
    run_command(
        "ordered_copy",
        &[&source, restore_path, "-a"],
        progress,
        Some(abort),
        None,
    )
    .await?;

    if abort.is_set() {
        return Ok(format!("Restore of {folder} aborted after copy began"));
    }

    progress.report("Checking that the folders are equal...");
    let equal = crate::tasks::verify::folders_equal(&source, &[], restore_path, &[], progress).await?;
    if !equal {
        return Err(TaskError::ConsistencyCheckFailed);
    }

    ctx.library
        .ensure_tape_unmounted(progress, DEFAULT_MOUNT_PATH)
        .await?;

    Ok(format!("Restored {folder} to {restore_path}"))
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
