// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a [`TaskKind`] to its task procedure.
//!
//! Replaces the original service's dynamic `getattr(tasks, coroutine_name)`
//! lookup with an exhaustive match the compiler checks against every
//! `TaskKind` variant.

use crate::context::TaskContext;
use crate::error::TaskError;
use crate::tasks;
use ltoarc_core::{AbortSignal, ProgressSink, TaskKind};

pub async fn dispatch(
    ctx: &TaskContext,
    kind: &TaskKind,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    match kind {
        TaskKind::Prepare { folder, compress } => {
            tasks::prepare::run(ctx, folder, *compress, progress, abort).await
        }
        TaskKind::Archive {
            folder,
            tape,
            target_filename,
        } => tasks::archive::run(ctx, folder, tape, target_filename, progress, abort).await,
        TaskKind::Restore {
            folder,
            restore_path,
            subfolder,
        } => tasks::restore::run(ctx, folder, restore_path, subfolder, progress, abort).await,
        TaskKind::Explore {
            tape,
            seconds,
            email,
        } => tasks::explore::run(ctx, tape, *seconds, email.as_deref(), progress, abort).await,
        TaskKind::Inventory { folder } => tasks::inventory::run(ctx, folder, progress, abort).await,
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
