// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `explore`: mount a tape and expose it over NFS for a bounded window so an
//! operator can browse it directly, then tear the export back down.
//!
//! Grounded on the original service's `explore` coroutine.

use crate::context::TaskContext;
use crate::error::TaskError;
use ltoarc_adapters::{run_command, TapeContent, DEFAULT_MOUNT_PATH};
use ltoarc_core::clock::format_timestamp;
use ltoarc_core::{AbortSignal, ArchiveState, ProgressSink};
use std::time::Duration;

pub async fn run(
    ctx: &TaskContext,
    tape: &str,
    seconds: u64,
    email: Option<&str>,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    let on_tape: Vec<TapeContent> = ctx
        .catalog
        .get_directories_on_tape(tape)
        .into_iter()
        .map(|r| TapeContent {
            path_on_tape: r.path_on_tape.clone().unwrap_or_default(),
            archived: r.state == ArchiveState::Archived,
        })
        .collect();

    ctx.library
        .ensure_tape_mounted(tape, &on_tape, progress, abort, DEFAULT_MOUNT_PATH)
        .await?;

    let export_spec = export_spec(&ctx.nfs_export_target);
    run_command(
        "exportfs",
        &["-o", &ctx.nfs_export_options, &export_spec],
        progress,
        None,
        None,
    )
    .await?;

    if let Some(address) = email {
        let unmount_at = ctx.clock.now() + Duration::from_secs(seconds);
        if let Some(smtp) = &ctx.smtp {
            let body = exploration_notice(tape, unmount_at);
            let smtp = smtp.clone();
            let address = address.to_string();
            let header = format!("Tape {tape} is ready for exploration");
            tokio::task::spawn_blocking(move || {
                ltoarc_adapters::send_mail(&smtp, &header, &body, &[address])
            })
            .await
            .map_err(|e| TaskError::Other(format!("mail task panicked: {e}")))??;
        }
    }

    for elapsed in 0..seconds {
        if abort.is_set() {
            break;
        }
        progress.report(&format!("{elapsed}s / {seconds}s"));
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    run_command("exportfs", &["-u", &export_spec], progress, None, None).await?;

    match run_command("fuser", &["-km", DEFAULT_MOUNT_PATH], progress, None, None).await {
        Ok(_) => {}
        Err(ltoarc_adapters::SubprocessError::NonZeroExit { code, .. }) if code == 1 => {}
        Err(e) => tracing::warn!(error = %e, "fuser -km /ltfs reported a non-fatal error"),
    }

    ctx.library
        .ensure_tape_unmounted(progress, DEFAULT_MOUNT_PATH)
        .await?;

    Ok(format!("Finished exploring tape {tape}"))
}

fn export_spec(target: &str) -> String {
    format!("{target}:{DEFAULT_MOUNT_PATH}")
}

fn exploration_notice(tape: &str, unmount_at: std::time::SystemTime) -> String {
    format!(
        "Tape {tape} is mounted at {DEFAULT_MOUNT_PATH} and exported over NFS.\n\
         It will be unmounted around {}.",
        format_timestamp(unmount_at)
    )
}

#[cfg(test)]
#[path = "explore_tests.rs"]
mod tests;
