// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-command validation and queue/catalog mutation. Every handler here
//! runs to completion before the connection handler yields, so a client
//! that gets a response has an up-to-date view of the queue/catalog.

use std::path::Path;

use ltoarc_adapters::run_command;
use ltoarc_core::{ArchiveState, NullProgressSink, TaskId, TaskKind, WorkItem};

use crate::command::Command;
use crate::lifecycle::DaemonState;

pub async fn handle(state: &DaemonState, command: Command) -> String {
    match command {
        Command::Queue => render_queue(state),
        Command::Summary => render_summary(state).await,
        Command::Abort { task_ids } => handle_abort(state, &task_ids),
        Command::Requeue { task_ids } => handle_requeue(state, &task_ids),
        Command::Prepare { folder, description, compress, priority } => {
            handle_prepare(state, &folder, &description, compress, priority)
        }
        Command::Archive { folder, tapelabel, targetname, priority } => {
            handle_archive(state, &folder, &tapelabel, targetname.as_deref(), priority).await
        }
        Command::Restore { folder, restore_path, subfolder, priority } => {
            handle_restore(state, &folder, &restore_path, subfolder.as_deref(), priority).await
        }
        Command::Explore { tapelabel, time, email, priority } => {
            handle_explore(state, &tapelabel, time, email, priority).await
        }
        Command::Inventory { folders, priority } => handle_inventory(state, folders, priority),
        Command::Deleteable { ignore } => handle_deleteable(state, &ignore).await,
    }
}

fn render_queue(state: &DaemonState) -> String {
    let mut items = state.queue.snapshot();
    items.sort_by(|a, b| {
        b.is_error()
            .cmp(&a.is_error())
            .then_with(|| a.priority.cmp(&b.priority))
    });
    if items.is_empty() {
        return "queue is empty".to_string();
    }
    items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join("\n")
}

async fn render_summary(state: &DaemonState) -> String {
    match state.library.get_available_tapes(&NullProgressSink).await {
        Ok(tapes) => {
            let known: Vec<String> = tapes.into_values().collect();
            state.catalog.format_summary(&known, state.context.tape_max_size_kb)
        }
        Err(e) => format!("error reading tape library: {e}"),
    }
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    TaskId::parse(raw).ok_or_else(|| format!("not a valid task id: {raw}"))
}

fn handle_abort(state: &DaemonState, task_ids: &[String]) -> String {
    task_ids
        .iter()
        .map(|task_id| abort_one(state, task_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn abort_one(state: &DaemonState, task_id: &str) -> String {
    let id = match parse_task_id(task_id) {
        Ok(id) => id,
        Err(msg) => return msg,
    };
    let Some(item) = state.queue.snapshot().into_iter().find(|i| i.id == id) else {
        return format!("no such task: {task_id}");
    };
    if item.running {
        if let Some(abort) = state.queue.abort_handle(id) {
            abort.request();
        }
        format!("task {id} is running; abort requested")
    } else {
        match state.queue.remove(id) {
            Ok(()) => format!("task {id} removed from the queue"),
            Err(e) => format!("failed to remove task {id}: {e}"),
        }
    }
}

fn handle_requeue(state: &DaemonState, task_ids: &[String]) -> String {
    task_ids
        .iter()
        .map(|task_id| requeue_one(state, task_id))
        .collect::<Vec<_>>()
        .join("\n")
}

fn requeue_one(state: &DaemonState, task_id: &str) -> String {
    let id = match parse_task_id(task_id) {
        Ok(id) => id,
        Err(msg) => return msg,
    };
    let Some(item) = state.queue.snapshot().into_iter().find(|i| i.id == id) else {
        return format!("no such task: {task_id}");
    };
    if item.is_healthy() {
        return format!("task {id} has not failed; nothing to requeue");
    }
    match state.queue.set_error(id, String::new()) {
        Ok(()) => format!("task {id} requeued"),
        Err(e) => format!("failed to requeue task {id}: {e}"),
    }
}

fn handle_prepare(state: &DaemonState, folder: &str, description: &str, compress: bool, priority: i64) -> String {
    match std::fs::read_dir(folder) {
        Ok(_) => {}
        Err(e) => return format!("{folder} is not a readable directory: {e}"),
    }
    if state.catalog.get(folder).is_ok() {
        return format!("{folder} is already in the catalog");
    }
    if let Err(e) = state.catalog.create_entry(folder, description) {
        return format!("failed to register {folder}: {e}");
    }
    let now = state.context.clock.now();
    let kind = TaskKind::Prepare { folder: folder.to_string(), compress };
    match state.queue.append(WorkItem::new(priority, kind, now)) {
        Ok(id) => format!("queued prepare of {folder} as task {id}"),
        Err(e) => format!("failed to queue prepare of {folder}: {e}"),
    }
}

async fn handle_archive(
    state: &DaemonState,
    folder: &str,
    tapelabel: &str,
    targetname: Option<&str>,
    priority: i64,
) -> String {
    let record = match state.catalog.get(folder) {
        Ok(r) => r,
        Err(e) => return format!("{e}"),
    };
    if record.state != ArchiveState::Prepared {
        return format!("{folder} is {}, not prepared", record.state);
    }
    let already_queued = state.queue.snapshot().into_iter().any(|item| {
        item.is_healthy()
            && matches!(&item.kind, TaskKind::Archive { folder: f, .. } if f == folder)
    });
    if already_queued {
        return format!("{folder} already has a pending archive task");
    }
    if !Path::new(folder).exists() {
        return format!("source directory {folder} no longer exists");
    }
    match state.library.find_tape(tapelabel, &NullProgressSink).await {
        Ok(None) => return format!("tape {tapelabel} not found in the library"),
        Err(e) => return format!("error reading tape library: {e}"),
        Ok(Some(_)) => {}
    }

    let target_filename = targetname.unwrap_or(folder.rsplit('/').next().unwrap_or(folder));
    if target_filename.is_empty() {
        return "target filename must not be empty".to_string();
    }
    let on_tape = state.catalog.get_directories_on_tape(tapelabel);
    if on_tape.iter().any(|r| {
        r.state == ArchiveState::Archived
            && r.path_on_tape.as_deref() == Some(target_filename)
    }) {
        return format!("{target_filename} already exists on tape {tapelabel}");
    }

    let committed_kb: u64 = on_tape.iter().map(|r| r.size.unwrap_or(0)).sum();
    let required_kb = record.size.unwrap_or(0);
    if committed_kb + required_kb >= state.context.tape_max_size_kb {
        return format!(
            "{folder} ({required_kb} KiB) does not fit on {tapelabel} ({committed_kb} KiB already committed of {} KiB)",
            state.context.tape_max_size_kb
        );
    }

    if let Err(e) = state.catalog.set_archiving_queued(folder, tapelabel) {
        return format!("failed to queue archive of {folder}: {e}");
    }
    let now = state.context.clock.now();
    let kind = TaskKind::Archive {
        folder: folder.to_string(),
        tape: tapelabel.to_string(),
        target_filename: target_filename.to_string(),
    };
    match state.queue.append(WorkItem::new(priority, kind, now)) {
        Ok(id) => format!("queued archive of {folder} to {tapelabel} as task {id}"),
        Err(e) => format!("failed to queue archive of {folder}: {e}"),
    }
}

async fn handle_restore(
    state: &DaemonState,
    folder: &str,
    restore_path: &str,
    subfolder: Option<&str>,
    priority: i64,
) -> String {
    let record = match state.catalog.get(folder) {
        Ok(r) => r,
        Err(e) => return format!("{e}"),
    };
    if record.state != ArchiveState::Archived {
        return format!("{folder} is {}, not archived", record.state);
    }

    let path = Path::new(restore_path);
    if path.exists() {
        match std::fs::read_dir(path) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return format!("{restore_path} already exists and is not empty");
                }
                if let Err(e) = std::fs::remove_dir(path) {
                    return format!("failed to remove empty {restore_path}: {e}");
                }
            }
            Err(e) => return format!("{restore_path} exists but is not a readable directory: {e}"),
        }
    }

    let now = state.context.clock.now();
    let kind = TaskKind::Restore {
        folder: folder.to_string(),
        restore_path: restore_path.to_string(),
        subfolder: subfolder.unwrap_or("").to_string(),
    };
    match state.queue.append(WorkItem::new(priority, kind, now)) {
        Ok(id) => format!("queued restore of {folder} to {restore_path} as task {id}"),
        Err(e) => format!("failed to queue restore of {folder}: {e}"),
    }
}

async fn handle_explore(
    state: &DaemonState,
    tapelabel: &str,
    seconds: u64,
    email: Option<String>,
    priority: i64,
) -> String {
    match state.library.find_tape(tapelabel, &NullProgressSink).await {
        Ok(None) => return format!("tape {tapelabel} not found in the library"),
        Err(e) => return format!("error reading tape library: {e}"),
        Ok(Some(_)) => {}
    }
    let now = state.context.clock.now();
    let kind = TaskKind::Explore { tape: tapelabel.to_string(), seconds, email };
    match state.queue.append(WorkItem::new(priority, kind, now)) {
        Ok(id) => format!("queued exploration of {tapelabel} as task {id}"),
        Err(e) => format!("failed to queue exploration of {tapelabel}: {e}"),
    }
}

fn handle_inventory(state: &DaemonState, folders: Vec<String>, priority: i64) -> String {
    let folders = if folders.is_empty() { state.source_folders.clone() } else { folders };
    if folders.is_empty() {
        return "no folders given and none configured".to_string();
    }
    let mut queued = Vec::new();
    for folder in folders {
        let now = state.context.clock.now();
        let kind = TaskKind::Inventory { folder: folder.clone() };
        match state.queue.append(WorkItem::new(priority, kind, now)) {
            Ok(id) => queued.push(format!("queued inventory of {folder} as task {id}")),
            Err(e) => queued.push(format!("failed to queue inventory of {folder}: {e}")),
        }
    }
    queued.join("\n")
}

async fn handle_deleteable(state: &DaemonState, ignore: &[String]) -> String {
    let archived = state.catalog.get_entries_by_state(ArchiveState::Archived);
    let mut lines = Vec::new();
    for record in archived {
        if ignore.iter().any(|prefix| record.original_directory.starts_with(prefix.as_str())) {
            continue;
        }
        let outcome = run_command(
            "timeout",
            &["0.1", "test", "-d", &record.original_directory],
            &NullProgressSink,
            None,
            None,
        )
        .await;
        match outcome {
            Ok(_) => lines.push(format!("{} - deletable", record.original_directory)),
            Err(ltoarc_adapters::SubprocessError::NonZeroExit { code, .. }) if code == 1 => {}
            Err(e) => lines.push(format!("{} - unreachable: {e}", record.original_directory)),
        }
    }
    if lines.is_empty() {
        "nothing deletable".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
