// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work queue entries and the tagged-variant dispatch that replaces the
//! original service's dynamic `getattr(tasks, coroutine_name)` lookup.

use crate::id::TaskId;
use crate::progress::{AbortSignal, LatestProgressSink};
use serde::{Deserialize, Serialize};

/// Typed arguments for each task kind, replacing the original's
/// `args: List[Any]` positional list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskKind {
    Prepare {
        folder: String,
        compress: bool,
    },
    Archive {
        folder: String,
        tape: String,
        target_filename: String,
    },
    Restore {
        folder: String,
        restore_path: String,
        subfolder: String,
    },
    Explore {
        tape: String,
        seconds: u64,
        email: Option<String>,
    },
    Inventory {
        folder: String,
    },
}

impl TaskKind {
    pub fn describe(&self) -> String {
        match self {
            TaskKind::Prepare { folder, .. } => format!("Preparing folder: {folder}"),
            TaskKind::Archive { folder, tape, .. } => {
                format!("Archiving folder: {folder} to tape {tape}")
            }
            TaskKind::Restore {
                folder,
                restore_path,
                ..
            } => format!("Restoring folder: {folder} to {restore_path}"),
            TaskKind::Explore { tape, .. } => format!("Exploring tape: {tape}"),
            TaskKind::Inventory { folder } => format!("Taking inventory of: {folder}"),
        }
    }
}

/// A unit of work on the priority queue.
///
/// `priority`/`kind`/`description`/`created`/`error_msg` are persisted;
/// `progress`, `abort`, and `running` are transient, recreated fresh on
/// every rehydration from disk.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub id: TaskId,
    pub priority: i64,
    pub kind: TaskKind,
    pub description: String,
    pub created: std::time::SystemTime,
    pub error_msg: String,
    pub progress: LatestProgressSink,
    pub abort: AbortSignal,
    pub running: bool,
}

impl WorkItem {
    pub fn new(priority: i64, kind: TaskKind, created: std::time::SystemTime) -> Self {
        let description = kind.describe();
        Self {
            id: TaskId::generate(),
            priority,
            kind,
            description,
            created,
            error_msg: String::new(),
            progress: LatestProgressSink::new(),
            abort: AbortSignal::new(),
            running: false,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.error_msg.is_empty()
    }

    pub fn is_error(&self) -> bool {
        !self.error_msg.is_empty()
    }
}

impl std::fmt::Display for WorkItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} - {}", self.id, self.priority, self.description)?;
        if self.running {
            if let Some(progress) = self.progress.latest() {
                write!(f, " [{progress}]")?;
            }
        }
        if self.is_error() {
            write!(f, "\n\t{}", self.error_msg.replace('\n', "\n\t"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "work_item_tests.rs"]
mod tests;
