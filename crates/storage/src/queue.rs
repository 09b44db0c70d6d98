// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk work queue: a `Vec<WorkItem>` persisted after every mutation,
//! grounded on the original service's `WorkList` (itself a list subclass
//! that rewrites its whole backing file on `append`/`remove`/`extend`/`pop`).

use crate::atomic::{self, AtomicStoreError};
use ltoarc_core::clock::{format_timestamp, parse_timestamp};
use ltoarc_core::{AbortSignal, LatestProgressSink, ProgressSink, TaskId, TaskKind, WorkItem};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("no queue item with id {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] AtomicStoreError),
}

/// The subset of [`WorkItem`] that survives a restart: transient progress,
/// abort state, and `running` are recreated fresh on every load, matching
/// the original's "picked back up from `error_msg == ''`, never resumed
/// mid-flight" restart contract.
#[derive(Debug, Serialize, Deserialize)]
struct QueueRecord {
    id: String,
    priority: i64,
    kind: TaskKind,
    description: String,
    created: String,
    error_msg: String,
}

impl QueueRecord {
    fn from_item(item: &WorkItem) -> Self {
        Self {
            id: item.id.to_string(),
            priority: item.priority,
            kind: item.kind.clone(),
            description: item.description.clone(),
            created: format_timestamp(item.created),
            error_msg: item.error_msg.clone(),
        }
    }

    fn into_item(self) -> WorkItem {
        WorkItem {
            id: TaskId::parse(&self.id).unwrap_or_else(TaskId::generate),
            priority: self.priority,
            kind: self.kind,
            description: self.description,
            created: parse_timestamp(&self.created).unwrap_or(SystemTime::UNIX_EPOCH),
            error_msg: self.error_msg,
            progress: LatestProgressSink::new(),
            abort: AbortSignal::new(),
            running: false,
        }
    }
}

struct Inner {
    path: PathBuf,
    items: Vec<WorkItem>,
}

/// The daemon's single priority queue of pending/running/failed tasks.
pub struct WorkQueue {
    inner: Mutex<Inner>,
}

impl WorkQueue {
    pub fn load(path: &Path) -> Result<Self, QueueError> {
        let records: Vec<QueueRecord> = atomic::read_json(path)?.unwrap_or_default();
        let items = records.into_iter().map(QueueRecord::into_item).collect();
        Ok(Self {
            inner: Mutex::new(Inner {
                path: path.to_path_buf(),
                items,
            }),
        })
    }

    fn persist(&self, inner: &Inner) -> Result<(), QueueError> {
        let records: Vec<QueueRecord> = inner.items.iter().map(QueueRecord::from_item).collect();
        atomic::write_json(&inner.path, &records)?;
        Ok(())
    }

    pub fn append(&self, item: WorkItem) -> Result<TaskId, QueueError> {
        let mut inner = self.inner.lock();
        let id = item.id;
        inner.items.push(item);
        self.persist(&inner)?;
        Ok(id)
    }

    pub fn remove(&self, id: TaskId) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let idx = inner
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        inner.items.remove(idx);
        self.persist(&inner)?;
        Ok(())
    }

    pub fn set_error(&self, id: TaskId, error_msg: String) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        item.error_msg = error_msg;
        item.running = false;
        self.persist(&inner)?;
        Ok(())
    }

    pub fn set_running(&self, id: TaskId, running: bool) -> Result<(), QueueError> {
        let mut inner = self.inner.lock();
        let item = inner
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| QueueError::NotFound(id.to_string()))?;
        item.running = running;
        Ok(())
    }

    pub fn report_progress(&self, id: TaskId, message: &str) {
        let inner = self.inner.lock();
        if let Some(item) = inner.items.iter().find(|i| i.id == id) {
            item.progress.report(message);
        }
    }

    pub fn abort_handle(&self, id: TaskId) -> Option<AbortSignal> {
        self.inner
            .lock()
            .items
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.abort.clone())
    }

    /// The lowest-priority-number healthy item, or `None` if the queue is
    /// empty or every remaining item has already failed.
    pub fn get_top(&self) -> Option<(TaskId, i64, TaskKind, String)> {
        self.inner
            .lock()
            .items
            .iter()
            .filter(|i| i.is_healthy() && !i.running)
            .min_by_key(|i| i.priority)
            .map(|i| (i.id, i.priority, i.kind.clone(), i.description.clone()))
    }

    pub fn snapshot(&self) -> Vec<WorkItem> {
        self.inner.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
