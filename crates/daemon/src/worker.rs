// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single long-lived worker task: pop the highest-priority healthy
//! queue item, dispatch it, and record success or failure — never killed
//! by a task's own error.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use ltoarc_core::{ProgressSink, TaskId};
use ltoarc_storage::WorkQueue;
use tracing::{error, info};

use crate::lifecycle::DaemonState;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Forwards a task's progress reports into the queue record the client's
/// `queue` command reads back.
struct QueueProgress {
    queue: Arc<WorkQueue>,
    id: TaskId,
}

impl ProgressSink for QueueProgress {
    fn report(&self, message: &str) {
        self.queue.report_progress(self.id, message);
    }
}

/// Resets `running` back to `false` no matter how the task finished,
/// closing the original service's inconsistent-across-revisions reset bug.
struct RunningGuard {
    queue: Arc<WorkQueue>,
    id: TaskId,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let _ = self.queue.set_running(self.id, false);
    }
}

/// Renders an error plus its full `source()` chain, standing in for the
/// original's `f"{e} {traceback.format_exc()}"` formatting.
fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut cause = err.source();
    while let Some(source) = cause {
        out.push_str("\ncaused by: ");
        out.push_str(&source.to_string());
        cause = source.source();
    }
    out
}

pub fn spawn(state: Arc<DaemonState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move { run(state).await })
}

async fn run(state: Arc<DaemonState>) {
    loop {
        let top = state.queue.get_top();
        let Some((id, _priority, kind, description)) = top else {
            tokio::select! {
                _ = tokio::time::sleep(POLL_INTERVAL) => continue,
                _ = state.shutdown.notified() => return,
            }
        };

        if let Err(e) = state.queue.set_running(id, true) {
            error!(error = %e, "failed to mark queue item running");
            continue;
        }
        let _guard = RunningGuard {
            queue: state.queue.clone(),
            id,
        };
        let abort = state.queue.abort_handle(id).unwrap_or_default();
        let progress = QueueProgress {
            queue: state.queue.clone(),
            id,
        };

        info!(task = %id, %description, "starting task");
        match ltoarc_engine::dispatch(&state.context, &kind, &progress, &abort).await {
            Ok(outcome) => {
                info!(task = %id, %outcome, "task finished");
                if let Err(e) = state.queue.remove(id) {
                    error!(task = %id, error = %e, "failed to remove finished task from queue");
                }
            }
            Err(e) => {
                let message = error_chain(&e);
                error!(task = %id, error = %message, "task failed");
                if let Err(e) = state.queue.set_error(id, message) {
                    error!(task = %id, error = %e, "failed to record task failure");
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
