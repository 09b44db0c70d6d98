// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replaces the original service's `progress_callback`/`abort_event` function
//! arguments with an owned sink and a cancellation token, per the daemon's
//! design note on callback-taking coroutines.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Somewhere a running task can report a one-line status update.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

/// A sink that throws every report away. Useful for tests and for tasks
/// driven outside the queue worker (e.g. unit tests of a task procedure).
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn report(&self, _message: &str) {}
}

/// A sink that records the latest message, for the `WorkItem` the worker is
/// currently running so `queue` can display it.
#[derive(Debug, Default, Clone)]
pub struct LatestProgressSink(Arc<Mutex<Option<String>>>);

impl LatestProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<String> {
        self.0.lock().clone()
    }
}

impl ProgressSink for LatestProgressSink {
    fn report(&self, message: &str) {
        *self.0.lock() = Some(message.to_string());
    }
}

/// A settable one-shot cancellation flag, owned by a `WorkItem` and shared
/// with whatever task procedure and subprocess runs on its behalf.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
