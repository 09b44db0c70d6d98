// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded directory-existence probe.
//!
//! Grounded on the original service's `is_dir_with_timeout`, which shells
//! out to `timeout 1.0s test -d <path>` to survive a stale/hung NFS mount
//! rather than blocking the whole daemon on a single `stat(2)`. We keep the
//! "don't trust a blocking syscall on this path" instinct but implement the
//! bound with `tokio::time::timeout` around a blocking-pool `stat` instead
//! of spawning an external `timeout`/`test` pair of processes.

use std::path::Path;
use std::time::Duration;

/// How long a single [`is_dir`] probe is allowed to run before it's treated
/// as a stall rather than a definite answer.
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(100);

/// Whether `path` is a directory, bounded to [`PROBE_TIMEOUT`].
///
/// `Some(true)`/`Some(false)` is a definite answer; `None` means the probe
/// didn't complete in time (the original's "command timed out" case) — the
/// caller should treat that the same as "can't tell, skip for now".
pub async fn is_dir(path: &Path) -> Option<bool> {
    let path = path.to_path_buf();
    let probe = tokio::task::spawn_blocking(move || path.is_dir());
    match tokio::time::timeout(PROBE_TIMEOUT, probe).await {
        Ok(Ok(is_dir)) => Some(is_dir),
        Ok(Err(_join_error)) => None,
        Err(_elapsed) => None,
    }
}

#[cfg(test)]
#[path = "dirprobe_tests.rs"]
mod tests;
