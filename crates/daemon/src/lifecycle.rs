// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown: PID lock, directory/file preparation,
//! catalog/queue/library construction, and socket bind.
//!
//! Grounded on the teacher daemon's `lifecycle::startup`/`DaemonState`
//! shape, stripped of its event-sourced WAL/checkpoint machinery — this
//! daemon's durable state is the catalog and the queue, each already
//! atomic on every mutation, so there is no snapshot/replay step.

use std::fs::File;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use ltoarc_adapters::Library;
use ltoarc_core::clock::Clock;
use ltoarc_core::{Config, ConfigError, SystemClock};
use ltoarc_engine::TaskContext;
use ltoarc_storage::{Catalog, CatalogError, QueueError, WorkQueue};

use crate::env::Paths;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to read config: {0}")]
    Config(#[from] ConfigError),
    #[error("another instance is already running")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Everything the worker and the connection handlers need once the daemon
/// is up: the shared services plus the state needed to tear them down.
pub struct DaemonState {
    pub paths: Paths,
    pub catalog: Arc<Catalog>,
    pub queue: Arc<WorkQueue>,
    pub library: Arc<Library>,
    pub context: Arc<TaskContext>,
    pub source_folders: Vec<String>,
    pub shutdown: Arc<Notify>,
    // Held only to keep the advisory lock alive; released on drop.
    _lock_file: File,
}

pub struct StartupResult {
    pub state: DaemonState,
    pub listener: UnixListener,
}

#[cfg(test)]
impl DaemonState {
    /// Builds a [`DaemonState`] without going through [`startup`]'s PID
    /// lock/socket bind, for handler/worker tests that only need the
    /// shared services wired together.
    pub(crate) fn for_tests(
        paths: Paths,
        catalog: Arc<Catalog>,
        queue: Arc<WorkQueue>,
        library: Arc<Library>,
        context: Arc<TaskContext>,
        source_folders: Vec<String>,
    ) -> Self {
        let lock_file = tempfile::tempfile().expect("failed to create anonymous lock file for test");
        Self {
            paths,
            catalog,
            queue,
            library,
            context,
            source_folders,
            shutdown: Arc::new(Notify::new()),
            _lock_file: lock_file,
        }
    }
}

/// Acquires the PID lock, loads the catalog/queue, and binds the control
/// socket. Returns [`LifecycleError::LockFailed`] (without touching any
/// file) if another instance already holds the lock — those files belong
/// to the live daemon and must not be cleaned up out from under it. Any
/// other failure happening after the lock is acquired cleans up the
/// socket and PID files we just created, since holding the lock means no
/// other instance can be relying on them.
pub async fn startup(config_path: &std::path::Path) -> Result<StartupResult, LifecycleError> {
    let paths = Paths::resolve();
    match startup_inner(config_path, &paths).await {
        Ok(result) => Ok(result),
        Err(e @ LifecycleError::LockFailed(_)) => Err(e),
        Err(e) => {
            cleanup_on_failure(&paths);
            Err(e)
        }
    }
}

fn cleanup_on_failure(paths: &Paths) {
    if paths.socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&paths.socket_path) {
            warn!(error = %e, "failed to remove socket file during startup cleanup");
        }
    }
    if paths.pid_path.exists() {
        if let Err(e) = std::fs::remove_file(&paths.pid_path) {
            warn!(error = %e, "failed to remove PID file during startup cleanup");
        }
    }
}

async fn startup_inner(config_path: &std::path::Path, paths: &Paths) -> Result<StartupResult, LifecycleError> {
    let config = Config::load(config_path)?;

    if let Some(parent) = paths.pid_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = paths.catalog_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.pid_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    {
        use std::io::Write;
        let mut handle = &lock_file;
        writeln!(handle, "{}", std::process::id())?;
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let catalog = Arc::new(Catalog::load(&paths.catalog_path, clock.clone())?);
    let queue = Arc::new(WorkQueue::load(&paths.queue_path)?);
    let library = Arc::new(Library::new(config.library_path()?, config.drive_serial()?));

    let source_folders = config.source_folders();
    let context = Arc::new(TaskContext {
        catalog: catalog.clone(),
        library: library.clone(),
        clock,
        exclude_folders: config.exclude_folders(),
        tape_max_size_kb: config.tape_max_size_kb()?,
        nfs_export_options: config.nfs_export_options("ro,sync,no_subtree_check"),
        nfs_export_target: config.nfs_export_target("*"),
        smtp: config.smtp().ok(),
    });

    if paths.socket_path.exists() {
        std::fs::remove_file(&paths.socket_path)?;
    }
    let listener = UnixListener::bind(&paths.socket_path).map_err(|source| LifecycleError::Bind {
        path: paths.socket_path.clone(),
        source,
    })?;
    std::fs::set_permissions(&paths.socket_path, std::fs::Permissions::from_mode(0o600))?;

    info!(socket = %paths.socket_path.display(), "control socket bound");

    Ok(StartupResult {
        state: DaemonState {
            paths: paths.clone(),
            catalog,
            queue,
            library,
            context,
            source_folders,
            shutdown: Arc::new(Notify::new()),
            _lock_file: lock_file,
        },
        listener,
    })
}

impl DaemonState {
    /// Best-effort cleanup: unmount the tape if one is mounted, then unlink
    /// the PID and socket files. Never fails the shutdown sequence — every
    /// step here is logged, not propagated.
    pub async fn shutdown(&self) {
        info!("shutting down");
        let sink = ltoarc_core::NullProgressSink;
        if let Err(e) = self
            .library
            .ensure_tape_unmounted(&sink, ltoarc_adapters::DEFAULT_MOUNT_PATH)
            .await
        {
            warn!(error = %e, "failed to unmount tape during shutdown");
        }
        if self.paths.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.paths.pid_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.paths.pid_path) {
                warn!(error = %e, "failed to remove PID file");
            }
        }
        info!("shutdown complete");
    }
}

/// Reads the PID recorded by the instance holding the lock, for the
/// "already running" message printed by `main` on [`LifecycleError::LockFailed`].
pub fn read_holder_pid(paths: &Paths) -> Option<String> {
    let contents = std::fs::read_to_string(&paths.pid_path).ok()?;
    let pid = contents.trim();
    if pid.is_empty() {
        None
    } else {
        Some(pid.to_string())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
