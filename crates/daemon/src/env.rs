// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resolves the daemon's well-known filesystem paths, with environment
//! overrides for running more than one instance side by side in tests —
//! the same escape-hatch pattern `ltoarc_core::Config::default_path` uses
//! for the config file itself.

use std::path::PathBuf;

const SERVICE_NAME: &str = "ltoarc";

/// Every path the daemon reads or writes outside of the config file.
#[derive(Debug, Clone)]
pub struct Paths {
    pub socket_path: PathBuf,
    pub pid_path: PathBuf,
    pub catalog_path: PathBuf,
    pub queue_path: PathBuf,
    pub log_path: PathBuf,
}

impl Paths {
    /// `LTOARC_RUN_DIR` overrides the `/tmp`-rooted socket/PID files,
    /// `LTOARC_STATE_DIR` overrides the `/var/lib`-rooted catalog/queue,
    /// `LTOARC_LOG_PATH` overrides the log file directly. Each defaults to
    /// the fixed system path a real install uses.
    pub fn resolve() -> Self {
        let run_dir = std::env::var("LTOARC_RUN_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));
        let state_dir = std::env::var("LTOARC_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/var/lib").join(SERVICE_NAME));
        let log_path = std::env::var("LTOARC_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/var/log").join(format!("{SERVICE_NAME}.log")));

        Self {
            socket_path: run_dir.join(format!("{SERVICE_NAME}_service.sock")),
            pid_path: run_dir.join(format!("{SERVICE_NAME}_service.pid")),
            catalog_path: state_dir.join("database.json"),
            queue_path: state_dir.join("queue.json"),
            log_path,
        }
    }
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
