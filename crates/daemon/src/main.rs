// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ltoarcd — background process that owns the tape library, the catalog,
//! and the work queue, and serves the admin client over a Unix socket.
//!
//! Architecture:
//! - Listener: accepts control-socket connections, parses+validates+replies
//! - Worker: single long-lived task draining the priority queue
//!
//! Grounded on the teacher daemon's `main.rs` shape (CLI precheck, log
//! rotation, startup marker, lifecycle startup with lock-failure
//! special-casing, signal handling, select-loop shutdown), stripped of its
//! event-sourced WAL/checkpoint machinery — this daemon's durable state is
//! the catalog and queue files, already atomic on every write.

use std::sync::Arc;

use ltoarc_core::Config;
use ltoarc_daemon::lifecycle::{self, LifecycleError, StartupResult};
use ltoarc_daemon::{env, listener, logging, worker};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("ltoarcd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                eprintln!("Usage: ltoarcd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let paths = env::Paths::resolve();
    logging::rotate_log_if_needed(&paths.log_path);
    write_startup_marker(&paths.log_path)?;
    let _log_guard = logging::setup_logging(&paths.log_path)?;

    info!("starting ltoarcd");

    let config_path = Config::default_path();
    let StartupResult { state, listener: unix_listener } = match lifecycle::startup(&config_path).await {
        Ok(result) => result,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = lifecycle::read_holder_pid(&paths).unwrap_or_default();
            eprintln!("ltoarcd is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&paths.log_path, &e);
            error!(error = %e, "failed to start daemon");
            return Err(e.into());
        }
    };
    let state = Arc::new(state);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(listener::run(unix_listener, state.clone()));
    let worker_handle = worker::spawn(state.clone());

    info!(socket = %state.paths.socket_path.display(), "ltoarcd ready");
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    state.shutdown.notify_waiters();
    worker_handle.abort();
    state.shutdown().await;
    info!("ltoarcd stopped");
    Ok(())
}

fn print_help() {
    println!("ltoarcd {}", env!("CARGO_PKG_VERSION"));
    println!("Background archival daemon for the LTO tape workflow");
    println!();
    println!("USAGE:");
    println!("    ltoarcd");
    println!();
    println!("ltoarcd is typically started by a process supervisor and should");
    println!("not be invoked directly. It listens on a Unix socket for commands");
    println!("from the `ltoarc` admin client.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -V, --version    Print version information");
}

const STARTUP_MARKER_PREFIX: &str = "--- ltoarcd: starting (pid: ";

fn write_startup_marker(log_path: &std::path::Path) -> std::io::Result<()> {
    use std::io::Write;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(log_path)?;
    writeln!(file, "{STARTUP_MARKER_PREFIX}{}) ---\n", std::process::id())
}

fn write_startup_error(log_path: &std::path::Path, error: &LifecycleError) {
    use std::io::Write;
    let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(log_path) else {
        return;
    };
    let _ = writeln!(file, "ERROR failed to start ltoarcd: {error}");
}
