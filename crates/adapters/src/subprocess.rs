// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution with live progress reporting and cooperative abort.
//!
//! Grounded on the original service's `run_command`: stream stdout/stderr
//! line-by-line as they arrive (so a running task's progress sink sees
//! output as it happens, not after the process exits), while a background
//! poll watches the task's [`AbortSignal`] and sends the process a real
//! `SIGTERM` the moment it's set.

use ltoarc_core::{AbortSignal, ProgressSink};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum SubprocessError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
    #[error("io error talking to {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

const ABORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runs `command` with `args`, streaming every output line to `progress`.
///
/// If `abort` fires before the process exits, it's sent `SIGTERM` and
/// `run_command` still returns the output accumulated so far rather than
/// erroring — the caller's task procedure is expected to notice the abort
/// itself and unwind. A non-zero exit with no abort in play is always an
/// error.
pub async fn run_command(
    command: &str,
    args: &[&str],
    progress: &dyn ProgressSink,
    abort: Option<&AbortSignal>,
    stdin: Option<&str>,
) -> Result<(String, String), SubprocessError> {
    run_command_in(command, args, None, progress, abort, stdin).await
}

/// As [`run_command`], but spawns with its working directory set to `cwd`
/// instead of the daemon's own — matching the original's `cwd=` keyword
/// argument on several of its `run_command` calls.
pub async fn run_command_in(
    command: &str,
    args: &[&str],
    cwd: Option<&str>,
    progress: &dyn ProgressSink,
    abort: Option<&AbortSignal>,
    stdin: Option<&str>,
) -> Result<(String, String), SubprocessError> {
    progress.report(&format!("{command} {}", args.join(" ")));

    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|source| SubprocessError::Spawn {
        command: command.to_string(),
        source,
    })?;

    if let Some(data) = stdin {
        if !data.is_empty() {
            if let Some(mut pipe) = child.stdin.take() {
                pipe.write_all(data.as_bytes())
                    .await
                    .map_err(|source| SubprocessError::Io {
                        command: command.to_string(),
                        source,
                    })?;
                pipe.shutdown().await.ok();
            }
        }
    } else {
        child.stdin.take();
    }

    let stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");
    let mut stdout_lines = BufReader::new(stdout).lines();
    let mut stderr_lines = BufReader::new(stderr).lines();

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut aborted = false;
    let pid = child.id().map(|p| Pid::from_raw(p as i32));

    loop {
        tokio::select! {
            line = stdout_lines.next_line(), if !stdout_done => {
                match line.map_err(|source| SubprocessError::Io { command: command.to_string(), source })? {
                    Some(l) => { progress.report(&l); stdout_buf.push(l); }
                    None => stdout_done = true,
                }
            }
            line = stderr_lines.next_line(), if !stderr_done => {
                match line.map_err(|source| SubprocessError::Io { command: command.to_string(), source })? {
                    Some(l) => { progress.report(&l); stderr_buf.push(l); }
                    None => stderr_done = true,
                }
            }
            _ = tokio::time::sleep(ABORT_POLL_INTERVAL), if !aborted => {
                if let (Some(signal), Some(pid)) = (abort, pid) {
                    if signal.is_set() {
                        progress.report(&format!("Aborting process: {command}"));
                        let _ = signal::kill(pid, Signal::SIGTERM);
                        aborted = true;
                    }
                }
            }
            else => {
                if stdout_done && stderr_done {
                    break;
                }
            }
        }
        if stdout_done && stderr_done {
            break;
        }
    }

    let status = child
        .wait()
        .await
        .map_err(|source| SubprocessError::Io {
            command: command.to_string(),
            source,
        })?;

    let stdout = stdout_buf.join("\n");
    let stderr = stderr_buf.join("\n");

    if aborted || abort.is_some_and(AbortSignal::is_set) {
        progress.report("Process aborted");
        return Ok((stdout, stderr));
    }

    if !status.success() {
        return Err(SubprocessError::NonZeroExit {
            command: command.to_string(),
            code: status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok((stdout, stderr))
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
