// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connects to the daemon's control socket, sends one NUL-joined argument
//! vector, and reads the UTF-8 response back to EOF.

use std::path::Path;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("ltoarcd is not running (no socket at {path}): {source}")]
    NotRunning { path: String, #[source] source: std::io::Error },
    #[error("lost connection to ltoarcd: {0}")]
    Io(#[from] std::io::Error),
}

/// Sends `argv` to the daemon at `socket_path` and returns its reply.
///
/// The request is the argument vector joined with NUL bytes, written in a
/// single send with the write half then closed; the response is whatever
/// the daemon writes before closing its end.
pub async fn send_command(socket_path: &Path, argv: &[String]) -> Result<String, ClientError> {
    let mut stream = UnixStream::connect(socket_path).await.map_err(|source| ClientError::NotRunning {
        path: socket_path.display().to_string(),
        source,
    })?;

    let request = argv.join("\0");
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;
    Ok(String::from_utf8_lossy(&response).into_owned())
}
