// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accepts connections on the control socket: read the client's NUL-joined
//! argv to EOF, parse and validate it, write back a UTF-8 response, close.

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, warn};

use crate::command::Cli;
use crate::handlers;
use crate::lifecycle::DaemonState;

pub async fn run(listener: UnixListener, state: Arc<DaemonState>) {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state).await {
                                warn!(error = %e, "error serving control connection");
                            }
                        });
                    }
                    Err(e) => error!(error = %e, "failed to accept control connection"),
                }
            }
            _ = state.shutdown.notified() => return,
        }
    }
}

fn split_argv(buf: &[u8]) -> Vec<String> {
    buf.split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).into_owned())
        .collect()
}

async fn handle_connection(mut stream: UnixStream, state: &DaemonState) -> std::io::Result<()> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;

    let argv = split_argv(&buf);

    let response = match Cli::try_parse_from(&argv) {
        Ok(cli) => handlers::handle(state, cli.command).await,
        Err(e) => e.to_string(),
    };

    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
