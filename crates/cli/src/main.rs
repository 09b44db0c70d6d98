// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ltoarc — the admin client. Joins its own argv and forwards it to
//! ltoarcd's control socket verbatim; the daemon owns the real grammar
//! and validation, so this binary stays a thin pipe plus friendly local
//! errors for the case where nothing is listening.

mod client;

use clap::Parser;
use ltoarc_daemon::env::Paths;

/// Only the flags this binary handles itself; everything else — the real
/// subcommand grammar — is forwarded to the daemon for parsing, so
/// `ltoarc prepare --help` renders the daemon's own clap-generated text.
#[derive(Parser)]
#[command(name = "ltoarc", version, disable_help_flag = true, about = "Admin client for ltoarcd")]
struct TopLevel {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

#[tokio::main]
async fn main() {
    let top = TopLevel::parse();

    if top.rest.is_empty() {
        eprintln!("usage: ltoarc <command> [args...]");
        eprintln!("run `ltoarc help` to have the daemon list its commands");
        std::process::exit(1);
    }

    let paths = Paths::resolve();
    match client::send_command(&paths.socket_path, &top.rest).await {
        Ok(response) => {
            println!("{response}");
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
