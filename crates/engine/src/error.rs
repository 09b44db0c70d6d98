// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors a task procedure can fail with.

use ltoarc_adapters::{LibraryError, MailError, SubprocessError};
use ltoarc_storage::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
    #[error(transparent)]
    Mail(#[from] MailError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not enough space on tape {tape}: available {available_kb} KiB, required {required_kb} KiB")]
    InsufficientSpace {
        tape: String,
        available_kb: u64,
        required_kb: u64,
    },
    #[error("after-copy consistency check failed; file lists written to /tmp/source.txt and /tmp/target.txt")]
    ConsistencyCheckFailed,
    #[error("could not parse `df` output for /ltfs")]
    UnparseableDiskFree,
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
