// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-safe JSON persistence: write to a sibling temp file, `sync_all`,
//! then rename over the target.
//!
//! Grounded in the teacher's `Snapshot::save` (write-temp-then-rename), but
//! deliberately without its `.bak`-rotation-on-corrupt-read behavior: the
//! catalog and queue do not attempt to recover from a corrupted file, they
//! surface it as a fatal error and let the operator intervene.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicStoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt json at {path}: {source}")]
    Corrupt {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path, source: std::io::Error) -> AtomicStoreError {
    AtomicStoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Writes `value` to `path` atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AtomicStoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(path, e))?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)
            .map_err(|e| AtomicStoreError::Corrupt {
                path: tmp_path.clone(),
                source: e,
            })?;
        let file = writer
            .into_inner()
            .map_err(|e| io_err(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    }
    fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Reads `value` from `path`. Returns `Ok(None)` only when the file is
/// absent; a present-but-corrupt file is a hard error (see module docs).
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, AtomicStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);
    let value = serde_json::from_reader(reader).map_err(|e| AtomicStoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Some(value))
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
