// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The durable catalog: directory path -> [`ArchiveRecord`], state-machine
//! setters, tape placement, and the human-readable summary renderer.

use crate::atomic::{self, AtomicStoreError};
use bytesize::ByteSize;
use ltoarc_core::clock::{format_timestamp, Clock};
use ltoarc_core::{ArchiveRecord, ArchiveState};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("folder already exists in catalog: {0}")]
    DuplicateDirectory(String),
    #[error("folder not found in catalog: {0}")]
    NotFound(String),
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition { from: ArchiveState, to: ArchiveState },
    #[error(transparent)]
    Store(#[from] AtomicStoreError),
}

/// Sentinel returned by [`Catalog::place_directory`] when no known tape has
/// room for the directory.
pub const DOES_NOT_FIT: &str = "doesn't fit";

struct Inner {
    path: PathBuf,
    records: Vec<ArchiveRecord>,
}

/// Durable mapping from original directory to archival record.
///
/// Read once at construction; every mutating call rewrites the whole file
/// atomically (temp file + rename) before returning, matching the
/// "everything on one scheduler, every setter writes before returning"
/// ordering guarantee the daemon relies on.
pub struct Catalog {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Catalog {
    pub fn load(path: &Path, clock: Arc<dyn Clock>) -> Result<Self, CatalogError> {
        let records: Vec<ArchiveRecord> = atomic::read_json(path)?.unwrap_or_default();
        Ok(Self {
            inner: Mutex::new(Inner {
                path: path.to_path_buf(),
                records,
            }),
            clock,
        })
    }

    fn persist(&self, inner: &Inner) -> Result<(), CatalogError> {
        atomic::write_json(&inner.path, &inner.records)?;
        Ok(())
    }

    pub fn create_entry(
        &self,
        directory: &str,
        description: &str,
    ) -> Result<ArchiveRecord, CatalogError> {
        let mut inner = self.inner.lock();
        if inner
            .records
            .iter()
            .any(|r| r.original_directory == directory)
        {
            return Err(CatalogError::DuplicateDirectory(directory.to_string()));
        }
        let record = ArchiveRecord::new(directory, description);
        inner.records.push(record.clone());
        self.persist(&inner)?;
        Ok(record)
    }

    /// Removes a `preparing` record outright, used when `prepare` is aborted
    /// before the directory's size is known (the record reverts to "never
    /// existed", matching the original's `JsonDatabase().data.remove(entry)`).
    pub fn remove_preparing(&self, directory: &str) -> Result<(), CatalogError> {
        let mut inner = self.inner.lock();
        let idx = inner
            .records
            .iter()
            .position(|r| r.original_directory == directory)
            .ok_or_else(|| CatalogError::NotFound(directory.to_string()))?;
        if inner.records[idx].state != ArchiveState::Preparing {
            return Err(CatalogError::InvalidTransition {
                from: inner.records[idx].state,
                to: ArchiveState::Preparing,
            });
        }
        inner.records.remove(idx);
        self.persist(&inner)?;
        Ok(())
    }

    fn transition<F>(
        &self,
        directory: &str,
        from: ArchiveState,
        to: ArchiveState,
        mutate: F,
    ) -> Result<ArchiveRecord, CatalogError>
    where
        F: FnOnce(&mut ArchiveRecord),
    {
        let mut inner = self.inner.lock();
        let idx = inner
            .records
            .iter()
            .position(|r| r.original_directory == directory)
            .ok_or_else(|| CatalogError::NotFound(directory.to_string()))?;
        if inner.records[idx].state != from {
            return Err(CatalogError::InvalidTransition {
                from: inner.records[idx].state,
                to,
            });
        }
        mutate(&mut inner.records[idx]);
        inner.records[idx].state = to;
        let result = inner.records[idx].clone();
        self.persist(&inner)?;
        Ok(result)
    }

    pub fn set_prepared(
        &self,
        directory: &str,
        size_kb: u64,
        compressed: bool,
    ) -> Result<ArchiveRecord, CatalogError> {
        let timestamp = format_timestamp(self.clock.now());
        self.transition(
            directory,
            ArchiveState::Preparing,
            ArchiveState::Prepared,
            |r| {
                r.size = Some(size_kb);
                r.size_queried = Some(timestamp);
                r.compressed = Some(compressed);
            },
        )
    }

    pub fn set_archiving_queued(
        &self,
        directory: &str,
        tape: &str,
    ) -> Result<ArchiveRecord, CatalogError> {
        self.transition(
            directory,
            ArchiveState::Prepared,
            ArchiveState::ArchivingQueued,
            |r| r.tape = Some(tape.to_string()),
        )
    }

    pub fn set_archiving(
        &self,
        directory: &str,
        path_on_tape: &str,
    ) -> Result<ArchiveRecord, CatalogError> {
        self.transition(
            directory,
            ArchiveState::ArchivingQueued,
            ArchiveState::Archiving,
            |r| r.path_on_tape = Some(path_on_tape.to_string()),
        )
    }

    pub fn set_archived(
        &self,
        directory: &str,
        size_kb: Option<u64>,
    ) -> Result<ArchiveRecord, CatalogError> {
        let timestamp = format_timestamp(self.clock.now());
        self.transition(
            directory,
            ArchiveState::Archiving,
            ArchiveState::Archived,
            |r| {
                if let Some(size_kb) = size_kb {
                    r.size = Some(size_kb);
                }
                r.archived = Some(timestamp);
            },
        )
    }

    pub fn get(&self, directory: &str) -> Result<ArchiveRecord, CatalogError> {
        let inner = self.inner.lock();
        inner
            .records
            .iter()
            .find(|r| r.original_directory == directory)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(directory.to_string()))
    }

    pub fn get_all_folders(&self) -> Vec<ArchiveRecord> {
        self.inner.lock().records.clone()
    }

    pub fn get_entries_by_state(&self, state: ArchiveState) -> Vec<ArchiveRecord> {
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| r.state == state)
            .cloned()
            .collect()
    }

    pub fn get_directories_on_tape(&self, tape: &str) -> Vec<ArchiveRecord> {
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| r.tape.as_deref() == Some(tape))
            .cloned()
            .collect()
    }

    /// Finds the fullest known tape that a `prepared` record of size
    /// `size_kb` still fits on (most-full-that-still-fits, first-fit
    /// decreasing), or [`DOES_NOT_FIT`] if none does.
    pub fn place_directory(&self, size_kb: u64, known_tapes: &[String], max_size_kb: u64) -> String {
        let inner = self.inner.lock();
        let mut used: BTreeMap<String, u64> = known_tapes.iter().map(|t| (t.clone(), 0)).collect();
        for record in &inner.records {
            if let Some(tape) = &record.tape {
                *used.entry(tape.clone()).or_insert(0) += record.size.unwrap_or(0);
            }
        }
        let mut candidates: Vec<(String, u64)> = used
            .into_iter()
            .filter(|(_, u)| u + size_kb < max_size_kb)
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));
        candidates
            .into_iter()
            .next()
            .map(|(tape, _)| tape)
            .unwrap_or_else(|| DOES_NOT_FIT.to_string())
    }

    /// Renders the grouped, human-readable catalog summary. A pure function
    /// of the current records plus the caller-supplied set of known tapes
    /// (from the library controller) and tape capacity.
    pub fn format_summary(&self, known_tapes: &[String], max_size_kb: u64) -> String {
        let inner = self.inner.lock();
        let mut sections: Vec<String> = Vec::new();

        let preparing: Vec<&ArchiveRecord> = inner
            .records
            .iter()
            .filter(|r| r.state == ArchiveState::Preparing)
            .collect();
        if !preparing.is_empty() {
            let mut lines = vec!["[preparing]".to_string()];
            for r in &preparing {
                lines.push(format!("{}: {}", r.original_directory, r.description));
            }
            sections.push(lines.join("\n"));
        }

        let mut prepared: Vec<&ArchiveRecord> = inner
            .records
            .iter()
            .filter(|r| r.state == ArchiveState::Prepared)
            .collect();
        prepared.sort_by(|a, b| b.size_queried.cmp(&a.size_queried));
        if !prepared.is_empty() {
            let mut lines = vec!["[prepared]".to_string()];
            for r in &prepared {
                let size_str = ByteSize(r.size.unwrap_or(0) * 1024).to_string_as(true);
                let suggested = self.place_directory(r.size.unwrap_or(0), known_tapes, max_size_kb);
                lines.push(format!(
                    "{} ({} as of {}) -> (suggested: {})",
                    r.original_directory,
                    size_str,
                    r.size_queried.as_deref().unwrap_or("Unknown date"),
                    suggested
                ));
                lines.push(format!("    {}", r.description));
            }
            sections.push(lines.join("\n"));
        }

        for (state, label) in [
            (ArchiveState::ArchivingQueued, "[archiving_queued]"),
            (ArchiveState::Archiving, "[archiving]"),
        ] {
            let group: Vec<&ArchiveRecord> =
                inner.records.iter().filter(|r| r.state == state).collect();
            if group.is_empty() {
                continue;
            }
            let mut lines = vec![label.to_string()];
            for r in &group {
                let size_str = ByteSize(r.size.unwrap_or(0) * 1024).to_string_as(true);
                lines.push(format!(
                    "{} ({}) -> {}",
                    r.original_directory,
                    size_str,
                    r.tape.as_deref().unwrap_or("?")
                ));
            }
            sections.push(lines.join("\n"));
        }

        let has_archived_section = inner
            .records
            .iter()
            .any(|r| r.state == ArchiveState::Archived);
        if has_archived_section {
            let mut lines = vec!["Tape overview:".to_string()];
            let mut tapes: Vec<&String> = known_tapes.iter().collect();
            tapes.sort();
            for tape in tapes {
                let mut tape_entries: Vec<&ArchiveRecord> = inner
                    .records
                    .iter()
                    .filter(|r| r.tape.as_deref() == Some(tape.as_str()))
                    .collect();
                tape_entries.sort_by(|a, b| b.size.unwrap_or(0).cmp(&a.size.unwrap_or(0)));
                let total_kb: u64 = tape_entries.iter().map(|r| r.size.unwrap_or(0)).sum();
                let pct = if max_size_kb > 0 {
                    total_kb as f64 / max_size_kb as f64 * 100.0
                } else {
                    0.0
                };
                lines.push(format!(
                    "{} {} / {} ({:.2}%)",
                    tape,
                    ByteSize(total_kb * 1024).to_string_as(true),
                    ByteSize(max_size_kb * 1024).to_string_as(true),
                    pct
                ));
                for entry in &tape_entries {
                    let size_str = ByteSize(entry.size.unwrap_or(0) * 1024).to_string_as(true);
                    if entry.state == ArchiveState::Archived {
                        lines.push(format!(
                            "    {} ({}) {}",
                            entry.original_directory, size_str, entry.description
                        ));
                    } else {
                        lines.push(format!(
                            "\u{1b}[33m    {} ({}) {} [{}]\u{1b}[0m",
                            entry.original_directory, size_str, entry.description, entry.state
                        ));
                    }
                }
                lines.push(String::new());
            }
            sections.push(lines.join("\n"));
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
