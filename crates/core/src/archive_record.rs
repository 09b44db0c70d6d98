// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The catalog's data model: one [`ArchiveRecord`] per directory the system knows about.

use serde::{Deserialize, Serialize};

/// A directory's position in the archival state machine.
///
/// Transitions only move forward along this exact chain; no state is ever
/// skipped and no backward edge exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveState {
    Preparing,
    Prepared,
    ArchivingQueued,
    Archiving,
    Archived,
}

impl ArchiveState {
    /// The state this one advances to, or `None` if it's terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            ArchiveState::Preparing => Some(ArchiveState::Prepared),
            ArchiveState::Prepared => Some(ArchiveState::ArchivingQueued),
            ArchiveState::ArchivingQueued => Some(ArchiveState::Archiving),
            ArchiveState::Archiving => Some(ArchiveState::Archived),
            ArchiveState::Archived => None,
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            ArchiveState::Preparing => 0,
            ArchiveState::Prepared => 1,
            ArchiveState::ArchivingQueued => 2,
            ArchiveState::Archiving => 3,
            ArchiveState::Archived => 4,
        }
    }
}

impl std::fmt::Display for ArchiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArchiveState::Preparing => "preparing",
            ArchiveState::Prepared => "prepared",
            ArchiveState::ArchivingQueued => "archiving_queued",
            ArchiveState::Archiving => "archiving",
            ArchiveState::Archived => "archived",
        };
        write!(f, "{s}")
    }
}

/// A catalog entry tracking one directory through the archival pipeline.
///
/// Every field past `original_directory`/`description` is only ever
/// populated once the record has reached the state that defines it;
/// the setters in `ltoarc_storage::catalog` are the only legal way to
/// advance `state` and fill in the fields that go with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub original_directory: String,
    pub description: String,
    pub state: ArchiveState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_queried: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_on_tape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<String>,
}

impl ArchiveRecord {
    pub fn new(original_directory: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            original_directory: original_directory.into(),
            description: description.into(),
            state: ArchiveState::Preparing,
            size: None,
            size_queried: None,
            compressed: None,
            tape: None,
            path_on_tape: None,
            archived: None,
        }
    }
}

#[cfg(test)]
#[path = "archive_record_tests.rs"]
mod tests;
