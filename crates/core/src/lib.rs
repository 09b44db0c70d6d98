// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core domain types for the LTO tape archival daemon.
//!
//! This crate has no I/O: it defines the catalog's data model, the work
//! queue's item type and task-kind dispatch tag, the configuration reader,
//! and small cross-cutting primitives (`TaskId`, `Clock`, `ProgressSink`,
//! `AbortSignal`) that the storage/adapters/engine/daemon crates build on.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod archive_record;
pub mod clock;
pub mod config;
pub mod id;
pub mod progress;
pub mod work_item;

pub use archive_record::{ArchiveRecord, ArchiveState};
pub use clock::{Clock, SystemClock};
#[cfg(feature = "test-support")]
pub use clock::FixedClock;
pub use config::{Config, ConfigError, SmtpSettings};
pub use id::TaskId;
pub use progress::{AbortSignal, LatestProgressSink, NullProgressSink, ProgressSink};
pub use work_item::{TaskKind, WorkItem};
