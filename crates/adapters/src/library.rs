// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The tape changer + drive + LTFS mount controller.
//!
//! Grounded on the original service's `Library` class: `mtx` drives the
//! changer, `ltfs`/`mkltfs`/`umount` drive the filesystem on the tape
//! currently in the drive. Every `ensure_*` method is idempotent so task
//! procedures can call them unconditionally at the top of a workflow step.

use crate::subprocess::{run_command, SubprocessError};
use ltoarc_core::{AbortSignal, ProgressSink};
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error(transparent)]
    Subprocess(#[from] SubprocessError),
    #[error("mtx returned no status output: {0}")]
    EmptyStatus(String),
    #[error("unable to parse mtx status line: {0}")]
    UnparseableStatus(String),
    #[error("can't load cleaning tape: {0}")]
    CleaningTape(String),
    #[error("drive is not empty")]
    DriveNotEmpty,
    #[error("no tape loaded")]
    NoTapeLoaded,
    #[error("tape {0} not found in any slot")]
    TapeNotFound(String),
    #[error("no empty slot available to unload into")]
    NoEmptySlot,
    #[error("failed to read /proc/mounts: {0}")]
    Mounts(#[from] std::io::Error),
    #[error("path_on_tape {0:?} contains a subpath separator, which isn't supported")]
    SubpathNotSupported(String),
}

pub const DEFAULT_MOUNT_PATH: &str = "/ltfs";

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    StorageElement,
    DataTransferElement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotStatus {
    pub status: String,
    pub volume_tag: Option<String>,
    pub kind: ElementKind,
}

impl SlotStatus {
    fn is_empty(&self) -> bool {
        self.status == "Empty"
    }

    fn is_full(&self) -> bool {
        self.status == "Full"
    }
}

/// One directory's archived placement, as seen from the tape side — kept
/// deliberately minimal so the engine/daemon crates don't need to depend on
/// `ltoarc-storage` just to call [`Library::check_tape_consistency`].
pub struct TapeContent {
    pub path_on_tape: String,
    pub archived: bool,
}

pub struct Library {
    device: String,
    library_path: String,
}

impl Library {
    pub fn new(library_path: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            library_path: library_path.into(),
        }
    }

    async fn raw_status(&self, progress: &dyn ProgressSink) -> Result<String, LibraryError> {
        let (stdout, stderr) =
            run_command("mtx", &["-f", &self.library_path, "status"], progress, None, None).await?;
        if stdout.trim().is_empty() {
            return Err(LibraryError::EmptyStatus(stderr));
        }
        Ok(stdout)
    }

    /// Parses `mtx -f <device> status` into a slot-indexed map, matching the
    /// original's two-pattern (`Storage Element`/`Data Transfer Element`)
    /// line scan exactly, including its `Empty` data-transfer-element case.
    pub async fn get_status(
        &self,
        progress: &dyn ProgressSink,
    ) -> Result<BTreeMap<u32, SlotStatus>, LibraryError> {
        let output = self.raw_status(progress).await?;
        parse_status(&output)
    }
}

fn parse_status(output: &str) -> Result<BTreeMap<u32, SlotStatus>, LibraryError> {
    let storage_re =
        Regex::new(r"^\s*Storage Element (\d+):(\w+)( .*:VolumeTag=(\w+))?").expect("valid regex");
    let transfer_tagged_re = Regex::new(
        r"^\s*Data Transfer Element (\d+):(\w+) ?\(.*?\):VolumeTag\s*=\s*(\w+)?",
    )
    .expect("valid regex");
    let transfer_empty_re =
        Regex::new(r"^\s*Data Transfer Element (\d+):Empty").expect("valid regex");

    let mut slots = BTreeMap::new();
    for line in output.lines() {
        if let Some(caps) = storage_re.captures(line) {
            let slot: u32 = caps[1].parse().unwrap_or(0);
            slots.insert(
                slot,
                SlotStatus {
                    status: caps[2].to_string(),
                    volume_tag: caps.get(4).map(|m| m.as_str().to_string()),
                    kind: ElementKind::StorageElement,
                },
            );
        } else if line.contains("Data Transfer Element") {
            if let Some(caps) = transfer_tagged_re.captures(line) {
                let slot: u32 = caps[1].parse().unwrap_or(0);
                slots.insert(
                    slot,
                    SlotStatus {
                        status: caps[2].to_string(),
                        volume_tag: caps.get(3).map(|m| m.as_str().to_string()),
                        kind: ElementKind::DataTransferElement,
                    },
                );
            } else if let Some(caps) = transfer_empty_re.captures(line) {
                let slot: u32 = caps[1].parse().unwrap_or(0);
                slots.insert(
                    slot,
                    SlotStatus {
                        status: "Empty".to_string(),
                        volume_tag: None,
                        kind: ElementKind::DataTransferElement,
                    },
                );
            } else {
                return Err(LibraryError::UnparseableStatus(line.to_string()));
            }
        }
    }
    Ok(slots)
}

impl Library {
    pub async fn get_available_tapes(
        &self,
        progress: &dyn ProgressSink,
    ) -> Result<BTreeMap<u32, String>, LibraryError> {
        let slots = self.get_status(progress).await?;
        Ok(slots
            .into_iter()
            .filter_map(|(slot, info)| {
                if info.is_full() {
                    info.volume_tag.map(|tag| (slot, tag))
                } else {
                    None
                }
            })
            .collect())
    }

    pub async fn get_empty_slots(
        &self,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<u32>, LibraryError> {
        let slots = self.get_status(progress).await?;
        Ok(slots
            .into_iter()
            .filter(|(_, info)| info.is_empty())
            .map(|(slot, _)| slot)
            .collect())
    }

    pub async fn find_tape(
        &self,
        volume_tag: &str,
        progress: &dyn ProgressSink,
    ) -> Result<Option<u32>, LibraryError> {
        let slots = self.get_status(progress).await?;
        Ok(slots
            .into_iter()
            .find(|(_, info)| info.volume_tag.as_deref() == Some(volume_tag))
            .map(|(slot, _)| slot))
    }

    pub async fn drive_empty(&self, progress: &dyn ProgressSink) -> Result<bool, LibraryError> {
        let slots = self.get_status(progress).await?;
        Ok(slots.get(&0).map(SlotStatus::is_empty).unwrap_or(true))
    }

    pub fn is_mounted(&self, path: &str) -> Result<bool, LibraryError> {
        let mounts = std::fs::read_to_string("/proc/mounts")?;
        Ok(mounts
            .lines()
            .filter_map(|l| l.split_whitespace().nth(1))
            .any(|mount_point| mount_point == path))
    }

    async fn load_tape(
        &self,
        volume_tag: &str,
        progress: &dyn ProgressSink,
    ) -> Result<(), LibraryError> {
        if !self.drive_empty(progress).await? {
            return Err(LibraryError::DriveNotEmpty);
        }
        let slot = self
            .find_tape(volume_tag, progress)
            .await?
            .ok_or_else(|| LibraryError::TapeNotFound(volume_tag.to_string()))?;
        progress.report(&format!("Loading tape from slot {slot}..."));
        run_command(
            "mtx",
            &["-f", &self.library_path, "load", &slot.to_string()],
            progress,
            None,
            None,
        )
        .await?;
        progress.report(&format!("Tape loaded from slot {slot}"));
        Ok(())
    }

    async fn mount_tape(&self, progress: &dyn ProgressSink, path: &str) -> Result<(), LibraryError> {
        progress.report(&format!("Mounting tape on {path}..."));
        if self.drive_empty(progress).await? {
            return Err(LibraryError::NoTapeLoaded);
        }
        run_command(
            "ltfs",
            &["-o", &format!("devname={}", self.device), path],
            progress,
            None,
            None,
        )
        .await?;
        progress.report(&format!("Tape mounted on {path} with device {}", self.device));
        Ok(())
    }

    /// Creates an LTFS filesystem on the tape currently loaded in the drive.
    async fn create_filesystem(&self, progress: &dyn ProgressSink) -> Result<(), LibraryError> {
        let slots = self.get_status(progress).await?;
        if self.drive_empty(progress).await? {
            return Err(LibraryError::NoTapeLoaded);
        }
        let volume_tag = slots
            .get(&0)
            .and_then(|s| s.volume_tag.clone())
            .ok_or(LibraryError::NoTapeLoaded)?;
        progress.report(&format!("Creating filesystem on tape {volume_tag}..."));
        let barcode = volume_tag.get(0..6).unwrap_or(&volume_tag);
        match run_command(
            "mkltfs",
            &["-d", &self.device, "-s", barcode, "-c"],
            progress,
            None,
            None,
        )
        .await
        {
            Ok(_) => {
                progress.report(&format!(
                    "Filesystem created on tape {volume_tag} with device {}",
                    self.device
                ));
                Ok(())
            }
            Err(SubprocessError::NonZeroExit { stderr, .. })
                if stderr.contains("LTFS15047E Medium is already formatted") =>
            {
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn unmount_tape(&self, progress: &dyn ProgressSink, path: &str) -> Result<(), LibraryError> {
        progress.report("Unmounting tape...");
        run_command("umount", &[path], progress, None, None).await?;
        progress.report("Tape unmounted");
        Ok(())
    }

    async fn unload(&self, progress: &dyn ProgressSink) -> Result<(), LibraryError> {
        let target = *self
            .get_empty_slots(progress)
            .await?
            .first()
            .ok_or(LibraryError::NoEmptySlot)?;
        progress.report("Unloading tape...");
        run_command(
            "mtx",
            &["-f", &self.library_path, "unload", &target.to_string()],
            progress,
            None,
            None,
        )
        .await?;
        progress.report(&format!("Tape unloaded into slot {target}"));
        Ok(())
    }

    /// Unmounts the tape at `path` if it's currently mounted there; a no-op
    /// otherwise. A single check-and-act, not the original's accidental
    /// double-iteration over the same path.
    pub async fn ensure_tape_unmounted(
        &self,
        progress: &dyn ProgressSink,
        path: &str,
    ) -> Result<(), LibraryError> {
        if self.is_mounted(path)? {
            self.unmount_tape(progress, path).await?;
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        }
        Ok(())
    }

    pub async fn ensure_tape_unloaded(
        &self,
        progress: &dyn ProgressSink,
        abort: &AbortSignal,
    ) -> Result<(), LibraryError> {
        if !self.drive_empty(progress).await? {
            self.ensure_tape_unmounted(progress, DEFAULT_MOUNT_PATH).await?;
            if abort.is_set() {
                return Ok(());
            }
            self.unload(progress).await?;
        }
        Ok(())
    }

    pub async fn ensure_tape_loaded(
        &self,
        tape_barcode: &str,
        progress: &dyn ProgressSink,
        abort: &AbortSignal,
    ) -> Result<(), LibraryError> {
        if tape_barcode.starts_with("CLN") {
            return Err(LibraryError::CleaningTape(tape_barcode.to_string()));
        }
        let status = self.get_status(progress).await?;
        if !self.drive_empty(progress).await? {
            if status.get(&0).and_then(|s| s.volume_tag.as_deref()) == Some(tape_barcode) {
                progress.report("Tape already loaded");
                return Ok(());
            }
            self.ensure_tape_unloaded(progress, abort).await?;
        }
        if abort.is_set() {
            return Ok(());
        }
        self.load_tape(tape_barcode, progress).await
    }

    /// `on_tape` is the caller's catalog slice for `tape_barcode` (kept
    /// outside this crate to avoid a dependency on `ltoarc-storage`).
    pub async fn ensure_tape_mounted(
        &self,
        tape_barcode: &str,
        on_tape: &[TapeContent],
        progress: &dyn ProgressSink,
        abort: &AbortSignal,
        path: &str,
    ) -> Result<(), LibraryError> {
        let status = self.get_status(progress).await?;
        if !self.drive_empty(progress).await? {
            if status.get(&0).and_then(|s| s.volume_tag.as_deref()) == Some(tape_barcode)
                && self.is_mounted(path)?
            {
                progress.report("Tape already mounted");
                self.check_tape_consistency(tape_barcode, on_tape, path)?;
                return Ok(());
            }
        }

        self.ensure_tape_loaded(tape_barcode, progress, abort).await?;
        if abort.is_set() {
            return Ok(());
        }

        let should_have_fs = on_tape.iter().any(|c| c.archived);
        if !should_have_fs {
            self.create_filesystem(progress).await?;
        }
        if abort.is_set() {
            return Ok(());
        }

        self.mount_tape(progress, path).await?;
        self.check_tape_consistency(tape_barcode, on_tape, path)
    }

    /// Compares the catalog's idea of what's archived on `tape_barcode`
    /// against what's actually at the mount point, logging a mismatch
    /// rather than failing the caller's workflow.
    pub fn check_tape_consistency(
        &self,
        tape_barcode: &str,
        on_tape: &[TapeContent],
        path: &str,
    ) -> Result<(), LibraryError> {
        let mut should_be_on_tape: Vec<&str> = Vec::with_capacity(on_tape.len());
        for content in on_tape.iter().filter(|c| c.archived) {
            if content.path_on_tape.contains('/') {
                return Err(LibraryError::SubpathNotSupported(content.path_on_tape.clone()));
            }
            should_be_on_tape.push(content.path_on_tape.as_str());
        }
        should_be_on_tape.sort_unstable();

        let mut dirs_on_tape: Vec<String> = std::fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        dirs_on_tape.sort();

        if dirs_on_tape != should_be_on_tape {
            tracing::error!(
                tape = tape_barcode,
                expected = ?should_be_on_tape,
                actual = ?dirs_on_tape,
                "tape consistency check failed"
            );
        } else {
            tracing::info!(tape = tape_barcode, "tape consistency check successful");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod tests;
