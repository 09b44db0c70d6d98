// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-world adapters: subprocess execution, the tape library
//! controller, outbound mail, and the bounded directory probe.

pub mod dirprobe;
pub mod library;
pub mod mail;
pub mod subprocess;

pub use dirprobe::{is_dir, PROBE_TIMEOUT};
pub use library::{ElementKind, Library, LibraryError, SlotStatus, TapeContent, DEFAULT_MOUNT_PATH};
pub use mail::{send as send_mail, MailError};
pub use subprocess::{run_command, run_command_in, SubprocessError};
