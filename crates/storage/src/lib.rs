// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable state: the archival catalog and the work queue, both backed by
//! the same crash-safe write-temp-then-rename JSON persistence.

pub mod atomic;
pub mod catalog;
pub mod queue;

pub use atomic::AtomicStoreError;
pub use catalog::{Catalog, CatalogError, DOES_NOT_FIT};
pub use queue::{QueueError, WorkQueue};
