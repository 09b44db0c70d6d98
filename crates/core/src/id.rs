// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable short identifiers for work items.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An 8 hex-character identifier, stable for the lifetime of the [`WorkItem`](crate::WorkItem)
/// it's attached to.
///
/// Derived from a per-process monotonic counter mixed with the startup
/// timestamp, the same way the original service derived its short id from
/// `hash(random.random())`: cheap, unique with overwhelming probability
/// within one daemon's lifetime, never persisted as the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u32);

impl TaskId {
    pub fn generate() -> Self {
        let seed = SEED_COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        nanos.hash(&mut hasher);
        let h = hasher.finish();
        Self((h & 0xFFFF_FFFF) as u32)
    }

    pub fn as_str(&self) -> String {
        format!("{:08x}", self.0)
    }

    pub fn parse(s: &str) -> Option<Self> {
        u32::from_str_radix(s, 16).ok().map(Self)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
