// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handles every task procedure needs: the catalog, the tape
//! library controller, and the configuration knobs that aren't baked into
//! a `TaskKind`'s own arguments.

use ltoarc_adapters::Library;
use ltoarc_core::clock::Clock;
use ltoarc_core::SmtpSettings;
use ltoarc_storage::Catalog;
use std::sync::Arc;

pub struct TaskContext {
    pub catalog: Arc<Catalog>,
    pub library: Arc<Library>,
    pub clock: Arc<dyn Clock>,
    pub exclude_folders: Vec<String>,
    pub tape_max_size_kb: u64,
    pub nfs_export_options: String,
    pub nfs_export_target: String,
    pub smtp: Option<SmtpSettings>,
}

impl TaskContext {
    pub fn exclude_find_args(&self) -> Vec<String> {
        self.exclude_folders
            .iter()
            .flat_map(|folder| {
                vec![
                    "-not".to_string(),
                    "-path".to_string(),
                    format!("./{folder}/*"),
                ]
            })
            .collect()
    }
}
