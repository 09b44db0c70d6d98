// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `inventory`: report the size and age of every direct subdirectory of a
//! source folder, bucketed by how long it's been untouched, and mail the
//! result to the configured recipients.
//!
//! Grounded on the original service's `inventory` coroutine.

use crate::context::TaskContext;
use crate::error::TaskError;
use bytesize::ByteSize;
use ltoarc_adapters::run_command;
use ltoarc_core::{AbortSignal, ProgressSink};
use std::time::Duration;

const SECS_PER_DAY: u64 = 24 * 3600;
const TWO_YEARS: Duration = Duration::from_secs(2 * 365 * SECS_PER_DAY);
const ONE_YEAR: Duration = Duration::from_secs(365 * SECS_PER_DAY);
const SIX_MONTHS: Duration = Duration::from_secs(182 * SECS_PER_DAY);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AgeBucket {
    Recent,
    SixMonths,
    OneYear,
    TwoYears,
}

impl AgeBucket {
    fn label(self) -> &'static str {
        match self {
            AgeBucket::TwoYears => ">= 2 years untouched",
            AgeBucket::OneYear => ">= 1 year untouched",
            AgeBucket::SixMonths => ">= 6 months untouched",
            AgeBucket::Recent => "recently touched",
        }
    }

    fn for_age(age: Duration) -> Self {
        if age >= TWO_YEARS {
            AgeBucket::TwoYears
        } else if age >= ONE_YEAR {
            AgeBucket::OneYear
        } else if age >= SIX_MONTHS {
            AgeBucket::SixMonths
        } else {
            AgeBucket::Recent
        }
    }
}

struct Entry {
    name: String,
    size_kb: u64,
    bucket: AgeBucket,
}

pub async fn run(
    ctx: &TaskContext,
    folder: &str,
    progress: &dyn ProgressSink,
    abort: &AbortSignal,
) -> Result<String, TaskError> {
    let now = ctx.clock.now();
    let mut subdirs = Vec::new();
    let mut read_dir = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();

    let mut entries = Vec::with_capacity(subdirs.len());
    for path in &subdirs {
        if abort.is_set() {
            return Ok(format!("Inventory of {folder} aborted"));
        }
        let path_str = path.to_string_lossy().into_owned();
        progress.report(&format!("Measuring {path_str}"));

        let (stdout, _) = run_command("du", &["-s", &path_str], progress, Some(abort), None).await?;
        let size_kb: u64 = stdout
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| TaskError::Other(format!("unparseable du output: {stdout:?}")))?;

        let modified = tokio::fs::metadata(path).await?.modified()?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);

        entries.push(Entry {
            name: path_str,
            size_kb,
            bucket: AgeBucket::for_age(age),
        });
    }

    let report = render_report(&entries);

    if let Some(smtp) = &ctx.smtp {
        let smtp = smtp.clone();
        let header = format!("Inventory of {folder}");
        let body = report.clone();
        tokio::task::spawn_blocking(move || ltoarc_adapters::send_mail(&smtp, &header, &body, &[]))
            .await
            .map_err(|e| TaskError::Other(format!("mail task panicked: {e}")))??;
    }

    Ok(report)
}

fn render_report(entries: &[Entry]) -> String {
    let mut buckets = [
        AgeBucket::TwoYears,
        AgeBucket::OneYear,
        AgeBucket::SixMonths,
        AgeBucket::Recent,
    ];
    buckets.sort();
    buckets.reverse();

    let mut out = String::new();
    for bucket in buckets {
        let mut group: Vec<&Entry> = entries.iter().filter(|e| e.bucket == bucket).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| b.size_kb.cmp(&a.size_kb));
        out.push_str(bucket.label());
        out.push('\n');
        for entry in group {
            out.push_str(&format!(
                "  {} - {}\n",
                entry.name,
                ByteSize(entry.size_kb * 1024).to_string_as(true)
            ));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "inventory_tests.rs"]
mod tests;
