// File: archive.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{anyhow, Result};
use colored::*;
use std::io::Write;

use super::{format_file_size, print_info, print_success, print_warning};
use crate::archiver::{archive_key, BASELINE_SUFFIX, TEST_SUFFIX};
use crate::classify::digest;
use crate::cli::{ArchiveArgs, ArchiveCommands};
use crate::storage::ContentStore;

pub fn execute(args: &ArchiveArgs, store: &dyn ContentStore) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match &args.command {
        ArchiveCommands::List { prefix } => list(store, prefix.as_deref(), &mut out),
        ArchiveCommands::Show { key } => show(store, key, &mut out),
        ArchiveCommands::Diff { path } => diff(store, path, &mut out),
    }
}

pub fn list(store: &dyn ContentStore, prefix: Option<&str>, out: &mut impl Write) -> Result<()> {
    let keys: Vec<String> = store
        .keys()?
        .into_iter()
        .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
        .collect();

    if keys.is_empty() {
        print_warning("No archived bodies found");
        return Ok(());
    }
    for key in &keys {
        writeln!(out, "{}", key)?;
    }
    print_info(&format!("{} archived bodies", keys.len()));
    Ok(())
}

pub fn show(store: &dyn ContentStore, key: &str, out: &mut impl Write) -> Result<()> {
    let content = store
        .read(key)?
        .ok_or_else(|| anyhow!("No archived body under {}", key))?;
    out.write_all(&content)?;
    out.flush()?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSummary {
    pub baseline_len: Option<usize>,
    pub test_len: Option<usize>,
    pub baseline_digest: Option<String>,
    pub test_digest: Option<String>,
    pub first_difference: Option<usize>,
}

impl DiffSummary {
    pub fn new(baseline: Option<&[u8]>, test: Option<&[u8]>) -> Self {
        let first_difference = match (baseline, test) {
            (Some(b), Some(t)) => first_difference(b, t),
            _ => None,
        };
        DiffSummary {
            baseline_len: baseline.map(<[u8]>::len),
            test_len: test.map(<[u8]>::len),
            baseline_digest: digest(baseline),
            test_digest: digest(test),
            first_difference,
        }
    }

    pub fn identical(&self) -> bool {
        self.baseline_len.is_some() && self.test_len.is_some() && self.first_difference.is_none()
    }
}

/// Offset of the first differing byte; a strict prefix differs at the end
/// of the shorter side.
pub fn first_difference(baseline: &[u8], test: &[u8]) -> Option<usize> {
    baseline
        .iter()
        .zip(test.iter())
        .position(|(b, t)| b != t)
        .or_else(|| (baseline.len() != test.len()).then(|| baseline.len().min(test.len())))
}

pub fn diff(store: &dyn ContentStore, path: &str, out: &mut impl Write) -> Result<()> {
    let baseline = store.read(&archive_key(path, BASELINE_SUFFIX))?;
    let test = store.read(&archive_key(path, TEST_SUFFIX))?;
    if baseline.is_none() && test.is_none() {
        return Err(anyhow!("Nothing archived for {}", path));
    }

    let summary = DiffSummary::new(baseline.as_deref(), test.as_deref());
    writeln!(out, "{}", path.bold())?;
    write_side(out, "baseline", summary.baseline_len, summary.baseline_digest.as_deref())?;
    write_side(out, "test", summary.test_len, summary.test_digest.as_deref())?;

    match summary.first_difference {
        Some(offset) => writeln!(out, "first difference at byte {}", offset)?,
        None if summary.identical() => print_success("Archived bodies are identical"),
        None => print_warning("One side is missing from the archive"),
    }
    Ok(())
}

fn write_side(
    out: &mut impl Write,
    side: &str,
    len: Option<usize>,
    digest: Option<&str>,
) -> Result<()> {
    match (len, digest) {
        (Some(len), Some(digest)) => writeln!(
            out,
            "  {:<9} {:>12}  sha256 {}",
            side,
            format_file_size(len as u64),
            digest
        )?,
        _ => writeln!(out, "  {:<9} {:>12}", side, "missing")?,
    }
    Ok(())
}
