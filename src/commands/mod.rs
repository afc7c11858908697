// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::Result;
use colored::*;

use crate::cli::ArchiveArgs;
use crate::storage::ContentStore;

pub mod archive;

pub fn handle_archive_command(args: &ArchiveArgs, store: &dyn ContentStore) -> Result<()> {
    match archive::execute(args, store) {
        Ok(()) => Ok(()),
        Err(e) => {
            print_error(&e.to_string());
            Err(e)
        }
    }
}

fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

fn format_file_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
