// File: main.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::str::FromStr;

use inspector::cli::{Cli, Commands};
use inspector::commands::handle_archive_command;
use inspector::config::ConfigParameter;
use inspector::server;
use inspector::storage::DiskStore;

fn init_logger(level: &str) -> Result<()> {
    let level =
        LevelFilter::from_str(level).map_err(|_| anyhow!("Invalid log level: {}", level))?;
    SimpleLogger::new()
        .with_level(level)
        .init()
        .map_err(|e| anyhow!("Failed to initialize logger: {}", e))
}

fn load_config(cli: &Cli) -> Result<ConfigParameter> {
    let mut config = match &cli.config {
        Some(path) => ConfigParameter::from_file(path)?,
        None => ConfigParameter::default(),
    };
    config.apply_cli(cli);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(&cli.log_level)?;
    let config = load_config(&cli)?;

    match &cli.command {
        None | Some(Commands::Serve) => server::serve(config).await,
        Some(Commands::Archive(args)) => {
            let store = DiskStore::new(config.storage_base_path()).with_context(|| {
                format!("Failed to open storage at {}", config.storage_base_path())
            })?;
            handle_archive_command(args, &store)
        }
    }
}
