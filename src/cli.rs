// File: cli.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = env!("CARGO_PKG_DESCRIPTION"),
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short = 'c', long = "config", global = true, help = "YAML config file")]
    pub config: Option<PathBuf>,

    #[arg(long = "log-level", default_value = "info", global = true)]
    pub log_level: String,

    #[arg(short = 'p', long = "listen-port", global = true)]
    pub listen_port: Option<u16>,

    #[arg(
        short = 'b',
        long = "baseline",
        global = true,
        help = "Baseline upstream authority, e.g. 10.0.0.1:8080"
    )]
    pub baseline: Option<String>,

    #[arg(
        short = 't',
        long = "test",
        global = true,
        help = "Test upstream authority, e.g. 10.0.0.2:8080"
    )]
    pub test: Option<String>,

    #[arg(
        short = 's',
        long = "storage-path",
        global = true,
        help = "Directory for archived mismatching bodies"
    )]
    pub storage_path: Option<String>,

    #[arg(long = "result-log", global = true, help = "JSON-lines result log file")]
    pub result_log: Option<String>,

    #[arg(long = "node", global = true, help = "Node identity used as metric label")]
    pub node: Option<String>,

    #[arg(long = "timeout", global = true, help = "Upstream request timeout in seconds")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Accept traffic and shadow it against both upstreams (default)
    Serve,
    /// Inspect archived mismatching bodies
    Archive(ArchiveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    #[command(subcommand)]
    pub command: ArchiveCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ArchiveCommands {
    /// List archived keys
    List {
        #[arg(long = "prefix")]
        prefix: Option<String>,
    },
    /// Write the archived bytes of one key to stdout
    Show { key: String },
    /// Compare the baseline and test bodies archived for a request path
    Diff { path: String },
}
