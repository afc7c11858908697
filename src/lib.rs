// File: lib.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_inception)]
#![allow(clippy::bool_assert_comparison)]
#![allow(clippy::new_without_default)]

pub mod archiver;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod comparator;
pub mod config;
pub mod fetcher;
pub mod gate;
pub mod inbound;
pub mod monitor;
pub mod outcome;
pub mod result_log;
pub mod server;
pub mod spawner;
pub mod storage;
