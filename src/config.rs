// File: config.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::cli::Cli;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigParameter {
    listen_port: u16,
    baseline_host: String,
    test_host: String,
    upstream_scheme: String,
    storage_base_path: String,
    result_log_path: String,
    result_log_max_size_mb: u64,
    result_log_max_backups: usize,
    max_body_bytes: usize,
    node: Option<String>,
    timeout: u64,
    connect_timeout: u64,
    keepalive: u64,
    max_idle_per_host: usize,
    idle_timeout: u64,
}

impl Default for ConfigParameter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParameter {
    pub fn new() -> Self {
        Self {
            listen_port: 4399,
            baseline_host: String::new(),
            test_host: String::new(),
            upstream_scheme: "http".to_string(),
            storage_base_path: "cases".to_string(),
            result_log_path: "log/result.txt".to_string(),
            result_log_max_size_mb: 1024,
            result_log_max_backups: 7,
            max_body_bytes: 32 * 1024 * 1024,
            node: None,
            timeout: 15,
            connect_timeout: 30,
            keepalive: 30,
            max_idle_per_host: 500,
            idle_timeout: 90,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let file: FileConfig = serde_yaml::from_str(raw)?;
        let mut config = Self::new();
        config.apply_file(file);
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(port) = file.http.listen_port {
            self.listen_port = port;
        }
        if let Some(limit) = file.http.max_body_bytes {
            self.max_body_bytes = limit;
        }
        if let Some(baseline) = file.host.baseline {
            self.baseline_host = baseline;
        }
        if let Some(test) = file.host.test {
            self.test_host = test;
        }
        if let Some(scheme) = file.host.scheme {
            self.upstream_scheme = scheme;
        }
        if let Some(base_path) = file.storage.base_path {
            self.storage_base_path = base_path;
        }
        if let Some(path) = file.result_log.path {
            self.result_log_path = path;
        }
        if let Some(max_size_mb) = file.result_log.max_size_mb {
            self.result_log_max_size_mb = max_size_mb;
        }
        if let Some(max_backups) = file.result_log.max_backups {
            self.result_log_max_backups = max_backups;
        }
        if file.node.is_some() {
            self.node = file.node;
        }
        if let Some(timeout) = file.client.timeout {
            self.timeout = timeout;
        }
        if let Some(connect_timeout) = file.client.connect_timeout {
            self.connect_timeout = connect_timeout;
        }
        if let Some(keepalive) = file.client.keepalive {
            self.keepalive = keepalive;
        }
        if let Some(max_idle) = file.client.max_idle_per_host {
            self.max_idle_per_host = max_idle;
        }
        if let Some(idle_timeout) = file.client.idle_timeout {
            self.idle_timeout = idle_timeout;
        }
    }

    /// Command line flags win over the config file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.listen_port {
            self.listen_port = port;
        }
        if let Some(baseline) = &cli.baseline {
            self.baseline_host = baseline.clone();
        }
        if let Some(test) = &cli.test {
            self.test_host = test.clone();
        }
        if let Some(path) = &cli.storage_path {
            self.storage_base_path = path.clone();
        }
        if let Some(path) = &cli.result_log {
            self.result_log_path = path.clone();
        }
        if cli.node.is_some() {
            self.node = cli.node.clone();
        }
        if let Some(timeout) = cli.timeout {
            self.timeout = timeout;
        }
    }

    /// Checks what `serve` needs before anything is bound or opened.
    pub fn validate(&self) -> Result<()> {
        if self.baseline_host.trim().is_empty() {
            bail!("Baseline host is not configured (host.baseline or --baseline)");
        }
        if self.test_host.trim().is_empty() {
            bail!("Test host is not configured (host.test or --test)");
        }
        if self.upstream_scheme != "http" && self.upstream_scheme != "https" {
            bail!("Unsupported upstream scheme: {}", self.upstream_scheme);
        }
        if self.timeout == 0 {
            bail!("Fetch timeout must be greater than zero");
        }
        if self.result_log_max_size_mb == 0 {
            bail!("Result log max size must be greater than zero");
        }
        Ok(())
    }

    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    pub fn set_listen_port(&mut self, listen_port: u16) {
        self.listen_port = listen_port;
    }

    pub fn baseline_host(&self) -> &str {
        &self.baseline_host
    }

    pub fn set_baseline_host(&mut self, baseline_host: String) {
        self.baseline_host = baseline_host;
    }

    pub fn test_host(&self) -> &str {
        &self.test_host
    }

    pub fn set_test_host(&mut self, test_host: String) {
        self.test_host = test_host;
    }

    pub fn upstream_scheme(&self) -> &str {
        &self.upstream_scheme
    }

    pub fn set_upstream_scheme(&mut self, upstream_scheme: String) {
        self.upstream_scheme = upstream_scheme;
    }

    pub fn storage_base_path(&self) -> &str {
        &self.storage_base_path
    }

    pub fn set_storage_base_path(&mut self, storage_base_path: String) {
        self.storage_base_path = storage_base_path;
    }

    pub fn result_log_path(&self) -> &str {
        &self.result_log_path
    }

    pub fn set_result_log_path(&mut self, result_log_path: String) {
        self.result_log_path = result_log_path;
    }

    pub fn result_log_max_size_mb(&self) -> u64 {
        self.result_log_max_size_mb
    }

    pub fn set_result_log_max_size_mb(&mut self, max_size_mb: u64) {
        self.result_log_max_size_mb = max_size_mb;
    }

    pub fn result_log_max_backups(&self) -> usize {
        self.result_log_max_backups
    }

    pub fn set_result_log_max_backups(&mut self, max_backups: usize) {
        self.result_log_max_backups = max_backups;
    }

    /// Largest GET body read from an inbound request.
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    pub fn set_max_body_bytes(&mut self, max_body_bytes: usize) {
        self.max_body_bytes = max_body_bytes;
    }

    pub fn node(&self) -> Option<&str> {
        self.node.as_deref()
    }

    pub fn set_node(&mut self, node: Option<String>) {
        self.node = node;
    }

    pub fn timeout(&self) -> u64 {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: u64) {
        self.timeout = timeout;
    }

    pub fn connect_timeout(&self) -> u64 {
        self.connect_timeout
    }

    pub fn set_connect_timeout(&mut self, connect_timeout: u64) {
        self.connect_timeout = connect_timeout;
    }

    pub fn keepalive(&self) -> u64 {
        self.keepalive
    }

    pub fn set_keepalive(&mut self, keepalive: u64) {
        self.keepalive = keepalive;
    }

    pub fn max_idle_per_host(&self) -> usize {
        self.max_idle_per_host
    }

    pub fn set_max_idle_per_host(&mut self, max_idle_per_host: usize) {
        self.max_idle_per_host = max_idle_per_host;
    }

    pub fn idle_timeout(&self) -> u64 {
        self.idle_timeout
    }

    pub fn set_idle_timeout(&mut self, idle_timeout: u64) {
        self.idle_timeout = idle_timeout;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    http: HttpSection,
    host: HostSection,
    storage: StorageSection,
    result_log: ResultLogSection,
    client: ClientSection,
    node: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HttpSection {
    listen_port: Option<u16>,
    max_body_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HostSection {
    baseline: Option<String>,
    test: Option<String>,
    scheme: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StorageSection {
    base_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResultLogSection {
    path: Option<String>,
    max_size_mb: Option<u64>,
    max_backups: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClientSection {
    timeout: Option<u64>,
    connect_timeout: Option<u64>,
    keepalive: Option<u64>,
    max_idle_per_host: Option<usize>,
    idle_timeout: Option<u64>,
}
