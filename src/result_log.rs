// File: result_log.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::{DateTime, Utc};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use tokio::sync::{mpsc, oneshot};

use crate::classify::ValidationState;
use crate::comparator::ComparisonResult;
use crate::outcome::FetchOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SideRecord {
    pub error: Option<String>,
    pub status: u16,
    pub digest: Option<String>,
    pub headers: BTreeMap<String, Vec<String>>,
}

impl SideRecord {
    fn new(outcome: &FetchOutcome, digest: Option<&str>) -> Self {
        SideRecord {
            error: outcome.error().map(|e| e.to_string()),
            status: outcome.status(),
            digest: digest.map(str::to_string),
            headers: outcome.header_map(),
        }
    }
}

/// One line of the result log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultRecord {
    pub timestamp: DateTime<Utc>,
    pub state: ValidationState,
    pub method: String,
    pub host: String,
    pub path: String,
    pub baseline: SideRecord,
    pub test: SideRecord,
}

impl ResultRecord {
    pub fn from_result(result: &ComparisonResult) -> Self {
        ResultRecord {
            timestamp: Utc::now(),
            state: result.state(),
            method: result.method().to_string(),
            host: result.host().to_string(),
            path: result.path().to_string(),
            baseline: SideRecord::new(result.baseline(), result.baseline_digest()),
            test: SideRecord::new(result.test(), result.test_digest()),
        }
    }
}

/// Size-based rotation of the result log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    pub max_bytes: u64,
    pub max_backups: usize,
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation {
            max_bytes: 1024 * 1024 * 1024,
            max_backups: 7,
        }
    }
}

impl Rotation {
    pub fn from_megabytes(max_size_mb: u64, max_backups: usize) -> Self {
        Rotation {
            max_bytes: max_size_mb.saturating_mul(1024 * 1024),
            max_backups,
        }
    }
}

#[derive(Debug)]
enum Entry {
    Line(String),
    Flush(oneshot::Sender<()>),
}

/// Append-only JSON-lines sink for comparison results.
///
/// Lines are handed to a dedicated writer thread, so recording never blocks
/// the caller on file I/O. The writer rotates the file once it would grow
/// past `Rotation::max_bytes`: `result.txt` becomes `result.txt.1`, older
/// backups shift up by one and anything past `max_backups` is dropped.
#[derive(Debug)]
pub struct ResultLog {
    sender: Option<mpsc::UnboundedSender<Entry>>,
}

impl ResultLog {
    pub fn open(path: &Path, rotation: Rotation) -> io::Result<Self> {
        let file = RotatingFile::open(path, rotation)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("result-log".to_string())
            .spawn(move || write_entries(file, receiver))?;
        Ok(ResultLog {
            sender: Some(sender),
        })
    }

    /// Records go to the diagnostic log only.
    pub fn disabled() -> Self {
        ResultLog { sender: None }
    }

    pub fn record(&self, result: &ComparisonResult) {
        let line = match serde_json::to_string(&ResultRecord::from_result(result)) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize result for {}: {}", result.path(), e);
                return;
            }
        };
        debug!(target: "inspector::result", "{}", line);

        if let Some(sender) = &self.sender {
            if sender.send(Entry::Line(line)).is_err() {
                error!("Result log writer is gone, dropped result for {}", result.path());
            }
        }
    }

    /// Resolves once every line recorded before the call is written.
    pub async fn flush(&self) {
        let Some(sender) = &self.sender else {
            return;
        };
        let (done, written) = oneshot::channel();
        if sender.send(Entry::Flush(done)).is_ok() {
            let _ = written.await;
        }
    }
}

fn write_entries(mut file: RotatingFile, mut receiver: mpsc::UnboundedReceiver<Entry>) {
    while let Some(entry) = receiver.blocking_recv() {
        match entry {
            Entry::Line(line) => {
                if let Err(e) = file.write_line(&line) {
                    error!("Write result log error, path: {}, err: {}", file.path.display(), e);
                }
            }
            Entry::Flush(done) => {
                if let Err(e) = file.file.flush() {
                    error!("Flush result log error, path: {}, err: {}", file.path.display(), e);
                }
                let _ = done.send(());
            }
        }
    }
}

struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    rotation: Rotation,
}

impl RotatingFile {
    fn open(path: &Path, rotation: Rotation) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = append(path)?;
        let written = file.metadata()?.len();
        Ok(RotatingFile {
            path: path.to_path_buf(),
            file,
            written,
            rotation,
        })
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let needed = line.len() as u64 + 1;
        if self.written > 0 && self.written + needed > self.rotation.max_bytes {
            self.rotate()?;
        }
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.written += needed;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        if self.rotation.max_backups == 0 {
            fs::remove_file(&self.path)?;
        } else {
            for index in (1..self.rotation.max_backups).rev() {
                let from = backup_path(&self.path, index);
                if from.exists() {
                    fs::rename(&from, backup_path(&self.path, index + 1))?;
                }
            }
            fs::rename(&self.path, backup_path(&self.path, 1))?;
        }
        self.file = append(&self.path)?;
        self.written = 0;
        debug!("Rotated result log {}", self.path.display());
        Ok(())
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::InboundRequest;
    use crate::outcome::FetchError;
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue};
    use tempfile::TempDir;

    fn sample_result() -> ComparisonResult {
        let mut headers = HeaderMap::new();
        headers.insert("etag", HeaderValue::from_static("\"v1\""));
        let baseline = FetchOutcome::new(200, headers, Some(Bytes::from_static(b"X")));
        let test = FetchOutcome::failed(0, FetchError::Send("connection refused".to_string()));
        ComparisonResult::new(&InboundRequest::get("origin.example", "/a/b.txt"), baseline, test)
    }

    #[test]
    fn test_record_shape() {
        let record = ResultRecord::from_result(&sample_result());

        assert_eq!(record.state, ValidationState::FetchError);
        assert_eq!(record.method, "GET");
        assert_eq!(record.host, "origin.example");
        assert_eq!(record.path, "/a/b.txt");
        assert_eq!(record.baseline.status, 200);
        assert!(record.baseline.digest.is_some());
        assert_eq!(record.baseline.headers["etag"], vec!["\"v1\"".to_string()]);
        assert_eq!(record.test.status, 0);
        assert_eq!(record.test.digest, None);
        assert_eq!(
            record.test.error.as_deref(),
            Some("Failed to send request: connection refused")
        );
    }

    #[tokio::test]
    async fn test_lines_are_appended() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("log").join("result.txt");
        let log = ResultLog::open(&path, Rotation::default()).unwrap();

        log.record(&sample_result());
        log.record(&sample_result());
        log.flush().await;

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: ResultRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed.state, ValidationState::FetchError);
        assert!(lines[1].contains("\"state\":\"FETCH_ERROR\""));
    }

    #[tokio::test]
    async fn test_rotation_keeps_bounded_backups() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("result.txt");
        let rotation = Rotation {
            max_bytes: 1,
            max_backups: 2,
        };
        let log = ResultLog::open(&path, rotation).unwrap();

        for _ in 0..4 {
            log.record(&sample_result());
        }
        log.flush().await;

        for file in [path.clone(), backup_path(&path, 1), backup_path(&path, 2)] {
            let content = fs::read_to_string(&file).unwrap();
            assert_eq!(content.lines().count(), 1, "{}", file.display());
        }
        assert!(!backup_path(&path, 3).exists());
    }

    #[tokio::test]
    async fn test_rotation_counts_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("result.txt");
        fs::write(&path, "earlier run\n").unwrap();

        let rotation = Rotation {
            max_bytes: 20,
            max_backups: 1,
        };
        let log = ResultLog::open(&path, rotation).unwrap();
        log.record(&sample_result());
        log.flush().await;

        assert_eq!(
            fs::read_to_string(backup_path(&path, 1)).unwrap(),
            "earlier run\n"
        );
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("FETCH_ERROR"));
    }

    #[tokio::test]
    async fn test_rotation_without_backups_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("result.txt");
        let rotation = Rotation {
            max_bytes: 1,
            max_backups: 0,
        };
        let log = ResultLog::open(&path, rotation).unwrap();

        log.record(&sample_result());
        log.record(&sample_result());
        log.flush().await;

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 1);
        assert!(!backup_path(&path, 1).exists());
    }

    #[test]
    fn test_rotation_from_megabytes() {
        assert_eq!(Rotation::from_megabytes(1024, 7), Rotation::default());
        assert_eq!(Rotation::from_megabytes(2, 0).max_bytes, 2 * 1024 * 1024);
    }

    #[tokio::test]
    async fn test_disabled_log_is_silent() {
        let log = ResultLog::disabled();
        log.record(&sample_result());
        log.flush().await;
    }
}
