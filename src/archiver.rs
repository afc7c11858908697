// File: archiver.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::monitor::{Monitor, STAGE_ARCHIVE};
use crate::storage::ContentStore;
use bytes::Bytes;
use log::{debug, error};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const BASELINE_SUFFIX: &str = ".baseline";
pub const TEST_SUFFIX: &str = ".test";

pub fn archive_key(path: &str, suffix: &str) -> String {
    format!("{}{}", path, suffix)
}

/// Persists the two bodies of a mismatching request.
///
/// Each body is written by its own detached task. A failed write is logged
/// and counted; it does not affect the other write and is not retried.
#[derive(Clone)]
pub struct Archiver {
    store: Arc<dyn ContentStore>,
    monitor: Arc<Monitor>,
}

impl Archiver {
    pub fn new(store: Arc<dyn ContentStore>, monitor: Arc<Monitor>) -> Self {
        Archiver { store, monitor }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    /// Starts both writes and returns immediately. Dropping the handles
    /// detaches the writes.
    pub fn archive(
        &self,
        method: &str,
        path: &str,
        baseline: Bytes,
        test: Bytes,
    ) -> [JoinHandle<()>; 2] {
        [
            self.write_detached(method, archive_key(path, BASELINE_SUFFIX), baseline),
            self.write_detached(method, archive_key(path, TEST_SUFFIX), test),
        ]
    }

    fn write_detached(&self, method: &str, key: String, body: Bytes) -> JoinHandle<()> {
        let store = Arc::clone(&self.store);
        let monitor = Arc::clone(&self.monitor);
        let method = method.to_string();

        tokio::task::spawn_blocking(move || match store.write(&key, &body) {
            Ok(()) => debug!("Archived {} bytes under {}", body.len(), key),
            Err(e) => {
                error!("Write archive error, key: {}, err: {}", key, e);
                monitor.error(&method, STAGE_ARCHIVE, e.tag());
            }
        })
    }
}

impl std::fmt::Debug for Archiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archiver").finish_non_exhaustive()
    }
}
