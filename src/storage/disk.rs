// File: disk.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::{debug, warn};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::storage::errors::{StorageError, StorageResult};
use crate::storage::keys::{from_path_key, to_path_key, PathKey, FILE_SUFFIX};
use crate::storage::ContentStore;

/// Filesystem-backed key-value store.
///
/// Writes land in a temporary file next to the destination and are renamed
/// into place, so concurrent writers of different keys never observe or
/// clobber each other's partial data.
#[derive(Debug, Clone)]
pub struct DiskStore {
    base_path: PathBuf,
}

impl DiskStore {
    pub fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();
        if base_path.as_os_str().is_empty() {
            return Err(StorageError::InvalidPath(
                "Storage base path must not be empty".to_string(),
            ));
        }
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        to_path_key(key).to_path(&self.base_path)
    }

    fn collect_keys(&self, dir: &Path, keys: &mut Vec<String>) -> StorageResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect_keys(&path, keys)?;
                continue;
            }

            let is_record = path
                .file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| name.ends_with(FILE_SUFFIX));
            if !is_record {
                debug!("Skipping non-record file {}", path.display());
                continue;
            }

            let relative = path
                .strip_prefix(&self.base_path)
                .map_err(|_| StorageError::InvalidPath(path.display().to_string()))?;
            match PathKey::from_relative(relative).and_then(|pk| from_path_key(&pk)) {
                Ok(key) => keys.push(key),
                Err(e) => warn!("Ignoring foreign file {}: {}", path.display(), e),
            }
        }
        Ok(())
    }
}

impl ContentStore for DiskStore {
    fn write(&self, key: &str, content: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key);
        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(content)?;
        staged.as_file().sync_all()?;
        staged.persist(&path)?;

        debug!("Stored {} bytes for {} at {}", content.len(), key, path.display());
        Ok(())
    }

    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = Vec::new();
        self.collect_keys(&self.base_path, &mut keys)?;
        keys.sort();
        Ok(keys)
    }
}
