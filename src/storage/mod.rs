// File: mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

pub mod disk;
pub mod errors;
pub mod keys;
pub mod memory;

pub use disk::DiskStore;
pub use errors::{StorageError, StorageResult};
pub use memory::MemoryStore;

/// Key-value store for archived response bodies.
///
/// Implementations must tolerate concurrent writes to disjoint keys.
pub trait ContentStore: Send + Sync {
    fn write(&self, key: &str, content: &[u8]) -> StorageResult<()>;
    fn read(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
    fn keys(&self) -> StorageResult<Vec<String>>;
}
