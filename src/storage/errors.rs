// File: errors.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use std::fmt;

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    InvalidKey(String),
    InvalidPath(String),
    Poisoned(String),
}

impl StorageError {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Io(_) => "ErrorIo",
            Self::InvalidKey(_) => "ErrorInvalidKey",
            Self::InvalidPath(_) => "ErrorInvalidPath",
            Self::Poisoned(_) => "ErrorPoisoned",
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(key) => write!(f, "Invalid key: {}", key),
            Self::InvalidPath(path) => write!(f, "Invalid storage path: {}", path),
            Self::Poisoned(msg) => write!(f, "Store lock poisoned: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::InvalidKey(_) => None,
            Self::InvalidPath(_) => None,
            Self::Poisoned(_) => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<tempfile::PersistError> for StorageError {
    fn from(error: tempfile::PersistError) -> Self {
        Self::Io(error.error)
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
