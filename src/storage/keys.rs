// File: keys.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Mapping between hierarchical store keys and on-disk locations.
//!
//! A key is split on `/`. Every segment is escaped by percent-encoding `%`
//! and control bytes only; everything else, non-ASCII included, is written
//! as-is. A directory segment whose escaped form ends in `.file` has that
//! dot encoded as well, so it can never share a name with a file component.
//!
//! The escaped segment becomes a component `_<escaped>`. When it is longer
//! than [`MAX_CHUNK`] bytes it is cut into a chain: every chunk but the last
//! is a directory `+<chunk>`, the last one keeps the `_` prefix. The final
//! segment's last component carries the `.file` suffix. No component is
//! empty, `.` or `..`, and none exceeds 255 bytes.
//!
//! The inverse rejoins chains, decodes, and accepts a path only if encoding
//! the decoded key reproduces it exactly, so the pair is a bijection between
//! keys and the paths the forward transform produces.

use crate::storage::errors::{StorageError, StorageResult};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};

const SEGMENT: &AsciiSet = &CONTROLS.add(b'%');
const SEGMENT_PREFIX: char = '_';
const CONTINUATION_PREFIX: char = '+';
const ESCAPED_DOT: &str = "%2E";

/// Longest escaped chunk placed in one component. With prefix and suffix a
/// component stays well below the usual 255-byte name limit.
pub const MAX_CHUNK: usize = 200;

pub const FILE_SUFFIX: &str = ".file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey {
    pub dirs: Vec<String>,
    pub file_name: String,
}

impl PathKey {
    pub fn to_path(&self, base: &Path) -> PathBuf {
        let mut path = base.to_path_buf();
        for dir in &self.dirs {
            path.push(dir);
        }
        path.push(&self.file_name);
        path
    }

    /// Rebuilds a `PathKey` from a path relative to the store base.
    pub fn from_relative(relative: &Path) -> StorageResult<Self> {
        let mut components = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| {
                        StorageError::InvalidPath(relative.display().to_string())
                    })?;
                    components.push(name.to_string());
                }
                _ => return Err(StorageError::InvalidPath(relative.display().to_string())),
            }
        }

        let file_name = components
            .pop()
            .ok_or_else(|| StorageError::InvalidPath(relative.display().to_string()))?;
        Ok(Self {
            dirs: components,
            file_name,
        })
    }
}

pub fn to_path_key(key: &str) -> PathKey {
    let mut segments: Vec<&str> = key.split('/').collect();
    let last = segments.pop().unwrap_or_default();

    let mut dirs = Vec::new();
    for segment in segments {
        let mut escaped = escape_segment(segment);
        if escaped.ends_with(FILE_SUFFIX) {
            let dot = escaped.len() - FILE_SUFFIX.len();
            escaped.replace_range(dot..dot + 1, ESCAPED_DOT);
        }
        dirs.extend(chain(&escaped));
    }

    let mut leaf = chain(&escape_segment(last));
    let file = leaf.pop().unwrap_or_else(|| SEGMENT_PREFIX.to_string());
    dirs.extend(leaf);
    PathKey {
        dirs,
        file_name: format!("{}{}", file, FILE_SUFFIX),
    }
}

pub fn from_path_key(path_key: &PathKey) -> StorageResult<String> {
    let leaf = path_key
        .file_name
        .strip_suffix(FILE_SUFFIX)
        .ok_or_else(|| StorageError::InvalidPath(path_key.file_name.clone()))?;

    let mut segments = Vec::with_capacity(path_key.dirs.len() + 1);
    let mut pending = String::new();
    for component in path_key.dirs.iter().map(String::as_str).chain([leaf]) {
        if let Some(chunk) = component.strip_prefix(CONTINUATION_PREFIX) {
            pending.push_str(chunk);
        } else if let Some(chunk) = component.strip_prefix(SEGMENT_PREFIX) {
            pending.push_str(chunk);
            segments.push(unescape_segment(&pending)?);
            pending.clear();
        } else {
            return Err(StorageError::InvalidPath(component.to_string()));
        }
    }
    if !pending.is_empty() {
        return Err(StorageError::InvalidPath(path_key.file_name.clone()));
    }

    let key = segments.join("/");
    // Reject spellings the forward transform never produces.
    if to_path_key(&key) != *path_key {
        return Err(StorageError::InvalidPath(format!(
            "{}/{}",
            path_key.dirs.join("/"),
            path_key.file_name
        )));
    }
    Ok(key)
}

fn escape_segment(segment: &str) -> String {
    let mut escaped = String::with_capacity(segment.len());
    let mut buf = [0u8; 4];
    for ch in segment.chars() {
        if ch.is_ascii() {
            escaped.extend(utf8_percent_encode(ch.encode_utf8(&mut buf), SEGMENT));
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn unescape_segment(escaped: &str) -> StorageResult<String> {
    percent_decode_str(escaped)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| StorageError::InvalidPath(escaped.to_string()))
}

/// Cuts an escaped segment into `+chunk ... _chunk` components.
fn chain(escaped: &str) -> Vec<String> {
    let mut components = Vec::new();
    let mut rest = escaped;
    while rest.len() > MAX_CHUNK {
        let cut = chunk_end(rest);
        components.push(format!("{}{}", CONTINUATION_PREFIX, &rest[..cut]));
        rest = &rest[cut..];
    }
    components.push(format!("{}{}", SEGMENT_PREFIX, rest));
    components
}

/// Largest cut at or below `MAX_CHUNK` that splits neither a character nor
/// a `%XX` escape.
fn chunk_end(escaped: &str) -> usize {
    let bytes = escaped.as_bytes();
    let mut cut = MAX_CHUNK;
    while !escaped.is_char_boundary(cut) {
        cut -= 1;
    }
    if bytes[cut - 1] == b'%' {
        cut -= 1;
    } else if bytes[cut - 2] == b'%' {
        cut -= 2;
    }
    cut
}
