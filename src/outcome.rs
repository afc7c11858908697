// File: outcome.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use bytes::Bytes;
use reqwest::header::HeaderMap;
use std::collections::BTreeMap;
use std::fmt;

/// Transport-level failure of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    BuildRequest(String),
    Send(String),
    ReadBody(String),
}

impl FetchError {
    /// Stable label used for metrics.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BuildRequest(_) => "ErrorRequest",
            Self::Send(_) => "ErrorSend",
            Self::ReadBody(_) => "ErrorReadBody",
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BuildRequest(e) => write!(f, "Failed to build request: {}", e),
            Self::Send(e) => write!(f, "Failed to send request: {}", e),
            Self::ReadBody(e) => write!(f, "Failed to read body: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

/// What one upstream answered. Never mutated after the fetch returns.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    status: u16,
    headers: HeaderMap,
    body: Option<Bytes>,
    error: Option<FetchError>,
}

impl FetchOutcome {
    pub fn new(status: u16, headers: HeaderMap, body: Option<Bytes>) -> Self {
        FetchOutcome {
            status,
            headers,
            // An empty read carries no content to compare.
            body: body.filter(|b| !b.is_empty()),
            error: None,
        }
    }

    pub fn failed(status: u16, error: FetchError) -> Self {
        FetchOutcome {
            status,
            headers: HeaderMap::new(),
            body: None,
            error: Some(error),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Label recorded on the send counter: the numeric status, or the error tag.
    pub fn outcome_tag(&self) -> String {
        match &self.error {
            Some(error) => error.tag().to_string(),
            None => self.status.to_string(),
        }
    }

    /// Headers as an ordered name → values map, for structured records.
    pub fn header_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in self.headers.iter() {
            map.entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        map
    }
}
