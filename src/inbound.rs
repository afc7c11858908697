// File: inbound.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;

/// A request as received by the intake listener, detached from the
/// connection it arrived on so it can outlive the caller's response.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    method: Method,
    host: String,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl InboundRequest {
    pub fn new(
        method: Method,
        host: String,
        path: String,
        query: Option<String>,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        InboundRequest {
            method,
            host,
            path,
            query,
            headers,
            body,
        }
    }

    pub fn get(host: &str, path: &str) -> Self {
        InboundRequest::new(
            Method::GET,
            host.to_string(),
            path.to_string(),
            None,
            HeaderMap::new(),
            Bytes::new(),
        )
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }
}
