// File: fetcher.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::config::ConfigParameter;
use crate::inbound::InboundRequest;
use crate::monitor::Monitor;
use crate::outcome::{FetchError, FetchOutcome};
use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderName};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

const HOP_BY_HOP: [&str; 7] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "transfer-encoding",
    "te",
    "upgrade",
    "content-length",
];

/// Pooled keep-alive client shared by every fetcher of the process.
///
/// reqwest has no separate TLS handshake timeout. `connect_timeout` wraps the
/// whole connector future, TCP connect and TLS handshake together, so a
/// stalled handshake fails as a send error after `connect_timeout` seconds,
/// and never later than the overall `timeout`. No 10 s handshake-only limit
/// is applied.
pub fn build_client(config: &ConfigParameter) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout()))
        .tcp_keepalive(Duration::from_secs(config.keepalive()))
        .pool_max_idle_per_host(config.max_idle_per_host())
        .pool_idle_timeout(Duration::from_secs(config.idle_timeout()))
        .timeout(Duration::from_secs(config.timeout()))
        .build()
}

/// Replays inbound requests against one upstream authority.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    upstream: String,
    scheme: String,
    monitor: Arc<Monitor>,
}

impl Fetcher {
    pub fn new(
        client: reqwest::Client,
        upstream: impl Into<String>,
        scheme: impl Into<String>,
        monitor: Arc<Monitor>,
    ) -> Self {
        Fetcher {
            client,
            upstream: upstream.into(),
            scheme: scheme.into(),
            monitor,
        }
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Sends one copy of `request` to the upstream. Never retries; every
    /// failure is folded into the returned outcome.
    pub async fn fetch(&self, request: &InboundRequest) -> FetchOutcome {
        let outcome = self.send(request).await;
        self.monitor.request_sent(
            request.method().as_str(),
            request.host(),
            &self.upstream,
            &outcome.outcome_tag(),
        );
        outcome
    }

    async fn send(&self, request: &InboundRequest) -> FetchOutcome {
        let url = match self.target_url(request) {
            Ok(url) => url,
            Err(e) => {
                warn!("New request to {} failed: {}", self.upstream, e);
                return FetchOutcome::failed(0, e);
            }
        };

        let mut builder = self
            .client
            .request(request.method().clone(), url)
            .headers(forwarded_headers(request.headers()));
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = error_chain(&e);
                debug!("Request to {} failed: {}", self.upstream, message);
                let error = if e.is_builder() {
                    FetchError::BuildRequest(message)
                } else {
                    FetchError::Send(message)
                };
                return FetchOutcome::failed(0, error);
            }
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        match response.bytes().await {
            Ok(body) => FetchOutcome::new(status, headers, Some(body)),
            Err(e) => {
                let message = error_chain(&e);
                debug!("Reading body from {} failed: {}", self.upstream, message);
                FetchOutcome::failed(status, FetchError::ReadBody(message))
            }
        }
    }

    fn target_url(&self, request: &InboundRequest) -> Result<reqwest::Url, FetchError> {
        let raw = format!(
            "{}://{}{}",
            self.scheme,
            self.upstream,
            request.path_and_query()
        );
        reqwest::Url::parse(&raw).map_err(|e| FetchError::BuildRequest(format!("{}: {}", raw, e)))
    }
}

fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound.iter() {
        if !is_hop_by_hop(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(&name.as_str())
}

fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
