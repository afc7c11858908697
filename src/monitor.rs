// File: monitor.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Prometheus counters and timings, labelled with a node identity that is
//! fixed when the `Monitor` is built.

use log::debug;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::{IpAddr, UdpSocket};
use std::time::Duration;

pub const UNKNOWN_NODE: &str = "unknown";

pub const PROCESS_BASELINE_FETCH: &str = "BaselineFetch";
pub const PROCESS_TEST_FETCH: &str = "TestFetch";
pub const PROCESS_CONTENT_COMPARE: &str = "ContentCompare";

pub const STAGE_INTAKE: &str = "intake";
pub const STAGE_BASELINE: &str = "baseline";
pub const STAGE_TEST: &str = "test";
pub const STAGE_ARCHIVE: &str = "archive";

const ELAPSED_BUCKETS: [f64; 11] = [
    0.1, 0.5, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0, 500.0, 1000.0, 5000.0,
];

#[derive(Clone)]
pub struct Monitor {
    node: String,
    registry: Registry,
    receive_total: IntCounterVec,
    send_total: IntCounterVec,
    result_total: IntCounterVec,
    error_total: IntCounterVec,
    elapsed: HistogramVec,
}

impl Monitor {
    pub fn new(node: impl Into<String>) -> prometheus::Result<Self> {
        let registry = Registry::new();

        let receive_total = IntCounterVec::new(
            Opts::new(
                "inspector_request_receive_total",
                "total number of requests received",
            ),
            &["node", "method", "host"],
        )?;
        let send_total = IntCounterVec::new(
            Opts::new("inspector_request_send_total", "total number of requests sent"),
            &["node", "method", "host", "dst", "status"],
        )?;
        let result_total = IntCounterVec::new(
            Opts::new("inspector_result_total", "result of http content checking"),
            &["node", "method", "state"],
        )?;
        let error_total = IntCounterVec::new(
            Opts::new("inspector_error_total", "errors raised while validating"),
            &["node", "method", "process", "error"],
        )?;
        let elapsed = HistogramVec::new(
            HistogramOpts::new(
                "inspector_elapsed_milliseconds",
                "fetch and comparison elapsed time in milliseconds",
            )
            .buckets(ELAPSED_BUCKETS.to_vec()),
            &["node", "process"],
        )?;

        registry.register(Box::new(receive_total.clone()))?;
        registry.register(Box::new(send_total.clone()))?;
        registry.register(Box::new(result_total.clone()))?;
        registry.register(Box::new(error_total.clone()))?;
        registry.register(Box::new(elapsed.clone()))?;

        Ok(Monitor {
            node: node.into(),
            registry,
            receive_total,
            send_total,
            result_total,
            error_total,
            elapsed,
        })
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn request_received(&self, method: &str, host: &str) {
        self.receive_total
            .with_label_values(&[self.node.as_str(), method, host])
            .inc();
    }

    pub fn request_sent(&self, method: &str, host: &str, dst: &str, outcome: &str) {
        self.send_total
            .with_label_values(&[self.node.as_str(), method, host, dst, outcome])
            .inc();
    }

    pub fn result(&self, method: &str, state: &str) {
        self.result_total
            .with_label_values(&[self.node.as_str(), method, state])
            .inc();
    }

    pub fn error(&self, method: &str, stage: &str, kind: &str) {
        self.error_total
            .with_label_values(&[self.node.as_str(), method, stage, kind])
            .inc();
    }

    pub fn elapsed(&self, process: &str, elapsed: Duration) {
        self.elapsed
            .with_label_values(&[self.node.as_str(), process])
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn received_count(&self, method: &str, host: &str) -> u64 {
        self.receive_total
            .with_label_values(&[self.node.as_str(), method, host])
            .get()
    }

    pub fn sent_count(&self, method: &str, host: &str, dst: &str, outcome: &str) -> u64 {
        self.send_total
            .with_label_values(&[self.node.as_str(), method, host, dst, outcome])
            .get()
    }

    pub fn result_count(&self, method: &str, state: &str) -> u64 {
        self.result_total
            .with_label_values(&[self.node.as_str(), method, state])
            .get()
    }

    pub fn error_count(&self, method: &str, stage: &str, kind: &str) -> u64 {
        self.error_total
            .with_label_values(&[self.node.as_str(), method, stage, kind])
            .get()
    }

    pub fn elapsed_samples(&self, process: &str) -> u64 {
        self.elapsed
            .with_label_values(&[self.node.as_str(), process])
            .get_sample_count()
    }

    /// Prometheus text exposition of everything registered here.
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor").field("node", &self.node).finish()
    }
}

/// First non-loopback IPv4 address of this host, or `unknown`.
///
/// Connecting a UDP socket only selects a route; nothing is sent.
pub fn resolve_node_identity() -> String {
    let local = UdpSocket::bind("0.0.0.0:0").and_then(|socket| {
        socket.connect("8.8.8.8:80")?;
        socket.local_addr()
    });

    match local {
        Ok(addr) => match addr.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => ip.to_string(),
            other => {
                debug!("No usable node address, local route resolved to {}", other);
                UNKNOWN_NODE.to_string()
            }
        },
        Err(e) => {
            debug!("Failed to resolve node address: {}", e);
            UNKNOWN_NODE.to_string()
        }
    }
}
