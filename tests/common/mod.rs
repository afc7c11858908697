// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use inspector::archiver::Archiver;
use inspector::comparator::Comparator;
use inspector::config::ConfigParameter;
use inspector::fetcher::{build_client, Fetcher};
use inspector::monitor::Monitor;
use inspector::result_log::ResultLog;
use inspector::storage::{ContentStore, MemoryStore};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_NODE: &str = "test-node";

pub struct Harness {
    pub baseline: MockServer,
    pub test: MockServer,
    pub store: Arc<MemoryStore>,
    pub monitor: Arc<Monitor>,
    pub comparator: Comparator,
}

/// Host and port of a mock server, as used for an upstream authority.
pub fn authority(server: &MockServer) -> String {
    server.address().to_string()
}

/// An authority nobody listens on.
pub fn closed_authority() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    address.to_string()
}

pub fn config_for(baseline: &str, test: &str) -> ConfigParameter {
    let mut config = ConfigParameter::new();
    config.set_baseline_host(baseline.to_string());
    config.set_test_host(test.to_string());
    config.set_timeout(5);
    config.set_connect_timeout(2);
    config
}

pub fn comparator_for(
    config: &ConfigParameter,
    store: Arc<dyn ContentStore>,
    monitor: Arc<Monitor>,
) -> Comparator {
    let client = build_client(config).unwrap();
    let baseline = Fetcher::new(
        client.clone(),
        config.baseline_host(),
        config.upstream_scheme(),
        Arc::clone(&monitor),
    );
    let test = Fetcher::new(
        client,
        config.test_host(),
        config.upstream_scheme(),
        Arc::clone(&monitor),
    );
    Comparator::new(
        baseline,
        test,
        Archiver::new(store, Arc::clone(&monitor)),
        monitor,
        Arc::new(ResultLog::disabled()),
    )
}

pub async fn harness() -> Harness {
    let baseline = MockServer::start().await;
    let test = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let monitor = Arc::new(Monitor::new(TEST_NODE).unwrap());
    let config = config_for(&authority(&baseline), &authority(&test));
    let comparator = comparator_for(&config, store.clone(), Arc::clone(&monitor));

    Harness {
        baseline,
        test,
        store,
        monitor,
        comparator,
    }
}

pub async fn mount_get(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

/// Archive writes are detached; poll until `key` shows up.
pub async fn wait_for_key(store: &dyn ContentStore, key: &str) -> Option<Vec<u8>> {
    for _ in 0..100 {
        if let Some(content) = store.read(key).unwrap() {
            return Some(content);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}
