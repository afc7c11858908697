// File: comparator_integration_tests.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

mod common;

use common::*;
use inspector::classify::{digest, ValidationState};
use inspector::inbound::InboundRequest;
use inspector::monitor::{
    Monitor, PROCESS_BASELINE_FETCH, PROCESS_CONTENT_COMPARE, PROCESS_TEST_FETCH, STAGE_BASELINE,
    STAGE_TEST,
};
use inspector::storage::MemoryStore;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
#[serial]
async fn test_identical_bodies_pass() {
    let h = harness().await;
    mount_get(&h.baseline, "/a", 200, "same").await;
    mount_get(&h.test, "/a", 200, "same").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/a"))
        .await;

    assert_eq!(result.state(), ValidationState::Pass);
    assert_eq!(result.baseline().status(), 200);
    assert_eq!(result.test().status(), 200);
    assert_eq!(result.baseline_digest(), digest(Some(&b"same"[..])).as_deref());
    assert_eq!(h.monitor.result_count("GET", "PASS"), 1);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.store.is_empty());
}

#[tokio::test]
#[serial]
async fn test_content_mismatch_is_archived() {
    let h = harness().await;
    mount_get(&h.baseline, "/a/b.txt", 200, "X").await;
    mount_get(&h.test, "/a/b.txt", 200, "Y").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/a/b.txt"))
        .await;

    assert_eq!(result.state(), ValidationState::ContentNotMatch);
    assert_eq!(h.monitor.result_count("GET", "CONTENT_NOT_MATCH"), 1);

    let baseline = wait_for_key(h.store.as_ref(), "/a/b.txt.baseline").await;
    let test = wait_for_key(h.store.as_ref(), "/a/b.txt.test").await;
    assert_eq!(baseline, Some(b"X".to_vec()));
    assert_eq!(test, Some(b"Y".to_vec()));
}

#[tokio::test]
#[serial]
async fn test_empty_not_found_on_both_sides() {
    let h = harness().await;
    mount_get(&h.baseline, "/x", 404, "").await;
    mount_get(&h.test, "/x", 404, "").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/x"))
        .await;

    assert_eq!(result.state(), ValidationState::EmptyContent);
    assert!(result.baseline().body().is_none());
    assert!(result.test().body().is_none());
}

#[tokio::test]
#[serial]
async fn test_matching_server_errors_are_skipped() {
    let h = harness().await;
    mount_get(&h.baseline, "/y", 500, "err").await;
    mount_get(&h.test, "/y", 500, "err").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/y"))
        .await;

    assert_eq!(result.state(), ValidationState::StatusNot200Or206Skip);
    assert_eq!(h.monitor.result_count("GET", "STATUS_NOT_200/206_SKIP"), 1);
}

#[tokio::test]
#[serial]
async fn test_status_mismatch() {
    let h = harness().await;
    mount_get(&h.baseline, "/s", 200, "body").await;
    mount_get(&h.test, "/s", 503, "body").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/s"))
        .await;

    assert_eq!(result.state(), ValidationState::StatusNotMatch);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(h.store.is_empty());
}

#[tokio::test]
#[serial]
async fn test_partial_content_bodies_are_compared() {
    let h = harness().await;
    mount_get(&h.baseline, "/range", 206, "part-1").await;
    mount_get(&h.test, "/range", 206, "part-2").await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/range"))
        .await;

    assert_eq!(result.state(), ValidationState::ContentNotMatch);
    assert!(wait_for_key(h.store.as_ref(), "/range.test").await.is_some());
}

#[tokio::test]
#[serial]
async fn test_unreachable_test_upstream_is_fetch_error() {
    let baseline = wiremock::MockServer::start().await;
    mount_get(&baseline, "/f", 200, "fine").await;

    let store = Arc::new(MemoryStore::new());
    let monitor = Arc::new(Monitor::new(TEST_NODE).unwrap());
    let config = config_for(&authority(&baseline), &closed_authority());
    let comparator = comparator_for(&config, store.clone(), Arc::clone(&monitor));

    let result = comparator
        .validate(&InboundRequest::get("origin.example", "/f"))
        .await;

    assert_eq!(result.state(), ValidationState::FetchError);
    assert_eq!(result.baseline().status(), 200);
    assert_eq!(result.test().status(), 0);
    assert!(result.test().is_error());
    assert!(result.baseline_digest().is_some());
    assert_eq!(monitor.error_count("GET", STAGE_TEST, "ErrorSend"), 1);
    assert_eq!(monitor.error_count("GET", STAGE_BASELINE, "ErrorSend"), 0);
    assert_eq!(monitor.result_count("GET", "FETCH_ERROR"), 1);
}

#[tokio::test]
#[serial]
async fn test_request_is_replayed_faithfully() {
    let h = harness().await;
    for server in [&h.baseline, &h.test] {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(header("x-trace", "abc"))
            .and(header("host", "origin.example"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hit"))
            .expect(1)
            .mount(server)
            .await;
    }

    let mut headers = HeaderMap::new();
    headers.insert("x-trace", HeaderValue::from_static("abc"));
    headers.insert("host", HeaderValue::from_static("origin.example"));
    headers.insert("connection", HeaderValue::from_static("keep-alive"));
    let request = InboundRequest::get("origin.example", "/search")
        .with_query("q=rust")
        .with_headers(headers);

    let result = h.comparator.validate(&request).await;

    assert_eq!(result.state(), ValidationState::Pass);
    h.baseline.verify().await;
    h.test.verify().await;
}

#[tokio::test]
#[serial]
async fn test_metrics_are_recorded_per_side() {
    let h = harness().await;
    mount_get(&h.baseline, "/m", 200, "one").await;
    mount_get(&h.test, "/m", 200, "one").await;

    h.comparator
        .validate(&InboundRequest::get("origin.example", "/m"))
        .await;

    let baseline = authority(&h.baseline);
    let test = authority(&h.test);
    assert_eq!(h.monitor.sent_count("GET", "origin.example", &baseline, "200"), 1);
    assert_eq!(h.monitor.sent_count("GET", "origin.example", &test, "200"), 1);
    assert_eq!(h.monitor.elapsed_samples(PROCESS_BASELINE_FETCH), 1);
    assert_eq!(h.monitor.elapsed_samples(PROCESS_TEST_FETCH), 1);
    assert_eq!(h.monitor.elapsed_samples(PROCESS_CONTENT_COMPARE), 1);
}

#[tokio::test]
#[serial]
async fn test_slow_side_does_not_cancel_the_other() {
    let h = harness().await;
    mount_get(&h.baseline, "/slow", 200, "body").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("body")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.test)
        .await;

    let result = h
        .comparator
        .validate(&InboundRequest::get("origin.example", "/slow"))
        .await;

    assert_eq!(result.state(), ValidationState::Pass);
    assert_eq!(result.test().status(), 200);
}
