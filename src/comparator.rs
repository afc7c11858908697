// File: comparator.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::archiver::Archiver;
use crate::classify::{classify, digest, ValidationState};
use crate::fetcher::Fetcher;
use crate::inbound::InboundRequest;
use crate::monitor::{
    Monitor, PROCESS_BASELINE_FETCH, PROCESS_CONTENT_COMPARE, PROCESS_TEST_FETCH, STAGE_BASELINE,
    STAGE_TEST,
};
use crate::outcome::FetchOutcome;
use crate::result_log::ResultLog;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

/// Verdict for one shadowed request. Built once, never changed.
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    state: ValidationState,
    method: String,
    host: String,
    path: String,
    baseline: FetchOutcome,
    test: FetchOutcome,
    baseline_digest: Option<String>,
    test_digest: Option<String>,
}

impl ComparisonResult {
    pub fn new(request: &InboundRequest, baseline: FetchOutcome, test: FetchOutcome) -> Self {
        let state = classify(&baseline, &test);
        let baseline_digest = digest(baseline.body().map(|body| body.as_ref()));
        let test_digest = digest(test.body().map(|body| body.as_ref()));

        ComparisonResult {
            state,
            method: request.method().as_str().to_string(),
            host: request.host().to_string(),
            path: request.path().to_string(),
            baseline,
            test,
            baseline_digest,
            test_digest,
        }
    }

    pub fn state(&self) -> ValidationState {
        self.state
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn baseline(&self) -> &FetchOutcome {
        &self.baseline
    }

    pub fn test(&self) -> &FetchOutcome {
        &self.test
    }

    pub fn baseline_digest(&self) -> Option<&str> {
        self.baseline_digest.as_deref()
    }

    pub fn test_digest(&self) -> Option<&str> {
        self.test_digest.as_deref()
    }
}

/// Fetches one request from both upstreams and judges the pair.
#[derive(Debug)]
pub struct Comparator {
    baseline: Fetcher,
    test: Fetcher,
    archiver: Archiver,
    monitor: Arc<Monitor>,
    result_log: Arc<ResultLog>,
}

impl Comparator {
    pub fn new(
        baseline: Fetcher,
        test: Fetcher,
        archiver: Archiver,
        monitor: Arc<Monitor>,
        result_log: Arc<ResultLog>,
    ) -> Self {
        Comparator {
            baseline,
            test,
            archiver,
            monitor,
            result_log,
        }
    }

    /// Both fetches run concurrently and are always awaited to the end; a
    /// failure on one side does not cancel the other.
    pub async fn validate(&self, request: &InboundRequest) -> ComparisonResult {
        let (baseline, test) = tokio::join!(
            self.timed_fetch(&self.baseline, request, PROCESS_BASELINE_FETCH),
            self.timed_fetch(&self.test, request, PROCESS_TEST_FETCH),
        );

        let method = request.method().as_str();
        self.report_fetch_error(method, STAGE_BASELINE, request, &baseline);
        self.report_fetch_error(method, STAGE_TEST, request, &test);

        let started = Instant::now();
        let result = ComparisonResult::new(request, baseline, test);
        self.monitor.result(method, result.state().as_str());
        self.result_log.record(&result);
        self.monitor.elapsed(PROCESS_CONTENT_COMPARE, started.elapsed());

        if result.state().is_divergent() {
            info!(
                "[REQ] {} {} {} baseline={} test={}",
                result.state(),
                result.host(),
                result.path(),
                result.baseline().status(),
                result.test().status()
            );
        } else {
            debug!("[REQ] {} {} {}", result.state(), result.host(), result.path());
        }

        if result.state() == ValidationState::ContentNotMatch {
            if let (Some(baseline), Some(test)) = (result.baseline().body(), result.test().body()) {
                // Detached; the result above is already emitted.
                let _ = self
                    .archiver
                    .archive(method, request.path(), baseline.clone(), test.clone());
            }
        }

        result
    }

    async fn timed_fetch(
        &self,
        fetcher: &Fetcher,
        request: &InboundRequest,
        process: &str,
    ) -> FetchOutcome {
        let started = Instant::now();
        let outcome = fetcher.fetch(request).await;
        self.monitor.elapsed(process, started.elapsed());
        outcome
    }

    fn report_fetch_error(
        &self,
        method: &str,
        stage: &str,
        request: &InboundRequest,
        outcome: &FetchOutcome,
    ) {
        if let Some(e) = outcome.error() {
            error!(
                "Get {} content error, path: {}, err: {}",
                stage,
                request.path(),
                e
            );
            self.monitor.error(method, stage, e.tag());
        }
    }
}
