// File: gate.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use crate::comparator::Comparator;
use crate::inbound::InboundRequest;
use crate::monitor::Monitor;
use crate::spawner::Spawner;
use reqwest::Method;
use std::sync::Arc;

/// Entry point from intake: filters requests and launches validations in
/// the background.
pub struct Gate {
    comparator: Arc<Comparator>,
    spawner: Arc<dyn Spawner>,
    monitor: Arc<Monitor>,
}

impl Gate {
    pub fn new(
        comparator: Arc<Comparator>,
        spawner: Arc<dyn Spawner>,
        monitor: Arc<Monitor>,
    ) -> Self {
        Gate {
            comparator,
            spawner,
            monitor,
        }
    }

    /// Only GET requests are shadowed.
    pub fn is_eligible(method: &Method) -> bool {
        method == Method::GET
    }

    /// Counts the request and, if eligible, launches its validation. Never
    /// waits for the validation.
    pub fn admit(&self, request: InboundRequest) -> bool {
        self.monitor.request_received(request.method().as_str(), request.host());
        if !Self::is_eligible(request.method()) {
            return false;
        }

        let comparator = Arc::clone(&self.comparator);
        let label = format!("{} {}{}", request.method(), request.host(), request.path());
        self.spawner.spawn(
            label,
            Box::pin(async move {
                comparator.validate(&request).await;
            }),
        );
        true
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("comparator", &self.comparator)
            .finish_non_exhaustive()
    }
}
