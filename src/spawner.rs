// File: spawner.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

//! Launch policy for background validations.
//!
//! The gate hands every admitted request to a `Spawner`. The default
//! `TokioSpawner` is unbounded: one task per request, no queue and no cap.
//! A bounded launcher only needs to implement the trait.

use futures::future::BoxFuture;
use futures::FutureExt;
use log::error;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tokio_util::task::TaskTracker;

pub trait Spawner: Send + Sync {
    fn spawn(&self, label: String, task: BoxFuture<'static, ()>);
}

/// Runs `task` to completion, turning a panic into a log line so the
/// failure stays contained to this one unit of work.
pub async fn guarded(label: String, task: BoxFuture<'static, ()>) {
    if let Err(panic) = AssertUnwindSafe(task).catch_unwind().await {
        error!("[RECOVER] task {} panicked: {}", label, panic_message(panic.as_ref()));
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    tracker: TaskTracker,
}

impl TokioSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every task spawned so far has finished. New tasks may
    /// still be spawned afterwards.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, label: String, task: BoxFuture<'static, ()>) {
        self.tracker.spawn(guarded(label, task));
    }
}
