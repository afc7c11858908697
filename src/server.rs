// File: server.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

use anyhow::{Context, Result};
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header::HOST, request::Parts, StatusCode};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::archiver::Archiver;
use crate::comparator::Comparator;
use crate::config::ConfigParameter;
use crate::fetcher::{build_client, Fetcher};
use crate::gate::Gate;
use crate::inbound::InboundRequest;
use crate::monitor::{resolve_node_identity, Monitor, STAGE_INTAKE};
use crate::result_log::{ResultLog, Rotation};
use crate::spawner::TokioSpawner;
use crate::storage::{ContentStore, DiskStore};

pub const ACKNOWLEDGEMENT: &str = "OK\n";
pub const METRICS_PATH: &str = "/metrics";

/// Everything one running instance needs, wired together.
#[derive(Debug, Clone)]
pub struct Inspector {
    gate: Arc<Gate>,
    spawner: Arc<TokioSpawner>,
    monitor: Arc<Monitor>,
    result_log: Arc<ResultLog>,
    max_body_bytes: usize,
}

#[derive(Clone)]
struct AppState {
    gate: Arc<Gate>,
    monitor: Arc<Monitor>,
    max_body_bytes: usize,
}

impl Inspector {
    pub fn build(
        config: &ConfigParameter,
        store: Arc<dyn ContentStore>,
        result_log: ResultLog,
    ) -> Result<Self> {
        let node = config
            .node()
            .map(str::to_string)
            .unwrap_or_else(resolve_node_identity);
        let monitor = Arc::new(Monitor::new(node).context("Failed to register metrics")?);

        let client = build_client(config).context("Failed to build upstream client")?;
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

        let archiver = Archiver::new(store, Arc::clone(&monitor));
        let result_log = Arc::new(result_log);
        let comparator = Arc::new(Comparator::new(
            baseline,
            test,
            archiver,
            Arc::clone(&monitor),
            Arc::clone(&result_log),
        ));

        let spawner = Arc::new(TokioSpawner::new());
        let gate = Arc::new(Gate::new(comparator, spawner.clone(), Arc::clone(&monitor)));

        Ok(Inspector {
            gate,
            spawner,
            monitor,
            result_log,
            max_body_bytes: config.max_body_bytes(),
        })
    }

    pub fn gate(&self) -> &Arc<Gate> {
        &self.gate
    }

    pub fn spawner(&self) -> &Arc<TokioSpawner> {
        &self.spawner
    }

    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    pub fn result_log(&self) -> &Arc<ResultLog> {
        &self.result_log
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(METRICS_PATH, get(prometheus_metrics).fallback(intake))
            .fallback(intake)
            .with_state(AppState {
                gate: Arc::clone(&self.gate),
                monitor: Arc::clone(&self.monitor),
                max_body_bytes: self.max_body_bytes,
            })
    }
}

/// Answers immediately; validation happens after the response is produced.
/// Only a GET body is read, and only up to `max_body_bytes`.
async fn intake(State(state): State<AppState>, request: Request) -> (StatusCode, &'static str) {
    let (parts, body) = request.into_parts();
    let host = request_host(&parts);

    if !Gate::is_eligible(&parts.method) {
        state.gate.admit(inbound(parts, host, Bytes::new()));
        return (StatusCode::OK, ACKNOWLEDGEMENT);
    }

    match to_bytes(body, state.max_body_bytes).await {
        Ok(body) => {
            state.gate.admit(inbound(parts, host, body));
            (StatusCode::OK, ACKNOWLEDGEMENT)
        }
        Err(e) => {
            warn!(
                "Read request body error, host: {}, path: {}, err: {}",
                host,
                parts.uri.path(),
                e
            );
            let method = parts.method.as_str();
            state.monitor.request_received(method, &host);
            state.monitor.error(method, STAGE_INTAKE, "ErrorReadBody");
            (StatusCode::PAYLOAD_TOO_LARGE, "request body too large\n")
        }
    }
}

fn request_host(parts: &Parts) -> String {
    parts
        .headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_default()
}

fn inbound(parts: Parts, host: String, body: Bytes) -> InboundRequest {
    InboundRequest::new(
        parts.method,
        host,
        parts.uri.path().to_string(),
        parts.uri.query().map(str::to_string),
        parts.headers,
        body,
    )
}

async fn prometheus_metrics(State(state): State<AppState>) -> (StatusCode, String) {
    match state.monitor.render() {
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Ok(result) => (StatusCode::OK, result),
    }
}

pub async fn serve(config: ConfigParameter) -> Result<()> {
    config.validate()?;

    let store = DiskStore::new(config.storage_base_path())
        .with_context(|| format!("Failed to open storage at {}", config.storage_base_path()))?;
    let rotation = Rotation::from_megabytes(
        config.result_log_max_size_mb(),
        config.result_log_max_backups(),
    );
    let result_log = ResultLog::open(Path::new(config.result_log_path()), rotation)
        .with_context(|| format!("Failed to open result log {}", config.result_log_path()))?;
    let inspector = Inspector::build(&config, Arc::new(store), result_log)?;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.listen_port()))
        .await
        .with_context(|| format!("Failed to bind port {}", config.listen_port()))?;

    info!("*** start http server, listen port: {}", config.listen_port());
    info!("*** metrics endpoint: {}", METRICS_PATH);
    info!(
        "*** baseline: {}, test: {}, node: {}",
        config.baseline_host(),
        config.test_host(),
        inspector.monitor().node()
    );
    info!("*** note: every request is answered immediately and validated in background.");
    info!("*** only **GET** requests will be validated.");

    axum::serve(listener, inspector.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve HTTP")?;

    info!(
        "Waiting for {} in-flight validations",
        inspector.spawner().in_flight()
    );
    inspector.spawner().drain().await;
    inspector.result_log().flush().await;
    info!("All validations finished");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
