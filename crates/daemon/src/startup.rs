// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Wires a loaded `Config` into a running dispatcher: one worker loop per
//! configured sheep under the panic-catching supervisor, then the HTTP
//! facade serving until the process is told to stop.

use crate::error::DaemonError;
use crate::http::{self, AppState};
use crate::supervisor;
use shepherd_core::{Config, SystemClock};
use shepherd_engine::{JobStore, Shepherd, WorkerLoop};
use shepherd_protocol::Listener;
use shepherd_storage::{S3Storage, Storage};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load configuration, start every sheep's worker loop, then serve the
/// HTTP facade until the process exits. Does not return on success.
pub async fn run(config_path: impl AsRef<Path>) -> Result<(), DaemonError> {
    let config = Config::load(config_path)?;
    run_with_config(config).await
}

async fn run_with_config(config: Config) -> Result<(), DaemonError> {
    let storage: Arc<dyn Storage> = Arc::new(S3Storage::new(&config.storage).await);
    let job_store = Arc::new(JobStore::default());
    let http_client = reqwest::Client::new();
    let bind_addr = config.http.bind_addr.clone();

    let mut shepherd = Shepherd::new(job_store.clone());
    let mut bound = Vec::with_capacity(config.sheep.len());

    for sheep_config in config.sheep {
        let sheep_id = sheep_config.id.clone();
        let endpoint = sheep_config.endpoint.clone();
        let listener = Listener::bind(&endpoint).await.map_err(|source| DaemonError::ListenerBind {
            sheep_id: sheep_id.to_string(),
            endpoint: endpoint.clone(),
            source,
        })?;
        let (cell, commands_rx) = shepherd.register_sheep(sheep_config);
        bound.push((cell, commands_rx, listener));
    }

    for (cell, commands_rx, listener) in bound {
        let sheep_id = cell.id.clone();
        let worker = WorkerLoop::with_default_factory(
            cell.clone(),
            job_store.clone(),
            storage.clone(),
            listener,
            commands_rx,
            http_client.clone(),
            SystemClock,
        );
        supervisor::spawn_supervised(sheep_id, cell, job_store.clone(), SystemClock, worker);
    }

    info!(sheep_count = shepherd.status().len(), "all sheep worker loops started");

    let shepherd = Arc::new(shepherd);
    let state = AppState { shepherd, clock: SystemClock };
    let app = http::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|source| DaemonError::HttpBind { addr: bind_addr.clone(), source })?;
    info!(addr = %bind_addr, "HTTP facade listening");

    axum::serve(listener, app).await.map_err(DaemonError::Serve)
}
