// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Shared harness for the workspace-level specs: boots a real
//! `Shepherd` + `WorkerLoop` pair behind the real `axum` router, bound to
//! a real ZeroMQ endpoint, with a `FakeSheep` in place of the worker
//! subprocess so tests control start/crash timing without touching a
//! real OS process.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use shepherd_adapters::{FakeSheep, Sheep};
use shepherd_core::{ModelRef, ModelSelector, SheepConfig, SheepId, SheepKind, SystemClock};
use shepherd_daemon::http::{router, AppState};
use shepherd_engine::{JobStore, Shepherd, WorkerLoop};
use shepherd_protocol::{DealerConnection, IdentifyPayload, Listener, MessageHeader, OpCode};
use shepherd_storage::{FakeStorage, Storage};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct Harness {
    pub app: Router,
    pub storage: Arc<FakeStorage>,
    pub fake_sheep: Arc<FakeSheep>,
    /// Kept alive for the harness's lifetime; its staging directories are
    /// deleted on drop.
    pub _io_dir: TempDir,
    pub worker_task: tokio::task::JoinHandle<()>,
}

impl Harness {
    /// POST a JSON body against the facade and return the status and
    /// parsed response body.
    pub async fn post(&self, path: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        body_json(response).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = self.app.clone().oneshot(request).await.unwrap();
        body_json(response).await
    }
}

async fn body_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

pub fn bare_config(id: &str, endpoint: &str, io_root: &std::path::Path) -> SheepConfig {
    SheepConfig {
        id: SheepId::new(id),
        endpoint: endpoint.to_string(),
        io_root: io_root.to_path_buf(),
        kind: SheepKind::Bare {
            command: "true".into(),
            args: vec![],
            env: HashMap::new(),
            working_dir: None,
        },
        models: ModelSelector::Any,
        queue_depth: 16,
    }
}

/// Boot a single-sheep daemon on `endpoint`: real router, real engine,
/// `FakeSheep` in place of the subprocess.
pub async fn single_sheep_harness(endpoint: &str) -> Harness {
    let storage = Arc::new(FakeStorage::new());
    let storage_dyn: Arc<dyn Storage> = storage.clone();

    let job_store = Arc::new(JobStore::default());
    let mut shepherd = Shepherd::new(job_store.clone());
    let io_dir = tempfile::tempdir().unwrap();
    let (cell, commands_rx) = shepherd.register_sheep(bare_config("s1", endpoint, io_dir.path()));

    let listener = Listener::bind(endpoint).await.unwrap();
    let fake_sheep: Arc<FakeSheep> = Arc::new(FakeSheep::new());
    let factory_sheep = fake_sheep.clone();
    let factory: Arc<dyn Fn(&SheepConfig, &ModelRef) -> Arc<dyn Sheep> + Send + Sync> =
        Arc::new(move |_cfg, _model| -> Arc<dyn Sheep> { factory_sheep.clone() });

    let mut worker = WorkerLoop::new(
        cell,
        job_store.clone(),
        storage_dyn,
        listener,
        commands_rx,
        reqwest::Client::new(),
        SystemClock,
        factory,
    );
    let worker_task = tokio::spawn(async move { worker.run().await; });

    let shepherd = Arc::new(shepherd);
    let state = AppState { shepherd, clock: SystemClock };
    let app = router(state);

    Harness { app, storage, fake_sheep, _io_dir: io_dir, worker_task }
}

/// Connect a `DealerConnection` to `endpoint` and complete the
/// handshake for `sheep_id`, standing in for the worker-side process.
pub async fn connect_and_identify(endpoint: &str, sheep_id: &str) -> DealerConnection {
    let mut dealer = DealerConnection::connect(endpoint).await.unwrap();
    dealer
        .send(
            MessageHeader { opcode: OpCode::Identify, job_id: None },
            serde_json::to_vec(&IdentifyPayload {
                sheep_id: sheep_id.to_string(),
                available_gpus: 0,
            })
            .unwrap(),
        )
        .await
        .unwrap();
    dealer
}

pub fn start_job_body(id: &str, sheep_id: &str, input_key: &str, result_key: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "sheep_id": sheep_id,
        "model": {"name": "m", "version": "v1"},
        "payload": {"bucket": "bucket", "key": input_key},
        "result": {"bucket": "bucket", "key": result_key},
    })
}
