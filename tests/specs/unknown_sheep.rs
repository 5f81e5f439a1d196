// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 2: a request naming a sheep id outside the configured
//! set is rejected with 404, never enqueued.

use crate::support::{single_sheep_harness, start_job_body};
use axum::http::StatusCode;

#[tokio::test]
async fn start_job_against_unknown_sheep_returns_404_with_message() {
    const ADDR: &str = "tcp://127.0.0.1:18611";
    let harness = single_sheep_harness(ADDR).await;

    let (status, body) = harness.post("/start-job", start_job_body("j1", "Sx", "src", "dst")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("Sx"));

    harness.worker_task.abort();
}
