// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 3: two `start-job` requests naming the same id before
//! the first completes — the second is rejected 409, the first is
//! unaffected.

use crate::support::{single_sheep_harness, start_job_body};
use axum::http::StatusCode;

#[tokio::test]
async fn second_start_job_with_live_id_returns_409() {
    const ADDR: &str = "tcp://127.0.0.1:18612";
    let harness = single_sheep_harness(ADDR).await;

    let (first_status, _) = harness.post("/start-job", start_job_body("j2", "s1", "src", "dst")).await;
    assert_eq!(first_status, StatusCode::OK);

    let (second_status, body) = harness.post("/start-job", start_job_body("j2", "s1", "src2", "dst2")).await;
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("j2"));

    harness.worker_task.abort();
}
