// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! §8 invariant: `await_job` never reports `Queued`/`Processing` back to
//! a caller — a wait that elapses before the job reaches a terminal
//! state surfaces as a distinct timeout outcome (408), never as
//! `{state: "processing"}`.

use crate::support::{connect_and_identify, single_sheep_harness, start_job_body};
use axum::http::StatusCode;
use shepherd_core::BlobRef;
use shepherd_protocol::OpCode;

#[tokio::test]
async fn waiting_on_a_still_processing_job_times_out_rather_than_reporting_processing() {
    const ADDR: &str = "tcp://127.0.0.1:18615";
    let harness = single_sheep_harness(ADDR).await;
    harness
        .storage
        .seed(&BlobRef::new("bucket", "src"), bytes::Bytes::from_static(b"payload"));

    let mut dealer = connect_and_identify(ADDR, "s1").await;

    let (status, _) = harness.post("/start-job", start_job_body("j1", "s1", "src", "dst")).await;
    assert_eq!(status, StatusCode::OK);

    // Wait for the sheep to actually have the job in flight before
    // polling, so the wait is guaranteed to observe `Processing`, not a
    // race against `Queued`/`Accepted`.
    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.opcode, OpCode::Input);

    let (status, body) = harness.get("/jobs/j1/wait?timeout=0").await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert!(body["message"].as_str().unwrap().contains("j1"));

    harness.worker_task.abort();
}
