// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 1: submit a job, the sheep echoes input to output,
//! `/jobs/{id}/wait` reports `Done`, and the uploaded result is
//! byte-identical to what the sheep wrote.

use crate::support::{connect_and_identify, single_sheep_harness, start_job_body};
use axum::http::StatusCode;
use shepherd_core::BlobRef;
use shepherd_protocol::{DonePayload, InputPayload, MessageHeader, OpCode};
use shepherd_storage::Storage;

#[tokio::test]
async fn accepts_runs_and_reports_done_with_byte_identical_output() {
    const ADDR: &str = "tcp://127.0.0.1:18610";
    let harness = single_sheep_harness(ADDR).await;
    harness
        .storage
        .seed(&BlobRef::new("bucket", "src"), bytes::Bytes::from_static(b"hello"));

    let (status, _) = harness.post("/start-job", start_job_body("j1", "s1", "src", "dst")).await;
    assert_eq!(status, StatusCode::OK);

    let mut dealer = connect_and_identify(ADDR, "s1").await;
    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.opcode, OpCode::Input);
    let input_payload: InputPayload = serde_json::from_slice(&input_message.payload).unwrap();
    let job_dir = std::path::PathBuf::from(&input_payload.io_data_root);

    // The worker "echoes" the input it was staged to its output directory.
    let payload = tokio::fs::read(job_dir.join("inputs").join("payload")).await.unwrap();
    assert_eq!(payload, b"hello");
    tokio::fs::create_dir_all(job_dir.join("outputs")).await.unwrap();
    tokio::fs::write(job_dir.join("outputs").join("dst"), &payload).await.unwrap();

    dealer
        .send(
            MessageHeader { opcode: OpCode::Done, job_id: Some(shepherd_core::JobId::parse("j1").unwrap()) },
            serde_json::to_vec(&DonePayload { output_key: "dst".into() }).unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = harness.get("/jobs/j1/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "done");

    let uploaded = harness.storage.get(&BlobRef::new("bucket", "dst")).await.unwrap();
    assert_eq!(uploaded, bytes::Bytes::from_static(b"hello"));

    harness.worker_task.abort();
}
