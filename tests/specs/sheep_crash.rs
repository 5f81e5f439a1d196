// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 6: the sheep's subprocess exits while a job is
//! in-flight — the job fails with `SheepCrashed`, the sheep restarts,
//! and a subsequent job completes normally.

use crate::support::{connect_and_identify, single_sheep_harness, start_job_body};
use axum::http::StatusCode;
use shepherd_core::BlobRef;
use shepherd_protocol::{DonePayload, IdentifyPayload, InputPayload, MessageHeader, OpCode};

#[tokio::test]
async fn crash_mid_job_fails_it_and_restart_serves_the_next_job() {
    const ADDR: &str = "tcp://127.0.0.1:18615";
    let harness = single_sheep_harness(ADDR).await;
    harness
        .storage
        .seed(&BlobRef::new("bucket", "src"), bytes::Bytes::from_static(b"payload"));

    let mut dealer = connect_and_identify(ADDR, "s1").await;

    let (status, _) = harness.post("/start-job", start_job_body("j6", "s1", "src", "dst6")).await;
    assert_eq!(status, StatusCode::OK);

    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.job_id.as_ref().unwrap().as_str(), "j6");

    // Simulate the subprocess dying out from under the scheduler.
    harness.fake_sheep.crash();

    let (status, body) = harness.get("/jobs/j6/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "failed");
    assert_eq!(body["error"]["exception_type"], "SheepCrashed");

    // The worker loop will attempt exactly one restart; re-identify on
    // the same connection, standing in for the worker process
    // reconnecting after the dispatcher relaunches it.
    dealer
        .send(
            MessageHeader { opcode: OpCode::Identify, job_id: None },
            serde_json::to_vec(&IdentifyPayload { sheep_id: "s1".into(), available_gpus: 0 }).unwrap(),
        )
        .await
        .unwrap();

    let (status, _) = harness.post("/start-job", start_job_body("j7", "s1", "src", "dst7")).await;
    assert_eq!(status, StatusCode::OK);

    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.opcode, OpCode::Input);
    assert_eq!(input_message.header.job_id.as_ref().unwrap().as_str(), "j7");
    let input_payload: InputPayload = serde_json::from_slice(&input_message.payload).unwrap();
    let job_dir = std::path::PathBuf::from(&input_payload.io_data_root);
    tokio::fs::create_dir_all(job_dir.join("outputs")).await.unwrap();
    tokio::fs::write(job_dir.join("outputs").join("dst7"), b"payload").await.unwrap();
    dealer
        .send(
            MessageHeader { opcode: OpCode::Done, job_id: Some(shepherd_core::JobId::parse("j7").unwrap()) },
            serde_json::to_vec(&DonePayload { output_key: "dst7".into() }).unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = harness.get("/jobs/j7/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "done");

    harness.worker_task.abort();
}
