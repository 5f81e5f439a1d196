// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 5: two jobs queued on the same sheep; interrupting the
//! second before it reaches `Processing` cancels it without disturbing
//! the first, which still reaches `Done`, preserving queue order.

use crate::support::{connect_and_identify, single_sheep_harness, start_job_body};
use axum::http::StatusCode;
use shepherd_core::BlobRef;
use shepherd_protocol::{DonePayload, InputPayload, MessageHeader, OpCode};

#[tokio::test]
async fn interrupting_a_queued_job_leaves_its_predecessor_unaffected() {
    const ADDR: &str = "tcp://127.0.0.1:18614";
    let harness = single_sheep_harness(ADDR).await;
    harness
        .storage
        .seed(&BlobRef::new("bucket", "src"), bytes::Bytes::from_static(b"payload"));

    // Connect the sheep-side dealer up front so job j4 starts processing
    // immediately and j5 is still sitting in the queue when cancelled.
    let mut dealer = connect_and_identify(ADDR, "s1").await;

    let (status, _) = harness.post("/start-job", start_job_body("j4", "s1", "src", "dst4")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = harness.post("/start-job", start_job_body("j5", "s1", "src", "dst5")).await;
    assert_eq!(status, StatusCode::OK);

    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.opcode, OpCode::Input);
    assert_eq!(input_message.header.job_id.as_ref().unwrap().as_str(), "j4");

    let (status, _) = harness.post("/interrupt-job/j5", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = harness.get("/jobs/j5/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "cancelled");

    let input_payload: InputPayload = serde_json::from_slice(&input_message.payload).unwrap();
    let job_dir = std::path::PathBuf::from(&input_payload.io_data_root);
    tokio::fs::create_dir_all(job_dir.join("outputs")).await.unwrap();
    tokio::fs::write(job_dir.join("outputs").join("dst4"), b"payload").await.unwrap();
    dealer
        .send(
            MessageHeader { opcode: OpCode::Done, job_id: Some(shepherd_core::JobId::parse("j4").unwrap()) },
            serde_json::to_vec(&DonePayload { output_key: "dst4".into() }).unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = harness.get("/jobs/j4/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "done");

    harness.worker_task.abort();
}
