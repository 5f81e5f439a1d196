// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Seed scenario 4: the sheep reports an `ErrorMessage` instead of
//! `DoneMessage` — the job lands `Failed` carrying the sheep's error
//! text, verbatim.

use crate::support::{connect_and_identify, single_sheep_harness, start_job_body};
use axum::http::StatusCode;
use shepherd_core::BlobRef;
use shepherd_protocol::{ErrorMessagePayload, MessageHeader, OpCode};

#[tokio::test]
async fn sheep_error_message_fails_job_with_sheep_error_text() {
    const ADDR: &str = "tcp://127.0.0.1:18613";
    let harness = single_sheep_harness(ADDR).await;
    harness
        .storage
        .seed(&BlobRef::new("bucket", "src"), bytes::Bytes::from_static(b"payload"));

    let (status, _) = harness.post("/start-job", start_job_body("j3", "s1", "src", "dst")).await;
    assert_eq!(status, StatusCode::OK);

    let mut dealer = connect_and_identify(ADDR, "s1").await;
    let input_message = dealer.recv().await.unwrap();
    assert_eq!(input_message.header.opcode, OpCode::Input);

    dealer
        .send(
            MessageHeader { opcode: OpCode::Error, job_id: Some(shepherd_core::JobId::parse("j3").unwrap()) },
            serde_json::to_vec(&ErrorMessagePayload {
                short_message: "ValueError: bad".into(),
                long_trace: "<trace>".into(),
                exception_type: "ValueError".into(),
            })
            .unwrap(),
        )
        .await
        .unwrap();

    let (status, body) = harness.get("/jobs/j3/wait?timeout=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"], "failed");
    assert_eq!(body["error"]["short_message"], "ValueError: bad");
    assert_eq!(body["error"]["exception_type"], "ValueError");

    harness.worker_task.abort();
}
