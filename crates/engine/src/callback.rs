// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Fire-and-forget status callback POST. Per open question (a): the
//! source never retries these, so neither do we — a dropped callback
//! never affects job state, only gets logged.

use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
struct CallbackBody<'a> {
    success: bool,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

pub async fn notify_done(client: &reqwest::Client, url: &str) {
    post(client, url, CallbackBody { success: true, status: "Done", message: None }).await;
}

pub async fn notify_failed(client: &reqwest::Client, url: &str, message: String) {
    post(
        client,
        url,
        CallbackBody { success: false, status: "Failed", message: Some(message) },
    )
    .await;
}

async fn post(client: &reqwest::Client, url: &str, body: CallbackBody<'_>) {
    if let Err(e) = client.post(url).json(&body).send().await {
        warn!(url, error = %e, "status callback delivery failed");
    }
}
