// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Request/response bodies for the HTTP facade. Kept separate from
//! `shepherd-core`'s domain types so the wire shape can diverge from the
//! internal representation without touching the scheduler.

use serde::{Deserialize, Serialize};
use shepherd_core::{BlobRef, ModelRef};
use std::collections::HashMap;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelDto {
    pub name: String,
    pub version: String,
}

impl From<ModelDto> for ModelRef {
    fn from(m: ModelDto) -> Self {
        ModelRef::new(m.name, m.version)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelOut {
    pub name: String,
    pub version: String,
}

impl From<ModelRef> for ModelOut {
    fn from(m: ModelRef) -> Self {
        Self { name: m.name, version: m.version }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobDto {
    pub bucket: String,
    pub key: String,
}

impl From<BlobDto> for BlobRef {
    fn from(b: BlobDto) -> Self {
        BlobRef::new(b.bucket, b.key)
    }
}

/// Body of `POST /start-job`.
#[derive(Debug, Deserialize)]
pub struct StartJobRequest {
    pub id: String,
    pub sheep_id: String,
    pub model: ModelDto,
    pub payload: BlobDto,
    pub result: BlobDto,
    #[serde(default)]
    pub status_url: Option<String>,
}

/// Body of `POST /reconfigure/{sheep_id}`.
#[derive(Debug, Deserialize)]
pub struct ReconfigureRequest {
    pub model: ModelDto,
}

/// Query string of `GET /jobs/{id}/wait`.
#[derive(Debug, Deserialize)]
pub struct WaitQuery {
    pub timeout: Option<u64>,
}

/// Empty JSON object, returned by every mutating endpoint on success.
#[derive(Debug, Default, Serialize)]
pub struct EmptyResponse {}

#[derive(Debug, Serialize)]
pub struct SheepStatusEntry {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelOut>,
    pub queue_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_flight: Option<String>,
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub sheep: HashMap<String, SheepStatusEntry>,
}

/// Body of `GET /jobs/{id}/wait`.
#[derive(Debug, Serialize)]
pub struct WaitResponse {
    pub state: shepherd_core::JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<shepherd_core::ErrorPayload>,
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}
