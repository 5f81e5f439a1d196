// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Job record and its lifecycle state.

use crate::ids::{JobId, SheepId};
use crate::model::ModelRef;
use serde::{Deserialize, Serialize};

/// Where a job's input or output payload lives in the storage adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub bucket: String,
    pub key: String,
}

impl BlobRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Structured failure detail carried by a `Failed` job, mirroring the
/// sheep-side exception that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub short_message: String,
    pub long_trace: String,
    pub exception_type: String,
}

/// Lifecycle state of a job, advanced only by the scheduler.
///
/// `Queued -> Accepted -> Processing -> {Done, Failed}`, with `Cancelled`
/// reachable from any state prior to `Done`/`Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Accepted,
    Processing,
    Done,
    Failed,
    Cancelled,
}

impl JobState {
    /// Whether this state is terminal: no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed | JobState::Cancelled)
    }
}

/// A job as tracked by the job store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: JobId,
    pub sheep_id: SheepId,
    pub model: ModelRef,
    pub state: JobState,
    pub input: BlobRef,
    /// Where the output object will be written once the job completes;
    /// caller-supplied at submission time, not assigned by the scheduler.
    pub result: BlobRef,
    pub status_url: Option<String>,
    pub error: Option<ErrorPayload>,
    pub submitted_at_ms: u64,
    pub updated_at_ms: u64,
}

impl JobRecord {
    pub fn new(
        job_id: JobId,
        sheep_id: SheepId,
        model: ModelRef,
        input: BlobRef,
        result: BlobRef,
        status_url: Option<String>,
        submitted_at_ms: u64,
    ) -> Self {
        Self {
            job_id,
            sheep_id,
            model,
            state: JobState::Queued,
            input,
            result,
            status_url,
            error: None,
            submitted_at_ms,
            updated_at_ms: submitted_at_ms,
        }
    }
}
