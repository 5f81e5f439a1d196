// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Unified error taxonomy shared by every crate in the workspace.
//!
//! Each variant maps to exactly one HTTP status at the API facade; see
//! `shepherd-daemon::http::error` for that mapping. Keeping the taxonomy
//! here (rather than in the daemon crate) lets the engine and adapters
//! raise the same errors the facade later reports.

use crate::ids::{JobId, SheepId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShepherdError {
    /// The caller's request was malformed: bad job id, unknown model,
    /// missing field.
    #[error("invalid request: {0}")]
    ApiClient(String),

    /// A request named a sheep that isn't in the running sheep-set.
    #[error("unknown sheep: {0}")]
    UnknownSheep(SheepId),

    /// A request named a job the job store has no record of.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// A submitted job-id collided with one already non-terminal in the
    /// job store.
    #[error("job id already in use: {0}")]
    NameConflict(JobId),

    /// The storage adapter could not be reached or a blob operation
    /// exhausted its retry budget.
    #[error("storage inaccessible: {0}")]
    StorageInaccessible(String),

    /// A sheep's configuration (image reference, command, resource
    /// bindings) is invalid or the process/container could not be
    /// started because of it.
    #[error("sheep configuration error for {sheep_id}: {message}")]
    SheepConfiguration { sheep_id: SheepId, message: String },

    /// A sheep exited or stopped responding while a job was in flight.
    #[error("sheep crashed: {sheep_id}")]
    SheepCrashed { sheep_id: SheepId },

    /// The sheep ran the job and reported back a failure.
    #[error("job failed: {job_id}")]
    JobFailed { job_id: JobId },

    /// `await_job` was given a deadline and the job had not reached a
    /// terminal state by the time it elapsed. Never carries `Queued` or
    /// `Processing` as if it were a normal state — the wait simply did
    /// not finish.
    #[error("timed out waiting for job {0} to complete")]
    WaitTimeout(JobId),

    /// Anything else: a programming error, an invariant violation, an
    /// I/O failure unrelated to storage.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShepherdError {
    pub fn internal(message: impl Into<String>) -> Self {
        ShepherdError::Internal(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_identifiers() {
        let err = ShepherdError::UnknownSheep(SheepId::new("s1"));
        assert!(err.to_string().contains("s1"));
    }
}
