// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Out-of-band requests sent to a per-sheep worker loop: everything that
//! isn't "here is a new job" goes through this channel instead of the
//! job queue, so slaughter/reconfigure always jump ahead of FIFO work.

use shepherd_core::{JobId, ModelRef, ShepherdError};
use tokio::sync::oneshot;

pub enum SheepCommand {
    /// Cancel a specific job: dequeue it if still `Queued`, or slaughter
    /// the sheep if it is the in-flight job.
    CancelJob {
        job_id: JobId,
        respond_to: oneshot::Sender<Result<(), ShepherdError>>,
    },
    /// Slaughter the sheep unconditionally, failing any in-flight job.
    KillSheep {
        respond_to: oneshot::Sender<Result<(), ShepherdError>>,
    },
    /// Switch the sheep to a new (model, version), restarting it unless
    /// it is already `Ready` with that pair.
    Reconfigure {
        model: ModelRef,
        respond_to: oneshot::Sender<Result<(), ShepherdError>>,
    },
}
