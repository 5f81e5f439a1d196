// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! The sheep lifecycle state machine, shared between the scheduler's
//! internal bookkeeping and the `/status` HTTP response shape.

use crate::ids::SheepId;
use crate::model::{ModelRef, ModelSelector};
use serde::{Deserialize, Serialize};

/// Where a sheep currently sits in its lifecycle.
///
/// `Idle -> Configured -> Starting -> Ready -> Busy -> Ready -> ...`, with
/// `Stopping` reachable from any non-terminal state on shutdown or
/// reconfigure, and `Failed` reachable from any state when the process
/// or container exits unexpectedly or fails its handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheepStateKind {
    Idle,
    Configured,
    Starting,
    Ready,
    Busy,
    Stopping,
    Failed,
}

impl SheepStateKind {
    /// Whether a sheep in this state can accept a new job into its queue.
    pub fn accepts_jobs(self) -> bool {
        matches!(self, SheepStateKind::Ready | SheepStateKind::Busy)
    }
}

/// A point-in-time view of a sheep, as reported by `/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheepSnapshot {
    pub id: SheepId,
    pub state: SheepStateKind,
    pub models: ModelSelector,
    /// The (model, version) pair currently loaded, if the sheep has ever
    /// been started; `None` before the first `ensure_configured`.
    pub loaded_model: Option<ModelRef>,
    pub queue_len: usize,
    pub current_job: Option<String>,
}
