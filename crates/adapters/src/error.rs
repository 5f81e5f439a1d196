// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

use shepherd_core::SheepId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("sheep {sheep_id} configuration invalid: {message}")]
    Configuration { sheep_id: SheepId, message: String },

    #[error("sheep {sheep_id} failed to start: {message}")]
    SpawnFailed { sheep_id: SheepId, message: String },

    #[error("sheep {sheep_id} is not running")]
    NotRunning { sheep_id: SheepId },

    #[error("sheep {sheep_id} did not stop within the grace period")]
    StopTimedOut { sheep_id: SheepId },
}
