// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("header too short: expected at least {expected} bytes, got {got}")]
    HeaderTooShort { expected: usize, got: usize },

    #[error("unsupported protocol version: expected {expected}, got {got}")]
    VersionMismatch { expected: u8, got: u8 },

    #[error("invalid opcode: {0}")]
    InvalidOpCode(u8),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("i/o error decoding header: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("connection closed")]
    Closed,
}
