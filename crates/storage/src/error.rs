// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// Worth retrying: connection refused, timeout, throttling, 5xx.
    #[error("transient storage error: {0}")]
    Transient(String),

    /// Not worth retrying: missing key, access denied, malformed bucket.
    #[error("permanent storage error: {0}")]
    Permanent(String),

    /// All retry attempts were exhausted.
    #[error("storage operation failed after {attempts} attempts: {source}")]
    RetriesExhausted { attempts: u32, source: String },
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}
