// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Identifiers. Both sheep-ids and job-ids are caller/operator supplied
//! strings rather than generated ids, so they are thin validated newtypes
//! around `String` rather than random-id wrappers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique identifier for a configured sheep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheepId(pub String);

impl SheepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SheepId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SheepId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for SheepId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl Borrow<str> for SheepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Client-supplied job identifier.
///
/// Must be a non-empty, printable sequence without `/` (it is used as a
/// path component under the I/O root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

/// Why a candidate job-id string was rejected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum JobIdError {
    #[error("job id must not be empty")]
    Empty,
    #[error("job id must not contain '/'")]
    ContainsSlash,
    #[error("job id must be printable")]
    NotPrintable,
}

impl JobId {
    pub fn parse(id: impl Into<String>) -> Result<Self, JobIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(JobIdError::Empty);
        }
        if id.contains('/') {
            return Err(JobIdError::ContainsSlash);
        }
        if !id.chars().all(|c| !c.is_control()) {
            return Err(JobIdError::NotPrintable);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for JobId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
