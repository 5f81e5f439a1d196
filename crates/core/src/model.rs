// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Model identity and a sheep's acceptance rule for it.

use serde::{Deserialize, Serialize};

/// A (name, version) pair identifying the model a sheep is configured to serve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef {
    pub name: String,
    pub version: String,
}

impl ModelRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Which models a sheep is willing to run.
///
/// `Any` accepts every job regardless of requested model; `Set` only accepts
/// jobs whose requested `ModelRef` is in the configured set. A reconfigure
/// request that names a model outside the sheep's `Set` is rejected rather
/// than silently widening the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSelector {
    Any,
    Set(Vec<ModelRef>),
}

impl ModelSelector {
    pub fn accepts(&self, model: &ModelRef) -> bool {
        match self {
            ModelSelector::Any => true,
            ModelSelector::Set(models) => models.contains(model),
        }
    }
}
