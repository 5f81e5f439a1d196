// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! On-disk configuration: the sheep-set and the ambient services
//! (HTTP bind address, storage endpoint) the daemon needs at startup.
//!
//! Loaded once from a TOML file at process start; reconfiguration of a
//! running sheep happens through the HTTP API, not by re-reading this
//! file.

use crate::ids::SheepId;
use crate::model::ModelSelector;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("sheep-set is empty, at least one sheep must be configured")]
    EmptySheepSet,

    #[error("duplicate sheep id in config: {0}")]
    DuplicateSheepId(SheepId),
}

/// Top-level daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    pub storage: StorageConfig,
    pub sheep: Vec<SheepConfig>,
}

impl Config {
    /// Parse and validate configuration from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = std::fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_ref.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path_ref.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sheep.is_empty() {
            return Err(ConfigError::EmptySheepSet);
        }
        let mut seen = HashMap::new();
        for sheep in &self.sheep {
            if seen.insert(sheep.id.clone(), ()).is_some() {
                return Err(ConfigError::DuplicateSheepId(sheep.id.clone()));
            }
        }
        Ok(())
    }
}

/// HTTP API facade bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// S3-compatible object store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub endpoint_url: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_max_retries() -> u32 {
    5
}

/// How a sheep's OS-level process is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheepKind {
    /// Run directly as a child process of the daemon.
    Bare {
        command: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        #[serde(default)]
        working_dir: Option<PathBuf>,
    },
    /// Run inside a container via the `docker` CLI.
    Docker {
        /// Registry prefix joined with `<model-name>:<version>` to form
        /// the image reference to pull.
        image_registry_prefix: String,
        #[serde(default)]
        env: HashMap<String, String>,
        /// `/dev/nvidiaN` device paths to map into the container.
        #[serde(default)]
        gpu_devices: Vec<String>,
    },
}

/// Configuration for a single sheep in the sheep-set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheepConfig {
    pub id: SheepId,
    /// ZeroMQ endpoint this sheep's dedicated ROUTER socket binds to,
    /// e.g. `tcp://127.0.0.1:5650`.
    pub endpoint: String,
    /// Shared-filesystem directory under which this sheep's per-job
    /// `<job_id>/inputs/` and `<job_id>/outputs/` subdirectories are
    /// materialized.
    pub io_root: PathBuf,
    #[serde(flatten)]
    pub kind: SheepKind,
    #[serde(default = "default_model_selector")]
    pub models: ModelSelector,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
}

fn default_model_selector() -> ModelSelector {
    ModelSelector::Any
}

fn default_queue_depth() -> usize {
    1024
}
