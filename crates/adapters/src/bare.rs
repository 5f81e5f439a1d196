// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Bare-process sheep: a subprocess spawned directly by the daemon.

use crate::error::AdapterError;
use crate::sheep::{Sheep, SheepHandle};
use async_trait::async_trait;
use shepherd_core::SheepId;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tokio::process::Command;
use tokio::sync::watch;
use tracing::warn;

/// Configuration needed to spawn a bare-process sheep.
pub struct BareSheepConfig {
    pub sheep_id: SheepId,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

pub struct BareSheepAdapter {
    config: BareSheepConfig,
}

impl BareSheepAdapter {
    pub fn new(config: BareSheepConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Sheep for BareSheepAdapter {
    async fn start(&self) -> Result<SheepHandle, AdapterError> {
        let sheep_id = self.config.sheep_id.clone();

        // Open both redirect targets before spawning: a permission-denied
        // failure here must surface as a configuration error rather than
        // killing a half-started child.
        let stdout_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.stdout_path)
            .map_err(|e| AdapterError::Configuration {
                sheep_id: sheep_id.clone(),
                message: format!("cannot open stdout file {}: {e}", self.config.stdout_path.display()),
            })?;
        let stderr_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.stderr_path)
            .map_err(|e| AdapterError::Configuration {
                sheep_id: sheep_id.clone(),
                message: format!("cannot open stderr file {}: {e}", self.config.stderr_path.display()),
            })?;

        let mut command = Command::new(&self.config.command);
        command
            .args(&self.config.args)
            .envs(&self.config.env)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::from(stdout_file))
            .stderr(std::process::Stdio::from(stderr_file));
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| AdapterError::SpawnFailed {
            sheep_id: sheep_id.clone(),
            message: e.to_string(),
        })?;

        let (exited_tx, exited_rx) = watch::channel(false);
        let pid = child.id();

        let reaper_sheep_id = sheep_id.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => {
                    warn!(sheep_id = %reaper_sheep_id, %status, "bare sheep process exited");
                }
                Err(e) => {
                    warn!(sheep_id = %reaper_sheep_id, error = %e, "failed to wait on bare sheep process");
                }
            }
            let _ = exited_tx.send(true);
        });

        let stop_sheep_id = sheep_id.clone();
        let stopper = move || -> Result<(), AdapterError> {
            signal_pid(pid, "-TERM", stop_sheep_id)
        };
        let kill_sheep_id = sheep_id;
        let killer = move || -> Result<(), AdapterError> {
            signal_pid(pid, "-KILL", kill_sheep_id)
        };

        Ok(SheepHandle::new(exited_rx, stopper, killer))
    }
}

// SIGTERM/SIGKILL via the `kill` CLI: avoids pulling in a libc/nix
// dependency for a couple of syscalls the daemon rarely needs.
fn signal_pid(pid: Option<u32>, signal: &str, sheep_id: SheepId) -> Result<(), AdapterError> {
    let Some(pid) = pid else {
        return Ok(());
    };
    let status = std::process::Command::new("kill")
        .arg(signal)
        .arg(pid.to_string())
        .status();
    match status {
        Ok(_) => Ok(()),
        Err(e) => Err(AdapterError::SpawnFailed {
            sheep_id,
            message: format!("failed to signal process {pid}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_unwritable_stdout_path() {
        let config = BareSheepConfig {
            sheep_id: SheepId::new("s1"),
            command: "true".to_string(),
            args: vec![],
            env: HashMap::new(),
            working_dir: None,
            stdout_path: PathBuf::from("/no/such/directory/stdout.log"),
            stderr_path: PathBuf::from("/tmp/stderr.log"),
        };
        let adapter = BareSheepAdapter::new(config);
        let err = adapter.start().await.unwrap_err();
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[tokio::test]
    async fn spawns_and_exits_for_true() {
        let dir = tempfile::tempdir().unwrap();
        let config = BareSheepConfig {
            sheep_id: SheepId::new("s1"),
            command: "true".to_string(),
            args: vec![],
            env: HashMap::new(),
            working_dir: None,
            stdout_path: dir.path().join("out.log"),
            stderr_path: dir.path().join("err.log"),
        };
        let adapter = BareSheepAdapter::new(config);
        let handle = adapter.start().await.unwrap();
        handle.wait_for_exit().await;
        assert!(!handle.is_alive());
    }
}
