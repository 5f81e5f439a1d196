// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Docker-backed sheep: a container launched and controlled through the
//! `docker` CLI rather than the Docker Engine HTTP API, matching how
//! the rest of this workspace shells out to external tools instead of
//! linking their client libraries.

use crate::error::AdapterError;
use crate::sheep::{Sheep, SheepHandle};
use async_trait::async_trait;
use shepherd_core::SheepId;
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::warn;

/// Configuration needed to spawn a Docker-backed sheep.
pub struct DockerSheepConfig {
    pub sheep_id: SheepId,
    pub image_registry_prefix: String,
    pub model_name: String,
    pub model_version: String,
    pub env: HashMap<String, String>,
    /// `/dev/nvidiaN` device paths to map into the container.
    pub gpu_devices: Vec<String>,
    pub socket_endpoint: String,
}

impl DockerSheepConfig {
    pub fn image_ref(&self) -> String {
        format!(
            "{}/{}:{}",
            self.image_registry_prefix.trim_end_matches('/'),
            self.model_name,
            self.model_version
        )
    }

    pub fn container_name(&self) -> String {
        format!("shepherd-{}", self.sheep_id)
    }
}

pub struct DockerSheepAdapter {
    config: DockerSheepConfig,
}

impl DockerSheepAdapter {
    pub fn new(config: DockerSheepConfig) -> Self {
        Self { config }
    }

    async fn pull_image(&self) -> Result<(), AdapterError> {
        run_docker(&["pull", &self.config.image_ref()])
            .await
            .map_err(|message| AdapterError::Configuration {
                sheep_id: self.config.sheep_id.clone(),
                message: format!("image pull failed: {message}"),
            })?;
        Ok(())
    }

    fn run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            self.config.container_name(),
        ];
        for device in &self.config.gpu_devices {
            args.push("--device".to_string());
            args.push(format!("{device}:{device}"));
        }
        for (key, value) in &self.config.env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push("-e".to_string());
        args.push(format!("SHEPHERD_ENDPOINT={}", self.config.socket_endpoint));
        args.push(self.config.image_ref());
        args
    }
}

#[async_trait]
impl Sheep for DockerSheepAdapter {
    async fn start(&self) -> Result<SheepHandle, AdapterError> {
        self.pull_image().await?;

        let args = self.run_args();
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let container_id = run_docker(&arg_refs)
            .await
            .map_err(|message| AdapterError::Configuration {
                sheep_id: self.config.sheep_id.clone(),
                message: format!("container start failed: {message}"),
            })?;

        let (exited_tx, exited_rx) = watch::channel(false);
        let container_name = self.config.container_name();
        let sheep_id = self.config.sheep_id.clone();

        let watcher_container = container_name.clone();
        let watcher_sheep_id = sheep_id.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                match container_running(&watcher_container).await {
                    Ok(true) => continue,
                    Ok(false) => {
                        warn!(sheep_id = %watcher_sheep_id, container = %watcher_container, "docker sheep container exited");
                        break;
                    }
                    Err(e) => {
                        warn!(sheep_id = %watcher_sheep_id, error = %e, "failed to poll docker container state");
                        break;
                    }
                }
            }
            let _ = exited_tx.send(true);
        });

        tracing::info!(sheep_id = %sheep_id, container_id = %container_id, "docker sheep container started");

        let stop_container = container_name.clone();
        let stop_sheep_id = sheep_id.clone();
        let stopper = move || -> Result<(), AdapterError> {
            run_docker_command("stop", &stop_container, stop_sheep_id)
        };
        let killer = move || -> Result<(), AdapterError> {
            run_docker_command("kill", &container_name, sheep_id)
        };

        Ok(SheepHandle::new(exited_rx, stopper, killer))
    }
}

fn run_docker_command(subcommand: &str, container_name: &str, sheep_id: SheepId) -> Result<(), AdapterError> {
    let status = std::process::Command::new("docker")
        .args([subcommand, container_name])
        .status();
    match status {
        Ok(s) if s.success() => Ok(()),
        Ok(s) => Err(AdapterError::SpawnFailed {
            sheep_id,
            message: format!("docker {subcommand} exited with {s}"),
        }),
        Err(e) => Err(AdapterError::SpawnFailed {
            sheep_id,
            message: format!("failed to exec docker {subcommand}: {e}"),
        }),
    }
}

async fn run_docker(args: &[&str]) -> Result<String, String> {
    let output = tokio::process::Command::new("docker")
        .args(args)
        .output()
        .await
        .map_err(|e| format!("failed to exec docker: {e}"))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(format!("docker {} failed: {}", args.first().unwrap_or(&""), stderr.trim()))
    }
}

async fn container_running(container_name: &str) -> Result<bool, String> {
    let state = run_docker(&["inspect", "-f", "{{.State.Running}}", container_name]).await?;
    Ok(state == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_ref_joins_prefix_name_version() {
        let config = DockerSheepConfig {
            sheep_id: SheepId::new("s1"),
            image_registry_prefix: "registry.example.com/models".to_string(),
            model_name: "resnet".to_string(),
            model_version: "v1".to_string(),
            env: HashMap::new(),
            gpu_devices: vec![],
            socket_endpoint: "tcp://127.0.0.1:5555".to_string(),
        };
        assert_eq!(
            config.image_ref(),
            "registry.example.com/models/resnet:v1"
        );
    }

    #[test]
    fn run_args_includes_mapped_gpu_devices() {
        let config = DockerSheepConfig {
            sheep_id: SheepId::new("s1"),
            image_registry_prefix: "registry.example.com".to_string(),
            model_name: "resnet".to_string(),
            model_version: "v1".to_string(),
            env: HashMap::new(),
            gpu_devices: vec!["/dev/nvidia0".to_string()],
            socket_endpoint: "tcp://127.0.0.1:5555".to_string(),
        };
        let adapter = DockerSheepAdapter::new(config);
        let args = adapter.run_args();
        assert!(args.iter().any(|a| a == "/dev/nvidia0:/dev/nvidia0"));
    }
}
