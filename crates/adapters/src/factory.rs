// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Builds the right `Sheep` implementation for a configured sheep's kind.
//! The engine never branches on `SheepKind` itself — it asks this module
//! once, at registration time, and holds the result behind the trait.

use crate::bare::{BareSheepAdapter, BareSheepConfig};
use crate::docker::{DockerSheepAdapter, DockerSheepConfig};
use crate::sheep::Sheep;
use shepherd_core::{ModelRef, SheepConfig, SheepKind};
use std::sync::Arc;

/// Construct the adapter for a sheep's configured kind, pinned to the
/// model it is about to be started with.
///
/// Bare sheep log to `<io_root>/_sheep.{stdout,stderr}.log`; Docker sheep
/// derive their image reference from `model` at start time, since the
/// registry prefix is fixed but the image tag tracks the loaded model.
pub fn build_sheep(config: &SheepConfig, model: &ModelRef) -> Arc<dyn Sheep> {
    match &config.kind {
        SheepKind::Bare { command, args, env, working_dir } => {
            Arc::new(BareSheepAdapter::new(BareSheepConfig {
                sheep_id: config.id.clone(),
                command: command.clone(),
                args: args.clone(),
                env: env.clone(),
                working_dir: working_dir.clone(),
                stdout_path: config.io_root.join("_sheep.stdout.log"),
                stderr_path: config.io_root.join("_sheep.stderr.log"),
            }))
        }
        SheepKind::Docker { image_registry_prefix, env, gpu_devices } => {
            Arc::new(DockerSheepAdapter::new(DockerSheepConfig {
                sheep_id: config.id.clone(),
                image_registry_prefix: image_registry_prefix.clone(),
                model_name: model.name.clone(),
                model_version: model.version.clone(),
                env: env.clone(),
                gpu_devices: gpu_devices.clone(),
                socket_endpoint: config.endpoint.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::{ModelSelector, SheepId};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn bare_config() -> SheepConfig {
        SheepConfig {
            id: SheepId::new("s1"),
            endpoint: "tcp://127.0.0.1:5650".into(),
            io_root: PathBuf::from("/tmp/shepherd/s1"),
            kind: SheepKind::Bare {
                command: "true".into(),
                args: vec![],
                env: HashMap::new(),
                working_dir: None,
            },
            models: ModelSelector::Any,
            queue_depth: 4,
        }
    }

    #[test]
    fn builds_bare_adapter_for_bare_kind() {
        let config = bare_config();
        let _sheep = build_sheep(&config, &ModelRef::new("m", "v1"));
    }

    #[test]
    fn builds_docker_adapter_for_docker_kind() {
        let mut config = bare_config();
        config.kind = SheepKind::Docker {
            image_registry_prefix: "registry.example.com".into(),
            env: HashMap::new(),
            gpu_devices: vec![],
        };
        let _sheep = build_sheep(&config, &ModelRef::new("m", "v1"));
    }
}
