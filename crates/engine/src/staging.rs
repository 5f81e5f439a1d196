// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Filesystem staging of a job's input/output directories under a
//! sheep's I/O root. The scheduler is the sole creator/deleter of these
//! directories; the sheep process only ever reads `inputs/` and writes
//! `outputs/`.

use shepherd_core::{BlobRef, ShepherdError};
use shepherd_storage::Storage;
use std::path::{Path, PathBuf};
use tracing::warn;

pub fn job_dir(io_root: &Path, job_id: &str) -> PathBuf {
    io_root.join(job_id)
}

fn inputs_dir(job_dir: &Path) -> PathBuf {
    job_dir.join("inputs")
}

fn outputs_dir(job_dir: &Path) -> PathBuf {
    job_dir.join("outputs")
}

/// Fetch the job's payload from storage and write it to
/// `<job_dir>/inputs/payload`, creating `outputs/` alongside it.
pub async fn stage_input(
    storage: &dyn Storage,
    input: &BlobRef,
    job_dir: &Path,
) -> Result<(), ShepherdError> {
    let data = storage
        .get(input)
        .await
        .map_err(|e| ShepherdError::StorageInaccessible(e.to_string()))?;

    let inputs = inputs_dir(job_dir);
    let outputs = outputs_dir(job_dir);
    tokio::fs::create_dir_all(&inputs)
        .await
        .map_err(|e| ShepherdError::internal(format!("cannot create {}: {e}", inputs.display())))?;
    tokio::fs::create_dir_all(&outputs)
        .await
        .map_err(|e| ShepherdError::internal(format!("cannot create {}: {e}", outputs.display())))?;
    tokio::fs::write(inputs.join("payload"), &data)
        .await
        .map_err(|e| ShepherdError::internal(format!("cannot write payload: {e}")))?;
    Ok(())
}

/// Read the single output file named after the result key's basename and
/// upload it. Per the contract, a worker writes exactly one file the
/// scheduler cares about; extras are ignored, and a missing file fails
/// the job rather than silently uploading nothing.
pub async fn collect_and_upload_output(
    storage: &dyn Storage,
    result: &BlobRef,
    job_dir: &Path,
) -> Result<(), ShepherdError> {
    let basename = Path::new(&result.key)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| result.key.clone());
    let output_path = outputs_dir(job_dir).join(&basename);
    let data = tokio::fs::read(&output_path).await.map_err(|e| {
        ShepherdError::internal(format!(
            "expected output file {} not found: {e}",
            output_path.display()
        ))
    })?;
    storage
        .put(result, data.into())
        .await
        .map_err(|e| ShepherdError::StorageInaccessible(e.to_string()))
}

/// Best-effort recursive delete of a job's staging directory.
pub async fn delete_job_dir(job_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(job_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %job_dir.display(), error = %e, "failed to clean up job staging directory");
        }
    }
}
