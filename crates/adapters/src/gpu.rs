// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! GPU device enumeration and `/dev/nvidiaN` device-path parsing, used by
//! the Docker adapter to map device nodes into a sheep's container.

use std::path::Path;

/// Extract the integer N from a `/dev/nvidiaN` device path.
///
/// Rejects `/dev/nvidiactl` and any path that isn't a GPU device node.
pub fn extract_gpu_number(path: &str) -> Option<String> {
    let file_name = Path::new(path).file_name()?.to_str()?;
    let digits = file_name.strip_prefix("nvidia")?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(digits.to_string())
}

/// Number of GPUs visible to this process, per the dispatcher's own
/// enumeration order: `CUDA_VISIBLE_DEVICES`, then
/// `NVIDIA_VISIBLE_DEVICES` (unless it's `all`), then a `/dev` scan.
pub fn n_available_gpus() -> usize {
    if let Ok(value) = std::env::var("CUDA_VISIBLE_DEVICES") {
        return count_comma_separated(&value);
    }
    if let Ok(value) = std::env::var("NVIDIA_VISIBLE_DEVICES") {
        if value != "all" {
            return count_comma_separated(&value);
        }
    }
    scan_dev_for_gpus()
}

fn count_comma_separated(value: &str) -> usize {
    if value.is_empty() {
        0
    } else {
        value.split(',').count()
    }
}

fn scan_dev_for_gpus() -> usize {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| extract_gpu_number(&entry.path().display().to_string()).is_some())
        .count()
}
