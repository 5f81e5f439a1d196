// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Wraps a per-sheep worker loop so a bug in one sheep's task logs,
//! fails its in-flight job, and restarts the loop instead of taking the
//! dispatcher process down.
//!
//! `WorkerLoop::run` takes `&mut self` and otherwise never returns — it
//! loops until the process exits — so "supervising" it here means
//! catching an unwinding panic from inside that loop and calling `run`
//! again on the same, still-owned `WorkerLoop`, rather than rebuilding
//! one from scratch. `shepherd_engine::WorkerLoop<C>` is not
//! `UnwindSafe` (it holds `&mut`-like interior state across awaits),
//! hence the `AssertUnwindSafe`: a panic always means the loop's local
//! state (which sheep handle is live, restart backoff counters) is torn,
//! and `run` starts that local state over from scratch on its next call.

use futures_util::FutureExt;
use shepherd_core::{Clock, ErrorPayload, JobState, SheepId, SheepStateKind};
use shepherd_engine::{SharedJobStore, SheepCell, WorkerLoop};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::error;

/// Spawn `worker` under a panic guard. Returns immediately; the task runs
/// in the background for the lifetime of the process, restarting `worker`
/// each time its loop panics.
pub fn spawn_supervised<C: Clock>(
    sheep_id: SheepId,
    cell: Arc<SheepCell>,
    job_store: SharedJobStore,
    clock: C,
    mut worker: WorkerLoop<C>,
) {
    tokio::spawn(async move {
        loop {
            let outcome = AssertUnwindSafe(worker.run()).catch_unwind().await;
            let Err(_panic) = outcome else {
                // `run` never returns on the happy path; treat a normal
                // return as a deliberate stop rather than looping forever.
                break;
            };

            error!(sheep_id = %sheep_id, "worker loop panicked; failing its in-flight job and restarting");

            let in_flight = {
                let mut runtime = cell.runtime.lock();
                let job_id = runtime.in_flight.take();
                runtime.state = SheepStateKind::Idle;
                job_id
            };
            if let Some(job_id) = in_flight {
                let now = clock.epoch_ms();
                let error = ErrorPayload {
                    short_message: "sheep worker loop panicked".to_string(),
                    long_trace: "supervisor caught an unwinding panic while the job was in flight"
                        .to_string(),
                    exception_type: "Internal".to_string(),
                };
                let _ = job_store.mark_terminal(&job_id, JobState::Failed, Some(error), now);
            }
        }
    });
}
