// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! The per-sheep worker loop: one cooperative task per sheep driving the
//! state machine of §4.2/§4.5 end to end — start, handshake, pop a job,
//! stage its input, send it, wait for the reply (or a crash), stage the
//! output back out, and loop.
//!
//! Out-of-band requests (cancel, kill, reconfigure) arrive on a bounded
//! command channel and are drained ahead of FIFO queue work every time
//! around the loop, so they always take priority over picking up the
//! next queued job.

use crate::callback;
use crate::commands::SheepCommand;
use crate::job_store::SharedJobStore;
use crate::scheduler::SheepCell;
use crate::staging;
use shepherd_adapters::{build_sheep, Sheep, SheepHandle};
use shepherd_core::{
    BlobRef, Clock, ErrorPayload, JobId, JobState, ModelRef, SheepConfig, SheepStateKind,
    ShepherdError,
};
use shepherd_protocol::{
    DonePayload, ErrorMessagePayload, IdentifyPayload, InputPayload, Listener, MessageHeader,
    OpCode, RoutingId,
};
use shepherd_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(120);
const RESTART_BACKOFF_INITIAL: Duration = Duration::from_secs(1);
const RESTART_BACKOFF_MAX: Duration = Duration::from_secs(30);

fn restart_backoff(attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    RESTART_BACKOFF_INITIAL.saturating_mul(factor).min(RESTART_BACKOFF_MAX)
}

/// What a sheep is currently doing, held locally by the worker loop task.
/// Not shared with other tasks — only `SheepCell::runtime`'s
/// `SheepStateKind`/`loaded_model` are externally visible, via `/status`.
struct Live {
    handle: SheepHandle,
    routing_id: RoutingId,
}

type SheepFactory = Arc<dyn Fn(&SheepConfig, &ModelRef) -> Arc<dyn Sheep> + Send + Sync>;

pub struct WorkerLoop<C: Clock> {
    cell: Arc<SheepCell>,
    job_store: SharedJobStore,
    storage: Arc<dyn Storage>,
    listener: Listener,
    commands: mpsc::Receiver<SheepCommand>,
    http: reqwest::Client,
    clock: C,
    sheep_factory: SheepFactory,
    handshake_timeout: Duration,
    heartbeat_timeout: Duration,
}

impl<C: Clock> WorkerLoop<C> {
    /// `sheep_factory` builds the `Sheep` implementation to start for a
    /// given config/model pair. Production callers pass
    /// `shepherd_adapters::build_sheep`; tests inject one that returns a
    /// `FakeSheep`, since `Sheep` is a trait object and this is the one
    /// place the worker loop needs to construct a concrete instance.
    pub fn new(
        cell: Arc<SheepCell>,
        job_store: SharedJobStore,
        storage: Arc<dyn Storage>,
        listener: Listener,
        commands: mpsc::Receiver<SheepCommand>,
        http: reqwest::Client,
        clock: C,
        sheep_factory: SheepFactory,
    ) -> Self {
        Self {
            cell,
            job_store,
            storage,
            listener,
            commands,
            http,
            clock,
            sheep_factory,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
        }
    }

    /// Convenience constructor for production use, wiring in the real
    /// process/container factory.
    pub fn with_default_factory(
        cell: Arc<SheepCell>,
        job_store: SharedJobStore,
        storage: Arc<dyn Storage>,
        listener: Listener,
        commands: mpsc::Receiver<SheepCommand>,
        http: reqwest::Client,
        clock: C,
    ) -> Self {
        Self::new(cell, job_store, storage, listener, commands, http, clock, Arc::new(build_sheep))
    }

    /// Runs until the process shuts down. Never returns `Err`: an
    /// unhandled failure inside a single iteration is logged and the loop
    /// continues, matching the top-level supervisor described in §7 —
    /// a bug in one sheep's loop must not kill the dispatcher.
    ///
    /// Takes `&mut self` rather than consuming it so a supervisor can
    /// hold the loop across a caught panic and call `run` again without
    /// losing the listener/command-channel ownership that a by-value
    /// `self` would have dropped with the unwound stack frame.
    pub async fn run(&mut self) {
        let mut live: Option<Live> = None;
        let mut restart_attempt: u32 = 0;

        loop {
            self.drain_commands(&mut live).await;

            let next = {
                let mut runtime = self.cell.runtime.lock();
                if runtime.state == SheepStateKind::Ready {
                    runtime.queue.pop_front()
                } else {
                    None
                }
            };

            let Some(job_id) = next else {
                tokio::select! {
                    Some(cmd) = self.commands.recv() => self.apply_command(cmd, &mut live).await,
                    () = self.cell.notify.notified() => {}
                }
                continue;
            };

            self.process_job(job_id, &mut live, &mut restart_attempt).await;
        }
    }

    async fn drain_commands(&mut self, live: &mut Option<Live>) {
        while let Ok(cmd) = self.commands.try_recv() {
            self.apply_command(cmd, live).await;
        }
    }

    async fn apply_command(&mut self, cmd: SheepCommand, live: &mut Option<Live>) {
        match cmd {
            SheepCommand::CancelJob { job_id, respond_to } => {
                let result = self.cancel_job(&job_id, live).await;
                let _ = respond_to.send(result);
            }
            SheepCommand::KillSheep { respond_to } => {
                let result = self.kill_sheep(live).await;
                let _ = respond_to.send(result);
            }
            SheepCommand::Reconfigure { model, respond_to } => {
                let result = self.reconfigure(model, live).await;
                let _ = respond_to.send(result);
            }
        }
    }

    async fn cancel_job(&mut self, job_id: &JobId, live: &mut Option<Live>) -> Result<(), ShepherdError> {
        let was_in_flight = {
            let mut runtime = self.cell.runtime.lock();
            if let Some(pos) = runtime.queue.iter().position(|id| id == job_id) {
                runtime.queue.remove(pos);
                false
            } else {
                runtime.in_flight.as_ref() == Some(job_id)
            }
        };

        let now = self.clock.epoch_ms();
        self.job_store.mark_terminal(job_id, JobState::Cancelled, None, now).ok();

        if was_in_flight {
            self.slaughter_and_restart(live).await;
        }
        Ok(())
    }

    async fn kill_sheep(&mut self, live: &mut Option<Live>) -> Result<(), ShepherdError> {
        let in_flight = self.cell.runtime.lock().in_flight.clone();
        if let Some(job_id) = in_flight {
            let now = self.clock.epoch_ms();
            self.job_store.mark_terminal(&job_id, JobState::Cancelled, None, now).ok();
        }
        self.slaughter_and_restart(live).await;
        Ok(())
    }

    /// Slaughter whatever is currently running and drop it to `Idle`.
    /// Does not restart — the next turn of `run` will call
    /// `ensure_configured` again once there's a job to process, mirroring
    /// `Failed -> Idle -> Starting` from the state diagram.
    async fn slaughter_and_restart(&mut self, live: &mut Option<Live>) {
        let mut runtime = self.cell.runtime.lock();
        runtime.state = SheepStateKind::Failed;
        runtime.in_flight = None;
        drop(runtime);

        if let Some(Live { handle, .. }) = live.take() {
            if let Err(e) = handle.slaughter() {
                warn!(sheep_id = %self.cell.id, error = %e, "slaughter failed");
            }
        }

        self.cell.runtime.lock().state = SheepStateKind::Idle;
    }

    async fn reconfigure(&mut self, model: ModelRef, live: &mut Option<Live>) -> Result<(), ShepherdError> {
        let mut attempt = 0;
        self.ensure_configured(&model, live, &mut attempt).await
    }

    /// Ensure the sheep is Ready with `model` loaded, (re)starting it if
    /// necessary. A no-op if it already is — `reconfigure` on an
    /// already-matching pair must not restart the subprocess.
    async fn ensure_configured(
        &mut self,
        model: &ModelRef,
        live: &mut Option<Live>,
        restart_attempt: &mut u32,
    ) -> Result<(), ShepherdError> {
        {
            let runtime = self.cell.runtime.lock();
            if runtime.state == SheepStateKind::Ready && runtime.loaded_model.as_ref() == Some(model) {
                return Ok(());
            }
        }

        if live.is_some() {
            self.stop_current(live).await;
        }

        self.cell.runtime.lock().state = SheepStateKind::Starting;
        let config = self.cell.runtime.lock().config.clone();
        let adapter = (self.sheep_factory)(&config, model);

        let handle = adapter.start().await.map_err(|e| {
            self.cell.runtime.lock().state = SheepStateKind::Failed;
            ShepherdError::SheepConfiguration {
                sheep_id: self.cell.id.clone(),
                message: e.to_string(),
            }
        })?;

        let routing_id = match self.await_handshake().await {
            Ok(id) => id,
            Err(e) => {
                self.cell.runtime.lock().state = SheepStateKind::Failed;
                let _ = handle.slaughter();
                return Err(e);
            }
        };

        *live = Some(Live { handle, routing_id });
        let mut runtime = self.cell.runtime.lock();
        runtime.state = SheepStateKind::Ready;
        runtime.loaded_model = Some(model.clone());
        *restart_attempt = 0;
        Ok(())
    }

    async fn await_handshake(&mut self) -> Result<RoutingId, ShepherdError> {
        let deadline = tokio::time::timeout(self.handshake_timeout, async {
            loop {
                let (routing_id, message) = self
                    .listener
                    .recv()
                    .await
                    .map_err(|e| ShepherdError::internal(e.to_string()))?;
                if message.header.opcode != OpCode::Identify {
                    warn!(sheep_id = %self.cell.id, "dropped non-identify message before handshake");
                    continue;
                }
                match serde_json::from_slice::<IdentifyPayload>(&message.payload) {
                    Ok(identify) => {
                        info!(sheep_id = %self.cell.id, peer = %identify.sheep_id, gpus = identify.available_gpus, "sheep handshake complete");
                        return Ok(routing_id);
                    }
                    Err(e) => {
                        warn!(sheep_id = %self.cell.id, error = %e, "malformed identify payload, dropping");
                    }
                }
            }
        });

        match deadline.await {
            Ok(result) => result,
            Err(_) => Err(ShepherdError::SheepConfiguration {
                sheep_id: self.cell.id.clone(),
                message: "handshake timed out".to_string(),
            }),
        }
    }

    async fn stop_current(&mut self, live: &mut Option<Live>) {
        self.cell.runtime.lock().state = SheepStateKind::Stopping;
        if let Some(Live { handle, .. }) = live.take() {
            if let Err(e) = handle.stop() {
                warn!(sheep_id = %self.cell.id, error = %e, "graceful stop failed");
            }
        }
        self.cell.runtime.lock().state = SheepStateKind::Idle;
    }

    async fn process_job(&mut self, job_id: JobId, live: &mut Option<Live>, restart_attempt: &mut u32) {
        let now = self.clock.epoch_ms();
        if self.job_store.transition(&job_id, JobState::Accepted, now).is_err() {
            return;
        }
        let Some(record) = self.job_store.lookup(&job_id) else { return };

        if let Err(e) = self.ensure_configured(&record.model, live, restart_attempt).await {
            self.fail_job(
                &job_id,
                ErrorPayload {
                    short_message: "sheep configuration failed".to_string(),
                    long_trace: e.to_string(),
                    exception_type: "SheepConfiguration".to_string(),
                },
            )
            .await;
            return;
        }

        {
            let mut runtime = self.cell.runtime.lock();
            runtime.in_flight = Some(job_id.clone());
            runtime.state = SheepStateKind::Busy;
        }

        let job_dir = {
            let runtime = self.cell.runtime.lock();
            staging::job_dir(&runtime.config.io_root, job_id.as_str())
        };

        if let Err(e) = staging::stage_input(self.storage.as_ref(), &record.input, &job_dir).await {
            self.fail_job(
                &job_id,
                ErrorPayload {
                    short_message: "failed to stage job input".to_string(),
                    long_trace: e.to_string(),
                    exception_type: "StorageInaccessible".to_string(),
                },
            )
            .await;
            self.release_in_flight();
            return;
        }

        let now = self.clock.epoch_ms();
        self.job_store.transition(&job_id, JobState::Processing, now).ok();

        let Some(Live { routing_id, .. }) = live.as_ref() else {
            self.fail_job(
                &job_id,
                ErrorPayload {
                    short_message: "sheep not connected".to_string(),
                    long_trace: "no routing id after configure".to_string(),
                    exception_type: "Internal".to_string(),
                },
            )
            .await;
            staging::delete_job_dir(&job_dir).await;
            self.release_in_flight();
            return;
        };
        let routing_id = routing_id.clone();

        let payload = match serde_json::to_vec(&InputPayload { io_data_root: job_dir.display().to_string() }) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.fail_job(&job_id, internal_error("failed to encode input message", e)).await;
                staging::delete_job_dir(&job_dir).await;
                self.release_in_flight();
                return;
            }
        };
        let header = MessageHeader { opcode: OpCode::Input, job_id: Some(job_id.clone()) };
        if let Err(e) = self.listener.send(&routing_id, header, payload).await {
            warn!(sheep_id = %self.cell.id, job_id = %job_id, error = %e, "failed to send input message, treating as crash");
            self.handle_crash(&job_id, live, restart_attempt).await;
            staging::delete_job_dir(&job_dir).await;
            return;
        }

        self.await_reply(&job_id, &record.result, &record.status_url, &job_dir, live, restart_attempt).await;

        staging::delete_job_dir(&job_dir).await;
        self.release_in_flight();
    }

    /// Clear `in_flight` and drop back to `Ready` — but only if still
    /// `Busy`: the crash path already moved the state machine through
    /// `Failed -> Idle -> Starting` by the time this might run.
    fn release_in_flight(&self) {
        let mut runtime = self.cell.runtime.lock();
        runtime.in_flight = None;
        if runtime.state == SheepStateKind::Busy {
            runtime.state = SheepStateKind::Ready;
        }
    }

    async fn await_reply(
        &mut self,
        job_id: &JobId,
        result: &BlobRef,
        status_url: &Option<String>,
        job_dir: &std::path::Path,
        live: &mut Option<Live>,
        restart_attempt: &mut u32,
    ) {
        loop {
            let recv = self.listener.recv();
            // Clone the exit signal rather than holding `handle` itself
            // across the select: the commands arm below needs `live`
            // mutably (to let a mid-flight cancel/kill slaughter and
            // clear it), which would conflict with an outstanding
            // `live.as_ref()` borrow held for the whole select.
            let Some(mut exited_rx) = live.as_ref().map(|l| l.handle.exit_signal()) else { return };

            tokio::select! {
                Some(cmd) = self.commands.recv() => {
                    // Cancel/kill arriving while we're blocked here must
                    // not wait for the heartbeat: service it immediately
                    // so `cancel(job)`'s slaughter-based enforcement (§5)
                    // takes effect mid-flight instead of after the fact.
                    self.apply_command(cmd, live).await;
                }
                _ = exited_rx.wait_for(|exited| *exited) => {
                    warn!(sheep_id = %self.cell.id, job_id = %job_id, "sheep process exited while job in flight");
                    self.fail_job(job_id, ErrorPayload {
                        short_message: "sheep crashed".to_string(),
                        long_trace: "subprocess/container exited unexpectedly".to_string(),
                        exception_type: "SheepCrashed".to_string(),
                    }).await;
                    if let Some(url) = status_url {
                        callback::notify_failed(&self.http, url, "sheep crashed".to_string()).await;
                    }
                    self.handle_crash(job_id, live, restart_attempt).await;
                    return;
                }
                outcome = tokio::time::timeout(self.heartbeat_timeout, recv) => {
                    let Ok(received) = outcome else {
                        warn!(sheep_id = %self.cell.id, job_id = %job_id, "heartbeat timeout waiting for sheep reply");
                        self.fail_job(job_id, ErrorPayload {
                            short_message: "sheep crashed".to_string(),
                            long_trace: "no reply within heartbeat timeout".to_string(),
                            exception_type: "SheepCrashed".to_string(),
                        }).await;
                        if let Some(url) = status_url {
                            callback::notify_failed(&self.http, url, "heartbeat timeout".to_string()).await;
                        }
                        self.handle_crash(job_id, live, restart_attempt).await;
                        return;
                    };

                    let message = match received {
                        Ok((_routing_id, message)) => message,
                        Err(e) => {
                            warn!(sheep_id = %self.cell.id, error = %e, "transport error awaiting reply");
                            continue;
                        }
                    };

                    if message.header.job_id.as_ref() != Some(job_id) {
                        warn!(sheep_id = %self.cell.id, "dropped reply for stale or mismatched job id");
                        continue;
                    }

                    match message.header.opcode {
                        OpCode::Done => {
                            let _ = serde_json::from_slice::<DonePayload>(&message.payload);
                            match staging::collect_and_upload_output(self.storage.as_ref(), result, job_dir).await {
                                Ok(()) => {
                                    let now = self.clock.epoch_ms();
                                    self.job_store.mark_terminal(job_id, JobState::Done, None, now).ok();
                                    if let Some(url) = status_url {
                                        callback::notify_done(&self.http, url).await;
                                    }
                                }
                                Err(e) => {
                                    self.fail_job(job_id, internal_error("failed to upload job output", e)).await;
                                    if let Some(url) = status_url {
                                        callback::notify_failed(&self.http, url, "failed to upload output".to_string()).await;
                                    }
                                }
                            }
                            return;
                        }
                        OpCode::Error => {
                            let error = match serde_json::from_slice::<ErrorMessagePayload>(&message.payload) {
                                Ok(payload) => ErrorPayload {
                                    short_message: payload.short_message,
                                    long_trace: payload.long_trace,
                                    exception_type: payload.exception_type,
                                },
                                Err(e) => internal_error("malformed error message", e),
                            };
                            if let Some(url) = status_url {
                                callback::notify_failed(&self.http, url, error.short_message.clone()).await;
                            }
                            self.fail_job(job_id, error).await;
                            return;
                        }
                        OpCode::Identify | OpCode::Input => {
                            warn!(sheep_id = %self.cell.id, "unexpected opcode while awaiting job reply, dropping");
                            continue;
                        }
                    }
                }
            }
        }
    }

    /// A sheep crashed mid-job: drop it to `Idle` then attempt exactly one
    /// restart with doubling backoff, per §4.5 step 6. The job itself was
    /// already failed by the caller before this runs.
    async fn handle_crash(&mut self, _job_id: &JobId, live: &mut Option<Live>, restart_attempt: &mut u32) {
        let mut runtime = self.cell.runtime.lock();
        runtime.state = SheepStateKind::Failed;
        runtime.in_flight = None;
        let model = runtime.loaded_model.clone();
        drop(runtime);

        if let Some(Live { handle, .. }) = live.take() {
            let _ = handle.slaughter();
        }
        self.cell.runtime.lock().state = SheepStateKind::Idle;

        let Some(model) = model else { return };

        let delay = restart_backoff(*restart_attempt);
        *restart_attempt += 1;
        tokio::time::sleep(delay).await;

        if let Err(e) = self.ensure_configured(&model, live, restart_attempt).await {
            warn!(sheep_id = %self.cell.id, error = %e, "restart after crash failed");
        }
    }

    async fn fail_job(&self, job_id: &JobId, error: ErrorPayload) {
        let now = self.clock.epoch_ms();
        self.job_store.mark_terminal(job_id, JobState::Failed, Some(error), now).ok();
    }
}

fn internal_error(message: &str, source: impl std::fmt::Display) -> ErrorPayload {
    ErrorPayload {
        short_message: message.to_string(),
        long_trace: source.to_string(),
        exception_type: "Internal".to_string(),
    }
}
