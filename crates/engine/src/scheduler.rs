// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! The scheduler: owns the sheep registry and the job store, and
//! exposes the operations the API facade translates HTTP requests into.

use crate::commands::SheepCommand;
use crate::job_store::SharedJobStore;
use parking_lot::Mutex;
use shepherd_core::{
    JobId, JobRecord, JobState, ModelRef, SheepConfig, SheepId, SheepSnapshot, SheepStateKind,
    ShepherdError,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Notify};

/// Mutable per-sheep bookkeeping, guarded by a single coarse lock that is
/// only ever held for record mutation, never across I/O.
pub struct SheepRuntime {
    pub config: SheepConfig,
    pub state: SheepStateKind,
    pub loaded_model: Option<ModelRef>,
    pub queue: VecDeque<JobId>,
    pub in_flight: Option<JobId>,
}

impl SheepRuntime {
    fn new(config: SheepConfig) -> Self {
        Self {
            config,
            state: SheepStateKind::Idle,
            loaded_model: None,
            queue: VecDeque::new(),
            in_flight: None,
        }
    }

    fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

/// Everything the worker loop and the scheduler share for one sheep.
pub struct SheepCell {
    pub id: SheepId,
    pub runtime: Mutex<SheepRuntime>,
    /// Wakes the worker loop when the queue gains a job or an externally
    /// visible state change happened that it should reconsider.
    pub notify: Notify,
    pub commands: mpsc::Sender<SheepCommand>,
}

impl SheepCell {
    pub fn snapshot(&self) -> SheepSnapshot {
        let runtime = self.runtime.lock();
        SheepSnapshot {
            id: self.id.clone(),
            state: runtime.state,
            models: runtime.config.models.clone(),
            loaded_model: runtime.loaded_model.clone(),
            queue_len: runtime.queue_len(),
            current_job: runtime.in_flight.as_ref().map(|j| j.as_str().to_string()),
        }
    }
}

/// Owns every configured sheep and the job store; the sole entry point
/// the API facade drives.
pub struct Shepherd {
    sheep: HashMap<SheepId, Arc<SheepCell>>,
    job_store: SharedJobStore,
}

impl Shepherd {
    pub fn new(job_store: SharedJobStore) -> Self {
        Self {
            sheep: HashMap::new(),
            job_store,
        }
    }

    /// Register a sheep and return its shared cell and command receiver,
    /// so the caller can spawn the per-sheep worker loop task for it.
    pub fn register_sheep(
        &mut self,
        config: SheepConfig,
    ) -> (Arc<SheepCell>, mpsc::Receiver<SheepCommand>) {
        let id = config.id.clone();
        let (tx, rx) = mpsc::channel(1024);
        let cell = Arc::new(SheepCell {
            id: id.clone(),
            runtime: Mutex::new(SheepRuntime::new(config)),
            notify: Notify::new(),
            commands: tx,
        });
        self.sheep.insert(id, cell.clone());
        (cell, rx)
    }

    pub fn job_store(&self) -> &SharedJobStore {
        &self.job_store
    }

    fn get_sheep(&self, sheep_id: &SheepId) -> Result<&Arc<SheepCell>, ShepherdError> {
        self.sheep
            .get(sheep_id)
            .ok_or_else(|| ShepherdError::UnknownSheep(sheep_id.clone()))
    }

    /// Validate the target sheep and requested model, create the job
    /// record, and append it to the sheep's FIFO queue.
    pub fn enqueue(&self, record: JobRecord, now_ms: u64) -> Result<(), ShepherdError> {
        let cell = self.get_sheep(&record.sheep_id)?;
        {
            let runtime = cell.runtime.lock();
            if !runtime.config.models.accepts(&record.model) {
                return Err(ShepherdError::ApiClient(format!(
                    "sheep {} does not accept model {}/{}",
                    record.sheep_id, record.model.name, record.model.version
                )));
            }
            if runtime.queue_len() >= runtime.config.queue_depth {
                return Err(ShepherdError::ApiClient(format!(
                    "sheep {} queue is full",
                    record.sheep_id
                )));
            }
        }
        let job_id = record.job_id.clone();
        self.job_store.create(record)?;
        let _ = now_ms;
        cell.runtime.lock().queue.push_back(job_id);
        cell.notify.notify_one();
        Ok(())
    }

    pub async fn await_job(&self, id: &JobId, timeout: Option<Duration>) -> Result<JobState, ShepherdError> {
        self.job_store.await_job(id, timeout).await
    }

    pub fn status(&self) -> Vec<SheepSnapshot> {
        self.sheep.values().map(|cell| cell.snapshot()).collect()
    }

    /// Cancel a job by id: if still queued, the worker loop dequeues it
    /// and marks it `Cancelled`; if in-flight, the sheep is slaughtered.
    pub async fn cancel(&self, id: &JobId) -> Result<(), ShepherdError> {
        let record = self
            .job_store
            .lookup(id)
            .ok_or_else(|| ShepherdError::UnknownJob(id.clone()))?;
        if record.state.is_terminal() {
            return Ok(());
        }
        let cell = self.get_sheep(&record.sheep_id)?;
        let (tx, rx) = oneshot::channel();
        cell.commands
            .send(SheepCommand::CancelJob {
                job_id: id.clone(),
                respond_to: tx,
            })
            .await
            .map_err(|_| ShepherdError::internal("sheep worker loop is gone"))?;
        rx.await.map_err(|_| ShepherdError::internal("sheep worker loop dropped response"))?
    }

    pub async fn kill_sheep(&self, sheep_id: &SheepId) -> Result<(), ShepherdError> {
        let cell = self.get_sheep(sheep_id)?;
        let (tx, rx) = oneshot::channel();
        cell.commands
            .send(SheepCommand::KillSheep { respond_to: tx })
            .await
            .map_err(|_| ShepherdError::internal("sheep worker loop is gone"))?;
        rx.await.map_err(|_| ShepherdError::internal("sheep worker loop dropped response"))?
    }

    pub async fn reconfigure(&self, sheep_id: &SheepId, model: ModelRef) -> Result<(), ShepherdError> {
        let cell = self.get_sheep(sheep_id)?;
        if !cell.runtime.lock().config.models.accepts(&model) {
            return Err(ShepherdError::ApiClient(format!(
                "sheep {sheep_id} does not accept model {}/{}",
                model.name, model.version
            )));
        }
        let (tx, rx) = oneshot::channel();
        cell.commands
            .send(SheepCommand::Reconfigure {
                model,
                respond_to: tx,
            })
            .await
            .map_err(|_| ShepherdError::internal("sheep worker loop is gone"))?;
        rx.await.map_err(|_| ShepherdError::internal("sheep worker loop dropped response"))?
    }
}
