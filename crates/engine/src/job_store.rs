// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! In-memory job-id -> job-record mapping plus per-job completion
//! signalling, per the recent-history bound.

use indexmap::IndexMap;
use parking_lot::Mutex;
use shepherd_core::{ErrorPayload, JobId, JobRecord, JobState, ShepherdError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const DEFAULT_RECENT_HISTORY_CAPACITY: usize = 1024;

struct Inner {
    records: IndexMap<JobId, JobRecord>,
    signals: HashMap<JobId, watch::Sender<JobState>>,
    capacity: usize,
}

/// Threadsafe store of job records and their completion signals.
///
/// `mark` is atomic with firing the job's completion signal: a watcher
/// that observes the new state via `await_job` is guaranteed the record
/// itself already reflects that state.
pub struct JobStore {
    inner: Mutex<Inner>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_HISTORY_CAPACITY)
    }
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                records: IndexMap::new(),
                signals: HashMap::new(),
                capacity,
            }),
        }
    }

    /// Insert a new job record. Fails `NameConflict` if the id is
    /// currently non-terminal (a terminal record with the same id may be
    /// overwritten: ids are only required unique among live jobs).
    pub fn create(&self, record: JobRecord) -> Result<(), ShepherdError> {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.records.get(&record.job_id) {
            if !existing.state.is_terminal() {
                return Err(ShepherdError::NameConflict(record.job_id.clone()));
            }
        }
        let (tx, _rx) = watch::channel(record.state);
        inner.signals.insert(record.job_id.clone(), tx);
        inner.records.insert(record.job_id.clone(), record);
        Ok(())
    }

    pub fn lookup(&self, id: &JobId) -> Option<JobRecord> {
        self.inner.lock().records.get(id).cloned()
    }

    /// Advance a job to a terminal state, recording its error payload (if
    /// any), and fire its completion signal. The result location is fixed
    /// at creation time (it's caller-supplied), so there is nothing else
    /// to record on success.
    pub fn mark_terminal(
        &self,
        id: &JobId,
        state: JobState,
        error: Option<ErrorPayload>,
        now_ms: u64,
    ) -> Result<(), ShepherdError> {
        debug_assert!(state.is_terminal());
        let mut inner = self.inner.lock();
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| ShepherdError::UnknownJob(id.clone()))?;
        record.state = state;
        record.error = error;
        record.updated_at_ms = now_ms;
        if let Some(tx) = inner.signals.get(id) {
            let _ = tx.send(state);
        }
        self.prune(&mut inner);
        Ok(())
    }

    /// Advance a job to a non-terminal state (`Accepted` or `Processing`).
    pub fn transition(&self, id: &JobId, state: JobState, now_ms: u64) -> Result<(), ShepherdError> {
        debug_assert!(!state.is_terminal());
        let mut inner = self.inner.lock();
        let record = inner
            .records
            .get_mut(id)
            .ok_or_else(|| ShepherdError::UnknownJob(id.clone()))?;
        record.state = state;
        record.updated_at_ms = now_ms;
        if let Some(tx) = inner.signals.get(id) {
            let _ = tx.send(state);
        }
        Ok(())
    }

    /// Suspend until the job's completion signal fires or `timeout`
    /// elapses. On success returns the job's terminal state; if the
    /// timeout elapses before the job reaches one, returns
    /// `WaitTimeout` rather than the job's current (necessarily
    /// non-terminal) state, so callers can never mistake a still-running
    /// job for one that finished.
    pub async fn await_job(&self, id: &JobId, timeout: Option<Duration>) -> Result<JobState, ShepherdError> {
        let mut rx = {
            let inner = self.inner.lock();
            if !inner.records.contains_key(id) {
                return Err(ShepherdError::UnknownJob(id.clone()));
            }
            inner
                .signals
                .get(id)
                .cloned()
                .ok_or_else(|| ShepherdError::UnknownJob(id.clone()))?
                .subscribe()
        };

        let wait = rx.wait_for(|state| state.is_terminal());
        match timeout {
            Some(duration) => {
                if tokio::time::timeout(duration, wait).await.is_err() {
                    return Err(ShepherdError::WaitTimeout(id.clone()));
                }
            }
            None => {
                let _ = wait.await;
            }
        }
        Ok(*rx.borrow())
    }

    pub fn recent(&self) -> Vec<JobRecord> {
        self.inner.lock().records.values().cloned().collect()
    }

    fn prune(&self, inner: &mut Inner) {
        while inner.records.len() > inner.capacity {
            let oldest_terminal = inner
                .records
                .iter()
                .filter(|(_, r)| r.state.is_terminal())
                .min_by_key(|(_, r)| r.updated_at_ms)
                .map(|(id, _)| id.clone());
            match oldest_terminal {
                Some(id) => {
                    inner.records.shift_remove(&id);
                    inner.signals.remove(&id);
                }
                None => break,
            }
        }
    }
}

pub type SharedJobStore = Arc<JobStore>;
