// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! A `Sheep` test double that starts instantly and exits only when told
//! to, for engine tests that would otherwise need a real subprocess.

use crate::error::AdapterError;
use crate::sheep::{Sheep, SheepHandle};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Clone, Default)]
pub struct FakeSheep {
    crash_on_start: Arc<Mutex<Option<String>>>,
    last_exited_tx: Arc<Mutex<Option<watch::Sender<bool>>>>,
}

impl FakeSheep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `start()` call fail with a configuration error.
    pub fn fail_next_start(&self, message: impl Into<String>) {
        *self.crash_on_start.lock() = Some(message.into());
    }

    /// Simulate the sheep process crashing out from under the scheduler.
    pub fn crash(&self) {
        if let Some(tx) = self.last_exited_tx.lock().as_ref() {
            let _ = tx.send(true);
        }
    }
}

#[async_trait]
impl Sheep for FakeSheep {
    async fn start(&self) -> Result<SheepHandle, AdapterError> {
        if let Some(message) = self.crash_on_start.lock().take() {
            return Err(AdapterError::Configuration {
                sheep_id: shepherd_core::SheepId::new("fake"),
                message,
            });
        }

        let (exited_tx, exited_rx) = watch::channel(false);
        *self.last_exited_tx.lock() = Some(exited_tx);

        Ok(SheepHandle::new(exited_rx, || Ok(()), || Ok(())))
    }
}
