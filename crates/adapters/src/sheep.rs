// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! The `Sheep` capability trait: start and stop whatever OS-level process
//! or container backs a sheep, independent of how it was configured.

use crate::error::AdapterError;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;

/// A running sheep process/container. Dropping this does not stop it —
/// call `stop` explicitly so the scheduler can log and react to the
/// outcome.
pub struct SheepHandle {
    exited_rx: watch::Receiver<bool>,
    stopper: Box<dyn FnOnce() -> Result<(), AdapterError> + Send>,
    killer: Box<dyn FnOnce() -> Result<(), AdapterError> + Send>,
}

impl SheepHandle {
    /// `exited_rx` must report `true` once the underlying process/container
    /// has exited, by any means (clean stop, crash, or external kill) — a
    /// `watch` channel rather than `Notify` so a caller that starts waiting
    /// after the exit already happened still observes it.
    ///
    /// `stopper` requests a graceful exit (SIGTERM / `docker stop`);
    /// `killer` forces one immediately (SIGKILL / `docker kill`), used by
    /// `slaughter()`.
    pub fn new(
        exited_rx: watch::Receiver<bool>,
        stopper: impl FnOnce() -> Result<(), AdapterError> + Send + 'static,
        killer: impl FnOnce() -> Result<(), AdapterError> + Send + 'static,
    ) -> Self {
        Self {
            exited_rx,
            stopper: Box::new(stopper),
            killer: Box::new(killer),
        }
    }

    pub fn is_alive(&self) -> bool {
        !*self.exited_rx.borrow()
    }

    /// Resolves once the underlying process/container has exited, whether
    /// that exit was requested or not.
    pub async fn wait_for_exit(&self) {
        let mut rx = self.exited_rx.clone();
        let _ = rx.wait_for(|exited| *exited).await;
    }

    /// A standalone clone of the exit signal, for callers that need to
    /// watch it alongside other futures in a `select!` without holding a
    /// borrow of the handle (and whatever owns it) for the wait's
    /// duration.
    pub fn exit_signal(&self) -> watch::Receiver<bool> {
        self.exited_rx.clone()
    }

    /// Request a graceful stop. Does not wait for the process to actually
    /// exit; call `wait_for_exit` afterward with a timeout if that's needed.
    pub fn stop(self) -> Result<(), AdapterError> {
        (self.stopper)()
    }

    /// Force an immediate stop, bypassing the graceful shutdown sequence.
    /// Used by `Shepherd::kill_sheep`/`cancel` to enforce cancellation of an
    /// in-flight job without waiting on the worker to notice.
    pub fn slaughter(self) -> Result<(), AdapterError> {
        (self.killer)()
    }
}

/// How a sheep's process/container is started and stopped. One
/// implementation per `SheepKind`.
#[async_trait]
pub trait Sheep: Send + Sync + 'static {
    async fn start(&self) -> Result<SheepHandle, AdapterError>;

    /// How long to wait for a graceful stop before the scheduler should
    /// treat the sheep as crashed.
    fn stop_grace_period(&self) -> Duration {
        Duration::from_secs(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_reports_exit_after_send() {
        let (tx, rx) = watch::channel(false);
        let handle = SheepHandle::new(rx, || Ok(()), || Ok(()));
        assert!(handle.is_alive());

        tx.send(true).unwrap();
        handle.wait_for_exit().await;
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn wait_for_exit_observes_exit_that_already_happened() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let handle = SheepHandle::new(rx, || Ok(()), || Ok(()));
        handle.wait_for_exit().await;
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn stop_invokes_stopper() {
        let (_tx, rx) = watch::channel(false);
        let handle = SheepHandle::new(rx, || Ok(()), || Ok(()));
        assert!(handle.stop().is_ok());
    }

    #[tokio::test]
    async fn slaughter_invokes_killer() {
        let (_tx, rx) = watch::channel(false);
        let handle = SheepHandle::new(rx, || Ok(()), || Ok(()));
        assert!(handle.slaughter().is_ok());
    }
}
