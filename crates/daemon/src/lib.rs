// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The HTTP facade and process wiring for the Shepherd dispatcher.
//!
//! `shepherd-engine` owns the scheduling logic and has no idea HTTP
//! exists; everything in this crate is the thin layer translating
//! requests into `Shepherd` calls and booting the per-sheep worker tasks
//! at startup. `shepherdd` (`src/main.rs`) is the only binary that links
//! this crate in.

pub mod error;
pub mod http;
pub mod supervisor;
pub mod startup;

pub use error::DaemonError;
pub use startup::run;
