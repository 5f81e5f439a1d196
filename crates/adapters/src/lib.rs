// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! OS-level process adapters for running a sheep, one per `SheepKind`.
//!
//! Nothing here knows about jobs or the control protocol — that lives in
//! `shepherd-engine`. This crate only answers "how do I start, stop, and
//! check the liveness of the process or container behind a sheep".

pub mod bare;
pub mod docker;
pub mod error;
pub mod factory;
pub mod gpu;
pub mod sheep;

pub use error::AdapterError;
pub use factory::build_sheep;
pub use sheep::{Sheep, SheepHandle};

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSheep;
