// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! The HTTP API facade: routes, request/response shapes, and the
//! `ShepherdError` -> status-code mapping. Nothing in here touches a
//! socket or a subprocess directly — every handler is a thin translation
//! into a `Shepherd` call.

pub mod dto;
pub mod error;
mod handlers;

use axum::routing::{get, post};
use axum::Router;
use shepherd_core::SystemClock;
use shepherd_engine::Shepherd;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler. Cheap to clone: `Shepherd` sits
/// behind an `Arc`, `SystemClock` is a zero-sized marker.
#[derive(Clone)]
pub struct AppState {
    pub shepherd: Arc<Shepherd>,
    pub clock: SystemClock,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start-job", post(handlers::start_job))
        .route("/interrupt-job/:id", post(handlers::interrupt_job))
        .route("/reconfigure/:sheep_id", post(handlers::reconfigure))
        .route("/status", get(handlers::status))
        .route("/jobs/:id/wait", get(handlers::wait_job))
        .route("/healthz", get(handlers::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
