// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Translates each HTTP route into a call against `Shepherd`.

use super::dto::{
    EmptyResponse, ModelOut, ReconfigureRequest, SheepStatusEntry, StartJobRequest, StatusResponse,
    WaitQuery, WaitResponse,
};
use super::error::ApiError;
use super::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use shepherd_core::{BlobRef, Clock, JobId, JobRecord, JobState, ModelRef, SheepId, SheepStateKind};
use std::collections::HashMap;
use std::time::Duration;

pub async fn start_job(
    State(state): State<AppState>,
    Json(req): Json<StartJobRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let job_id = JobId::parse(req.id)
        .map_err(|e| shepherd_core::ShepherdError::ApiClient(e.to_string()))?;
    let sheep_id = SheepId::new(req.sheep_id);
    let model: ModelRef = req.model.into();
    let input: BlobRef = req.payload.into();
    let result: BlobRef = req.result.into();
    let now_ms = state.clock.epoch_ms();

    let record = JobRecord::new(job_id, sheep_id, model, input, result, req.status_url, now_ms);
    state.shepherd.enqueue(record, now_ms)?;
    Ok(Json(EmptyResponse::default()))
}

pub async fn interrupt_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let job_id =
        JobId::parse(id).map_err(|e| shepherd_core::ShepherdError::ApiClient(e.to_string()))?;
    state.shepherd.cancel(&job_id).await?;
    Ok(Json(EmptyResponse::default()))
}

pub async fn reconfigure(
    State(state): State<AppState>,
    Path(sheep_id): Path<String>,
    Json(req): Json<ReconfigureRequest>,
) -> Result<Json<EmptyResponse>, ApiError> {
    let sheep_id = SheepId::new(sheep_id);
    let model: ModelRef = req.model.into();
    state.shepherd.reconfigure(&sheep_id, model).await?;
    Ok(Json(EmptyResponse::default()))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let sheep = state
        .shepherd
        .status()
        .into_iter()
        .map(|snapshot| {
            let running = !matches!(snapshot.state, SheepStateKind::Idle | SheepStateKind::Failed);
            let entry = SheepStatusEntry {
                running,
                model: snapshot.loaded_model.map(ModelOut::from),
                queue_length: snapshot.queue_len,
                in_flight: snapshot.current_job,
            };
            (snapshot.id.as_str().to_string(), entry)
        })
        .collect::<HashMap<_, _>>();
    Json(StatusResponse { sheep })
}

pub async fn wait_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WaitQuery>,
) -> Result<Json<WaitResponse>, ApiError> {
    let job_id =
        JobId::parse(id).map_err(|e| shepherd_core::ShepherdError::ApiClient(e.to_string()))?;
    let timeout = query.timeout.map(Duration::from_secs);
    let job_state = state.shepherd.await_job(&job_id, timeout).await?;

    let error = if job_state == JobState::Failed {
        state.shepherd.job_store().lookup(&job_id).and_then(|record| record.error)
    } else {
        None
    };

    Ok(Json(WaitResponse { state: job_state, error }))
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
