// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Shepherd contributors

//! Maps `ShepherdError` onto HTTP status codes.
//!
//! Neither `axum::response::IntoResponse` nor `ShepherdError` lives in
//! this crate, so a direct `impl IntoResponse for ShepherdError` would
//! violate the orphan rule; `ApiError` is the local newtype that carries
//! the mapping instead. Handlers return `Result<_, ApiError>` and `?`
//! converts any `ShepherdError` via `From`.

use super::dto::ErrorBody;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shepherd_core::ShepherdError;
use tracing::error;

pub struct ApiError(pub ShepherdError);

impl From<ShepherdError> for ApiError {
    fn from(err: ShepherdError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ShepherdError::ApiClient(_) => StatusCode::BAD_REQUEST,
            ShepherdError::UnknownSheep(_) | ShepherdError::UnknownJob(_) => StatusCode::NOT_FOUND,
            ShepherdError::NameConflict(_) => StatusCode::CONFLICT,
            ShepherdError::StorageInaccessible(_) | ShepherdError::SheepConfiguration { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // A worker-side outcome surfaced through a request that raced
            // with it (e.g. polling status mid-crash); not a facade bug.
            ShepherdError::SheepCrashed { .. } | ShepherdError::JobFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // The job simply hasn't finished yet; the poller is expected
            // to retry, same as any other request-timeout outcome.
            ShepherdError::WaitTimeout(_) => StatusCode::REQUEST_TIMEOUT,
            ShepherdError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %self.0, "internal error serving request");
        }

        (status, Json(ErrorBody { message: self.0.to_string() })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shepherd_core::{JobId, SheepId};

    #[test]
    fn unknown_sheep_maps_to_404() {
        let resp = ApiError::from(ShepherdError::UnknownSheep(SheepId::new("s1"))).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn name_conflict_maps_to_409() {
        let resp = ApiError::from(ShepherdError::NameConflict(JobId::parse("j1").unwrap())).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_job_maps_to_404() {
        let resp = ApiError::from(ShepherdError::UnknownJob(JobId::parse("j1").unwrap())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn api_client_maps_to_400() {
        let resp = ApiError::from(ShepherdError::ApiClient("bad".into())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_maps_to_500() {
        let resp = ApiError::from(ShepherdError::internal("boom")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn wait_timeout_maps_to_408() {
        let resp =
            ApiError::from(ShepherdError::WaitTimeout(JobId::parse("j1").unwrap())).into_response();
        assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
