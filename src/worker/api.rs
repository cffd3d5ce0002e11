//! HTTP API remote workers poll for jobs.
//!
//! Mounted under `/api/worker/v1`. Workers long-poll `POST /jobs` with the
//! job types they can handle, keep their lease alive with `GET
//! /jobs/{token}` (which doubles as a cancellation check) and report results
//! with `PATCH /jobs/{token}`. A 404 on the token routes means the lease is
//! gone: the job was canceled or reaped, and the worker should drop it.

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Error;
use crate::worker::WorkerServer;

#[derive(Clone)]
pub struct WorkerApiState {
    pub workers: WorkerServer,
    /// How long a single poll may block before the worker must retry.
    pub poll_timeout: Duration,
    /// Fired on shutdown to release parked pollers.
    pub shutdown: CancellationToken,
}

pub fn router(state: WorkerApiState) -> Router {
    Router::new()
        .route("/jobs", post(request_job_handler))
        .route(
            "/jobs/{token}",
            get(check_job_handler).patch(finish_job_handler),
        )
        .with_state(state)
}

#[derive(Deserialize)]
struct RequestJobBody {
    types: Vec<String>,
}

#[derive(Serialize)]
struct RequestJobResponse {
    id: Uuid,
    token: Uuid,
    #[serde(rename = "type")]
    job_type: String,
    args: Box<RawValue>,
    deps: Vec<Uuid>,
    dynamic_args: Vec<Box<RawValue>>,
}

#[derive(Serialize)]
struct CheckJobResponse {
    canceled: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn request_job_handler(
    State(state): State<WorkerApiState>,
    Json(body): Json<RequestJobBody>,
) -> impl IntoResponse {
    if body.types.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "at least one job type is required".to_string(),
            }),
        )
            .into_response();
    }

    let request = state.workers.request_job(&state.shutdown, &body.types);
    match tokio::time::timeout(state.poll_timeout, request).await {
        Ok(Ok(job)) => {
            tracing::info!(job_id = %job.id, job_type = %job.job_type, "Job leased to worker");
            (
                StatusCode::CREATED,
                Json(RequestJobResponse {
                    id: job.id,
                    token: job.token,
                    job_type: job.job_type,
                    args: job.args,
                    deps: job.deps,
                    dynamic_args: job.dynamic_args,
                }),
            )
                .into_response()
        }
        // Poll window elapsed or the service is shutting down; the worker
        // simply polls again.
        Ok(Err(Error::DequeueTimeout)) | Err(_) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(error)) => {
            tracing::error!(%error, "Dequeue failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn check_job_handler(
    State(state): State<WorkerApiState>,
    Path(token): Path<Uuid>,
) -> impl IntoResponse {
    match state.workers.check_job(token).await {
        Ok(canceled) => {
            state.workers.refresh_heartbeat(token).await;
            (StatusCode::OK, Json(CheckJobResponse { canceled })).into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn finish_job_handler(
    State(state): State<WorkerApiState>,
    Path(token): Path<Uuid>,
    Json(result): Json<Box<RawValue>>,
) -> impl IntoResponse {
    match state.workers.finish_job(token, &*result).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(Error::NotExist) => StatusCode::NOT_FOUND.into_response(),
        Err(error) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: error.to_string(),
            }),
        )
            .into_response(),
    }
}
