use super::state::AppState;
use crate::error::Error;
use crate::naming::format_elapsed;
use crate::session::SessionSnapshot;
use crate::upload::UploadReport;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub class_name: String,
    pub topic: String,
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub session_id: Uuid,
    pub artifact: PathBuf,
    pub elapsed_secs: f64,
    /// `MM:SS`
    pub elapsed: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub retryable: bool,
}

/// Core error rendered as a JSON response
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::InvalidTransition { .. } | Error::NoActiveCapture | Error::CommitInProgress => {
                StatusCode::CONFLICT
            }
            Error::DeviceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Error::ObjectStoreFailure { .. }
            | Error::IndexFailure { .. }
            | Error::HierarchyFailure { .. }
            | Error::FolderResolutionFailure { .. } => StatusCode::BAD_GATEWAY,
            Error::Artifact { .. } | Error::CommitAborted { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                retryable: self.0.is_retryable(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ============================================================================
// Handlers
// ============================================================================

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.controller.snapshot())
}

/// POST /session/start
pub async fn start(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    state.controller.start().await?;
    Ok(Json(state.controller.snapshot()))
}

/// POST /session/pause
pub async fn pause(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    state.controller.pause().await?;
    Ok(Json(state.controller.snapshot()))
}

/// POST /session/resume
pub async fn resume(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    state.controller.resume().await?;
    Ok(Json(state.controller.snapshot()))
}

/// POST /session/stop
pub async fn stop(State(state): State<AppState>) -> ApiResult<StopResponse> {
    let stopped = state.controller.stop().await?;
    Ok(Json(StopResponse {
        session_id: stopped.session_id,
        artifact: stopped.artifact,
        elapsed_secs: stopped.elapsed_active.as_secs_f64(),
        elapsed: format_elapsed(stopped.elapsed_active),
    }))
}

/// POST /session/upload
pub async fn upload(
    State(state): State<AppState>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<UploadReport> {
    info!("Upload requested: '{}' / '{}'", req.class_name, req.topic);
    let report = state
        .controller
        .begin_upload(&req.class_name, &req.topic)
        .await?;
    Ok(Json(report))
}

/// POST /session/discard
pub async fn discard(State(state): State<AppState>) -> ApiResult<SessionSnapshot> {
    state.controller.discard().await?;
    Ok(Json(state.controller.snapshot()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
