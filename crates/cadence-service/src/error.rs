use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use cadence_backend::error::BackendError;
use cadence_core::models::assignment::AssignmentStatus;
use cadence_schedule::answers::AnswerIssue;
use cadence_schedule::error::{ScheduleError, TrackerError};

/// Errors of the scheduler operations, independent of HTTP.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("assignment {id} is {status:?}")]
    AssignmentInactive { id: Uuid, status: AssignmentStatus },

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("backend session rejected")]
    Unauthorized,

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("backend error: {0}")]
    Backend(BackendError),
}

impl From<BackendError> for ServiceError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotFound { path } => ServiceError::NotFound(path),
            BackendError::Conflict { path } => ServiceError::Conflict(path),
            BackendError::Unauthorized => ServiceError::Unauthorized,
            other => ServiceError::Backend(other),
        }
    }
}

/// Unified API error type for all route handlers.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InvalidAnswers(Vec<AnswerIssue>),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
    /// The backend session is gone; retrying after a new login will work.
    Unavailable(String),
    /// The backend answered with something unusable, or not at all.
    BadGateway(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<AnswerIssue>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, issues) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::InvalidAnswers(issues) => (
                StatusCode::BAD_REQUEST,
                format!("{} invalid answer(s)", issues.len()),
                Some(issues),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unavailable(msg) => {
                tracing::warn!("backend unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend session unavailable".to_string(),
                    None,
                )
            }
            ApiError::BadGateway(msg) => {
                tracing::warn!("backend failure: {msg}");
                (StatusCode::BAD_GATEWAY, "backend request failed".to_string(), None)
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                issues,
            }),
        )
            .into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(path) => ApiError::NotFound(format!("not found: {path}")),
            e @ ServiceError::AssignmentInactive { .. } => ApiError::Conflict(e.to_string()),
            ServiceError::Conflict(path) => ApiError::Conflict(format!("conflicting write: {path}")),
            e @ ServiceError::Schedule(ScheduleError::InvalidSchedule { .. }) => {
                ApiError::BadRequest(e.to_string())
            }
            ServiceError::Tracker(TrackerError::InvalidAnswers(issues)) => {
                ApiError::InvalidAnswers(issues)
            }
            e @ ServiceError::Tracker(
                TrackerError::AlreadyCompleted { .. }
                | TrackerError::OccurrenceMissed { .. }
                | TrackerError::NotOverdue { .. },
            ) => ApiError::Conflict(e.to_string()),
            e @ ServiceError::Unauthorized => ApiError::Unavailable(e.to_string()),
            e @ ServiceError::Backend(_) => ApiError::BadGateway(e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
