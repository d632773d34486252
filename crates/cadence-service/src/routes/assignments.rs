use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use jiff::Timestamp;
use uuid::Uuid;

use cadence_core::models::assignment::{Assignment, NewAssignment};
use cadence_core::models::completion::Completion;
use cadence_core::models::user::Role;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub async fn create_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut new): Json<NewAssignment>,
) -> Result<(StatusCode, Json<Assignment>), ApiError> {
    user.require_staff()?;
    if user.role == Role::Psychologist && new.psychologist_id.is_none() {
        new.psychologist_id = user.user_id();
    }

    let assignment = state
        .scheduler
        .create_assignment(new, &user.sub, Timestamp::now())
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub async fn pause_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, ApiError> {
    user.require_staff()?;
    let assignment = state.scheduler.pause(id, &user.sub, Timestamp::now()).await?;
    Ok(Json(assignment))
}

pub async fn resume_assignment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Assignment>, ApiError> {
    user.require_staff()?;
    let assignment = state.scheduler.resume(id, &user.sub, Timestamp::now()).await?;
    Ok(Json(assignment))
}

/// Staff see any history; a patient only the history of their own assignment.
pub async fn list_completions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Completion>>, ApiError> {
    if !user.role.is_staff() {
        let assignment = state.scheduler.assignment(id).await?;
        if user.role != Role::Patient || user.user_id() != Some(assignment.patient_id) {
            return Err(ApiError::Forbidden(format!(
                "assignment {id} belongs to another patient"
            )));
        }
    }
    let completions = state.scheduler.assignment_completions(id).await?;
    Ok(Json(completions))
}
