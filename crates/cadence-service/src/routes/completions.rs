use axum::Json;
use axum::extract::{Path, State};
use jiff::Timestamp;
use serde::Deserialize;
use uuid::Uuid;

use cadence_core::models::completion::{Answer, Completion};
use cadence_core::models::user::Role;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswers {
    pub answers: Vec<Answer>,
}

/// Patients may only act on their own occurrences.
async fn require_owner(state: &AppState, user: &AuthUser, id: Uuid) -> Result<(), ApiError> {
    user.require_role(Role::Patient)?;
    let completion = state.scheduler.completion(id).await?;
    if user.user_id() != Some(completion.patient_id) {
        return Err(ApiError::Forbidden(format!(
            "completion {id} belongs to another patient"
        )));
    }
    Ok(())
}

pub async fn submit_answers(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitAnswers>,
) -> Result<Json<Completion>, ApiError> {
    require_owner(&state, &user, id).await?;
    let completion = state
        .scheduler
        .submit_answers(id, body.answers, &user.sub, Timestamp::now())
        .await?;
    Ok(Json(completion))
}

pub async fn mark_sent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Completion>, ApiError> {
    require_owner(&state, &user, id).await?;
    let completion = state.scheduler.mark_sent(id, &user.sub).await?;
    Ok(Json(completion))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Completion>, ApiError> {
    user.require_staff()?;
    let completion = state.scheduler.mark_read(id, &user.sub).await?;
    Ok(Json(completion))
}
