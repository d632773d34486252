use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use cadence_core::models::stats::CompletionStats;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub async fn patient_stats(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CompletionStats>, ApiError> {
    user.require_staff()?;
    let stats = state.scheduler.patient_stats(id).await?;
    Ok(Json(stats))
}
