use axum::Json;
use axum::extract::State;
use jiff::Timestamp;

use cadence_core::models::user::Role;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::scheduler::SweepReport;
use crate::state::AppState;

/// Run one sweep now instead of waiting for the timer.
pub async fn run_sweep(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<SweepReport>, ApiError> {
    user.require_role(Role::Admin)?;
    let report = state.scheduler.sweep(Timestamp::now()).await?;
    Ok(Json(report))
}
