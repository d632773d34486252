//! cadence-service
//!
//! The runnable scheduler: a timer-driven sweep over assignments, the
//! completion submission path, and the HTTP surface in front of both.

pub mod audit;
pub mod config;
pub mod error;
pub mod locks;
pub mod middleware;
pub mod routes;
pub mod scheduler;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use state::AppState;

/// Build the HTTP router. `/health` is public; everything else requires a
/// bearer token.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/assignments", post(routes::assignments::create_assignment))
        .route(
            "/assignments/{id}/pause",
            post(routes::assignments::pause_assignment),
        )
        .route(
            "/assignments/{id}/resume",
            post(routes::assignments::resume_assignment),
        )
        .route(
            "/assignments/{id}/completions",
            get(routes::assignments::list_completions),
        )
        .route(
            "/completions/{id}/answers",
            post(routes::completions::submit_answers),
        )
        .route("/completions/{id}/sent", post(routes::completions::mark_sent))
        .route("/completions/{id}/read", post(routes::completions::mark_read))
        .route("/patients/{id}/stats", get(routes::patients::patient_stats))
        .route("/sweep", post(routes::sweep::run_sweep))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(protected)
        .layer(
            ServiceBuilder::new()
                .layer(cors)
                .layer(axum_mw::from_fn(middleware::audit::audit_log)),
        )
        .with_state(state)
}
