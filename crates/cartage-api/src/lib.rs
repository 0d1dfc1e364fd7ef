//! # cartage-api — HTTP Surface for the Mission Lifecycle
//!
//! Axum services over the lifecycle engine and dashboard projector.
//!
//! ## API surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/v1/missions/*` | [`routes::missions`] | Creation, pricing, bidding, selection, progress |
//! | `/v1/dashboard/*` | [`routes::dashboard`] | Shipper dashboard projections |
//! | `/health/*` | `lib.rs` | Liveness / readiness probes |
//!
//! All `/v1` routes require a bearer token resolved through the state's
//! identity provider; health probes are unauthenticated.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes are mounted outside the authenticated API so they remain
/// reachable without credentials.
pub fn app(state: AppState) -> Router {
    // Body size limit: 1 MiB. Mission payloads are small; anything larger
    // is rejected before deserialization.
    let api = Router::new()
        .merge(routes::missions::router())
        .merge(routes::dashboard::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(probes).merge(api)
}

/// Liveness probe: 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: verifies the stores answer and, when configured, that
/// the database connection is healthy. Returns 200 "ready" or 503 with a
/// diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.missions.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
