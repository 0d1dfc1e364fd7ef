//! # Shipper Dashboard Endpoint
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/v1/dashboard/shipper` | `shipper_dashboard` |

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use cartage_core::DomainError;
use cartage_store::Role;

use crate::auth::CurrentActor;
use crate::error::AppError;
use crate::routes::outcome;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/dashboard/shipper", get(shipper_dashboard))
}

/// GET /v1/dashboard/shipper — new offers, in-progress missions, and
/// recent activity for the authenticated shipper.
async fn shipper_dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<impl IntoResponse, AppError> {
    if actor.role != Role::Shipper {
        return Err(DomainError::Forbidden(
            "the shipper dashboard requires a shipper account".to_string(),
        )
        .into());
    }
    Ok(outcome(
        "shipper dashboard",
        state.projector.shipper_dashboard(&actor.id),
    ))
}
