//! # Mission Lifecycle Endpoints
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/v1/missions` | `create_mission` |
//! | `GET` | `/v1/missions/available` | `available_missions` |
//! | `GET` | `/v1/missions/mine` | `my_missions` |
//! | `GET` | `/v1/missions/:id` | `get_mission` |
//! | `PUT` | `/v1/missions/:id/price` | `set_price` |
//! | `POST` | `/v1/missions/:id/confirm` | `confirm_mission` |
//! | `POST` | `/v1/missions/:id/acceptances` | `submit_acceptance` |
//! | `GET` | `/v1/missions/:id/acceptances` | `list_acceptances` |
//! | `POST` | `/v1/missions/:id/accept` | `accept_mission` |
//! | `POST` | `/v1/missions/:id/select-carrier` | `select_carrier` |
//! | `POST` | `/v1/missions/:id/status` | `advance_status` |
//! | `POST` | `/v1/missions/:id/cancel` | `cancel_mission` |
//! | `POST` | `/v1/missions/:id/dispute` | `dispute_mission` |
//!
//! Every write handler mutates the in-memory stores through the engine
//! first, then mirrors the committed result to Postgres when a pool is
//! configured. The carrier-binding handlers additionally run the durable
//! guard (conditional update / unique constraint) so a second instance
//! sharing the database cannot double-assign.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use cartage_core::{DomainError, MissionEvent, MissionId, Money, UserId};
use cartage_engine::MissionDraft;
use cartage_store::Mission;

use crate::auth::CurrentActor;
use crate::db;
use crate::error::AppError;
use crate::routes::outcome;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetPriceRequest {
    /// New shipper-facing final price, in major units (euros).
    pub new_price: Money,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SubmitAcceptanceRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectCarrierRequest {
    pub carrier_id: UserId,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvanceStatusRequest {
    /// Lifecycle event, e.g. `"CONFIRM_PICKUP"`.
    pub event: MissionEvent,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/missions", post(create_mission))
        .route("/v1/missions/available", get(available_missions))
        .route("/v1/missions/mine", get(my_missions))
        .route("/v1/missions/:id", get(get_mission))
        .route("/v1/missions/:id/price", put(set_price))
        .route("/v1/missions/:id/confirm", post(confirm_mission))
        .route(
            "/v1/missions/:id/acceptances",
            post(submit_acceptance).get(list_acceptances),
        )
        .route("/v1/missions/:id/accept", post(accept_mission))
        .route("/v1/missions/:id/select-carrier", post(select_carrier))
        .route("/v1/missions/:id/status", post(advance_status))
        .route("/v1/missions/:id/cancel", post(cancel_mission))
        .route("/v1/missions/:id/dispute", post(dispute_mission))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/missions — create a mission owned by the authenticated shipper.
async fn create_mission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(draft): Json<MissionDraft>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.create_mission(draft, actor.id)?;
    persist_mission(&state, &mission).await?;
    Ok((StatusCode::CREATED, outcome("mission created", mission)))
}

/// GET /v1/missions/available — missions open to carriers, newest first.
async fn available_missions(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
) -> Result<impl IntoResponse, AppError> {
    Ok(outcome(
        "available missions",
        state.engine.available_missions(),
    ))
}

/// GET /v1/missions/mine — the actor's missions, by their role.
async fn my_missions(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> Result<impl IntoResponse, AppError> {
    Ok(outcome(
        "my missions",
        state.engine.my_missions(actor.id, actor.role),
    ))
}

/// GET /v1/missions/:id — one mission with party summaries.
async fn get_mission(
    State(state): State<AppState>,
    CurrentActor(_actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(outcome("mission", state.engine.get_mission(id)?))
}

/// PUT /v1/missions/:id/price — raise the mission price (owner only).
async fn set_price(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
    Json(req): Json<SetPriceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.set_price(id, req.new_price, actor.id)?;
    persist_mission(&state, &mission).await?;
    Ok(outcome("price updated", mission))
}

/// POST /v1/missions/:id/confirm — CREATED → SEARCHING_CARRIER.
async fn confirm_mission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.confirm_mission(id, actor.id)?;
    persist_mission(&state, &mission).await?;
    Ok(outcome("mission confirmed", mission))
}

/// POST /v1/missions/:id/acceptances — submit a bid as the authenticated
/// carrier.
async fn submit_acceptance(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
    Json(req): Json<SubmitAcceptanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let acceptance = state.engine.submit_acceptance(id, actor.id, req.message)?;

    if let Some(pool) = &state.db_pool {
        let inserted = db::acceptances::insert_acceptance(pool, &acceptance)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, mission_id = %id, "failed to persist acceptance");
                AppError::Internal(format!("failed to persist acceptance: {e}"))
            })?;
        // Unique constraint fired: another instance recorded this pair first.
        if !inserted {
            return Err(DomainError::DuplicateAcceptance.into());
        }
    }

    Ok((StatusCode::CREATED, outcome("acceptance submitted", acceptance)))
}

/// GET /v1/missions/:id/acceptances — all bids on a mission (owner only),
/// oldest first, with carrier summaries.
async fn list_acceptances(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    Ok(outcome(
        "acceptances",
        state.projector.mission_offers(&id, &actor.id)?,
    ))
}

/// POST /v1/missions/:id/accept — legacy direct assignment to the
/// authenticated carrier.
async fn accept_mission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.accept_mission(id, actor.id)?;
    persist_binding(&state, &mission).await?;
    Ok(outcome("mission accepted", mission))
}

/// POST /v1/missions/:id/select-carrier — bind the chosen bidder (owner
/// only) and settle all pending bids.
async fn select_carrier(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
    Json(req): Json<SelectCarrierRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.select_carrier(id, req.carrier_id, actor.id)?;
    persist_binding(&state, &mission).await?;

    if let Some(pool) = &state.db_pool {
        db::acceptances::settle_selection(pool, &id, &req.carrier_id, mission.updated_at)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, mission_id = %id, "failed to settle acceptances");
                AppError::Internal(format!("failed to settle acceptances: {e}"))
            })?;
    }

    Ok(outcome("carrier selected", mission))
}

/// POST /v1/missions/:id/status — advance through the delivery chain.
async fn advance_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
    Json(req): Json<AdvanceStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.advance_status(id, actor.id, req.event)?;
    persist_mission(&state, &mission).await?;
    Ok(outcome("status advanced", mission))
}

/// POST /v1/missions/:id/cancel — side-exit, any party.
async fn cancel_mission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.cancel_mission(id, actor.id)?;
    persist_mission(&state, &mission).await?;
    Ok(outcome("mission cancelled", mission))
}

/// POST /v1/missions/:id/dispute — side-exit, any party.
async fn dispute_mission(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<MissionId>,
) -> Result<impl IntoResponse, AppError> {
    let mission = state.engine.dispute_mission(id, actor.id)?;
    persist_mission(&state, &mission).await?;
    Ok(outcome("mission disputed", mission))
}

// ---------------------------------------------------------------------------
// Write-through helpers
// ---------------------------------------------------------------------------

async fn persist_mission(state: &AppState, mission: &Mission) -> Result<(), AppError> {
    if let Some(pool) = &state.db_pool {
        db::missions::save_mission(pool, mission).await.map_err(|e| {
            tracing::error!(error = %e, mission_id = %mission.id, "failed to persist mission");
            AppError::Internal(format!("failed to persist mission: {e}"))
        })?;
    }
    Ok(())
}

/// Persist a carrier binding through the durable guard. A zero-row update
/// means another instance sharing the database claimed the mission first.
async fn persist_binding(state: &AppState, mission: &Mission) -> Result<(), AppError> {
    let Some(pool) = &state.db_pool else {
        return Ok(());
    };
    let carrier = mission
        .carrier_id
        .ok_or_else(|| AppError::Internal("bound mission without carrier".to_string()))?;

    let claimed =
        db::missions::bind_carrier_guarded(pool, &mission.id, &carrier, mission.updated_at)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, mission_id = %mission.id, "failed to persist carrier binding");
                AppError::Internal(format!("failed to persist carrier binding: {e}"))
            })?;
    if !claimed {
        tracing::warn!(
            mission_id = %mission.id,
            "durable binding guard rejected: mission claimed by another writer"
        );
        return Err(DomainError::AlreadyAssigned.into());
    }
    Ok(())
}
