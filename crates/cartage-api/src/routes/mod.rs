//! HTTP route modules. Each module exports `router() -> Router<AppState>`;
//! the full surface is assembled in `lib.rs`.

pub mod dashboard;
pub mod missions;

use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Success envelope: `{"ok": true, "message": ..., "data": ...}`.
pub(crate) fn outcome<T: Serialize>(message: &str, data: T) -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "message": message, "data": data }))
}
