//! # Bearer-Token Actor Resolution
//!
//! Handlers take a [`CurrentActor`] argument; extraction reads the
//! `Authorization: Bearer <token>` header and resolves it through the
//! state's [`IdentityProvider`]. No token or an unknown token is a 401
//! before the handler runs.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use cartage_engine::{Actor, TokenDirectory};
use cartage_store::Role;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated actor for this request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a Bearer token".to_string()))?;

        state
            .identity
            .resolve_actor(token)
            .map(CurrentActor)
            .ok_or_else(|| AppError::Unauthorized("unrecognized token".to_string()))
    }
}

/// Parse a seed string of comma-separated `token:role:uuid` triples (role
/// `shipper` or `carrier`). Malformed entries are logged and skipped.
pub fn parse_seed_entries(seed: &str) -> Vec<(String, Actor)> {
    let mut entries = Vec::new();
    for entry in seed.split(',').filter(|e| !e.trim().is_empty()) {
        let mut parts = entry.trim().splitn(3, ':');
        let (token, role, id) = match (parts.next(), parts.next(), parts.next()) {
            (Some(t), Some(r), Some(i)) => (t, r, i),
            _ => {
                tracing::warn!(entry, "skipping malformed auth seed entry");
                continue;
            }
        };
        let role = match role {
            "shipper" => Role::Shipper,
            "carrier" => Role::Carrier,
            other => {
                tracing::warn!(role = other, "skipping auth seed entry with unknown role");
                continue;
            }
        };
        let id = match id.parse() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "skipping auth seed entry with invalid uuid");
                continue;
            }
        };
        entries.push((token.to_string(), Actor { id, role }));
    }
    entries
}

/// Build a [`TokenDirectory`] from the seed string.
pub fn seed_token_directory(seed: &str) -> TokenDirectory {
    let mut dir = TokenDirectory::new();
    for (token, actor) in parse_seed_entries(seed) {
        dir.register(token, actor);
    }
    dir
}
