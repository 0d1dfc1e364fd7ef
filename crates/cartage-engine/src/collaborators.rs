//! # Collaborator Contracts
//!
//! The narrow seams through which the core consumes the outside world:
//! distance resolution, notification delivery, and actor identity. Each is
//! a trait with a deliberately small surface; production adapters live
//! outside this workspace's core crates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cartage_core::{MissionId, UserId};
use cartage_store::Role;

/// Distance used when the resolver fails or is unavailable. Mission
/// creation degrades to this estimate rather than blocking.
pub const FALLBACK_DISTANCE_KM: f64 = 50.0;

/// Resolves the road distance between two addresses, in kilometres.
///
/// Implementations may be approximate. Errors are tolerated: the engine
/// logs and falls back to [`FALLBACK_DISTANCE_KM`].
pub trait DistanceResolver: Send + Sync {
    fn resolve(&self, origin: &str, destination: &str) -> Result<f64, String>;
}

/// Constant-distance estimator for deployments without a geocoding
/// backend, and for tests.
pub struct FlatRateEstimator {
    pub distance_km: f64,
}

impl Default for FlatRateEstimator {
    fn default() -> Self {
        Self {
            distance_km: FALLBACK_DISTANCE_KM,
        }
    }
}

impl DistanceResolver for FlatRateEstimator {
    fn resolve(&self, _origin: &str, _destination: &str) -> Result<f64, String> {
        Ok(self.distance_km)
    }
}

/// Events emitted after a lifecycle transition commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A carrier submitted a bid on a shipper's mission.
    AcceptanceSubmitted {
        mission_id: MissionId,
        carrier_id: UserId,
        shipper_id: UserId,
    },
    /// A carrier was exclusively bound to a mission.
    CarrierSelected {
        mission_id: MissionId,
        carrier_id: UserId,
        shipper_id: UserId,
    },
}

/// Fire-and-forget notification delivery.
///
/// A notifier failure must never roll back the transaction that triggered
/// it; the engine logs the error and moves on.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), String>;
}

/// Notifier that just records the event in the log stream.
#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), String> {
        tracing::info!(?event, "notification emitted");
        Ok(())
    }
}

/// An authenticated actor, as the identity provider reports it.
/// The core trusts id and role as given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

/// Resolves a bearer token to an actor.
pub trait IdentityProvider: Send + Sync {
    fn resolve_actor(&self, token: &str) -> Option<Actor>;
}

/// In-memory token directory, the development/test identity provider.
#[derive(Default)]
pub struct TokenDirectory {
    tokens: HashMap<String, Actor>,
}

impl TokenDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, token: impl Into<String>, actor: Actor) {
        self.tokens.insert(token.into(), actor);
    }
}

impl IdentityProvider for TokenDirectory {
    fn resolve_actor(&self, token: &str) -> Option<Actor> {
        self.tokens.get(token).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_rate_estimator_returns_its_distance() {
        let est = FlatRateEstimator { distance_km: 120.0 };
        assert_eq!(est.resolve("Lyon", "Paris").unwrap(), 120.0);
    }

    #[test]
    fn token_directory_resolves_registered_tokens() {
        let mut dir = TokenDirectory::new();
        let actor = Actor {
            id: UserId::new(),
            role: Role::Carrier,
        };
        dir.register("tok-123", actor);

        assert_eq!(dir.resolve_actor("tok-123"), Some(actor));
        assert_eq!(dir.resolve_actor("tok-999"), None);
    }
}
