//! # cartage-engine — Mission Lifecycle Engine
//!
//! The only component allowed to mutate a mission's status, bind a carrier,
//! or settle acceptance rows. Everything it touches goes through the
//! guarded store primitives in `cartage-store`; everything it returns is a
//! typed [`cartage_core::DomainError`] outcome — no panic and no foreign
//! error type crosses this boundary.
//!
//! External concerns (distance resolution, notifications, identity) enter
//! through the trait seams in [`collaborators`]; their failures degrade or
//! are logged, never blocking a committed lifecycle transition.

pub mod collaborators;
pub mod dashboard;
pub mod engine;

pub use collaborators::{
    Actor, DistanceResolver, FlatRateEstimator, IdentityProvider, LogNotifier, NotificationEvent,
    Notifier, TokenDirectory, FALLBACK_DISTANCE_KM,
};
pub use dashboard::{DashboardProjector, ShipperDashboard, ShipperOffer};
pub use engine::{MissionDraft, MissionLifecycleEngine, MissionView};
