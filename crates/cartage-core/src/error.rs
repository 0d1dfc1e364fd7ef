//! # Domain Error Taxonomy
//!
//! The single error type every core operation returns. Store-level failures
//! are translated into the nearest domain kind before they reach a caller
//! (a unique-constraint violation becomes [`DomainError::DuplicateAcceptance`],
//! a guarded update touching zero rows becomes [`DomainError::AlreadyAssigned`]).
//! Only [`DomainError::Unavailable`] is safe to retry.

use thiserror::Error;

use crate::money::Money;
use crate::status::{MissionEvent, MissionStatus};

/// Errors arising from mission lifecycle operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Mission, carrier, or shipper does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The acting user is not authorized for this mission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The mission's status does not admit the requested event.
    #[error("invalid transition: cannot apply {event} in status {from}")]
    InvalidTransition {
        from: MissionStatus,
        event: MissionEvent,
    },

    /// Attempt to lower the price below the current floor.
    #[error("price may not drop below the current floor: offered {offered}, floor {floor}")]
    InvalidPriceDirection { floor: Money, offered: Money },

    /// The carrier already has an acceptance row for this mission.
    #[error("carrier has already bid on this mission")]
    DuplicateAcceptance,

    /// Lost the race: the mission already has a bound carrier.
    #[error("mission already has an assigned carrier")]
    AlreadyAssigned,

    /// Malformed input (geometry, timing, amounts).
    #[error("validation error: {0}")]
    Validation(String),

    /// Transient store failure; safe to retry.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl DomainError {
    /// Machine-readable kind, used in the API outcome envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::InvalidPriceDirection { .. } => "INVALID_PRICE_DIRECTION",
            Self::DuplicateAcceptance => "DUPLICATE_ACCEPTANCE",
            Self::AlreadyAssigned => "ALREADY_ASSIGNED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unavailable(_) => "UNAVAILABLE",
        }
    }

    /// Whether a caller may safely retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    /// Convenience constructor for missing entities.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
