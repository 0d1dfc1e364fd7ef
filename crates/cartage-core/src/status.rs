//! # Mission Status State Machine
//!
//! Mission and acceptance lifecycle states, plus the single authoritative
//! transition function [`advance`]. Every status mutation in the system —
//! whether it lands in the in-memory store or in Postgres — goes through
//! this table; there is no second place where ordering is encoded.
//!
//! ## Mission lifecycle
//!
//! ```text
//! Created → SearchingCarrier → Accepted → PickupConfirmed → InTransit
//!         → Delivered → Completed
//! ```
//!
//! `Cancel` and `Dispute` are side-exits from any non-terminal state.
//! Terminal states: `Completed`, `Cancelled`.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

// ---------------------------------------------------------------------------
// Mission status
// ---------------------------------------------------------------------------

/// Lifecycle status of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionStatus {
    Created,
    SearchingCarrier,
    Accepted,
    PickupConfirmed,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
    Disputed,
}

impl MissionStatus {
    /// Wire/database representation (`SEARCHING_CARRIER` etc.).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::SearchingCarrier => "SEARCHING_CARRIER",
            Self::Accepted => "ACCEPTED",
            Self::PickupConfirmed => "PICKUP_CONFIRMED",
            Self::InTransit => "IN_TRANSIT",
            Self::Delivered => "DELIVERED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        }
    }

    /// Parse the wire/database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATED" => Some(Self::Created),
            "SEARCHING_CARRIER" => Some(Self::SearchingCarrier),
            "ACCEPTED" => Some(Self::Accepted),
            "PICKUP_CONFIRMED" => Some(Self::PickupConfirmed),
            "IN_TRANSIT" => Some(Self::InTransit),
            "DELIVERED" => Some(Self::Delivered),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" => Some(Self::Cancelled),
            "DISPUTED" => Some(Self::Disputed),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether a carrier must be bound in this status.
    ///
    /// Invariant: `carrier_id` is set iff the status is one of these
    /// (Disputed/Cancelled may retain a stale carrier from before the exit).
    pub fn requires_carrier(&self) -> bool {
        matches!(
            self,
            Self::Accepted
                | Self::PickupConfirmed
                | Self::InTransit
                | Self::Delivered
                | Self::Completed
        )
    }

    /// Whether carriers may still bid / be bound in this status.
    pub fn accepts_carriers(&self) -> bool {
        matches!(self, Self::Created | Self::SearchingCarrier)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Acceptance status
// ---------------------------------------------------------------------------

/// Status of a carrier's acceptance (bid) on a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AcceptanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for AcceptanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Events and the transition function
// ---------------------------------------------------------------------------

/// An event applied to a mission's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionEvent {
    /// Shipper confirms the mission (payment signal received externally).
    Confirm,
    /// A carrier is exclusively bound to the mission.
    BindCarrier,
    /// Carrier confirms goods were picked up.
    ConfirmPickup,
    /// Carrier starts transit.
    StartTransit,
    /// Carrier marks the goods delivered.
    MarkDelivered,
    /// Shipper closes out the mission.
    Complete,
    /// Side-exit: mission cancelled.
    Cancel,
    /// Side-exit: mission disputed.
    Dispute,
}

impl std::fmt::Display for MissionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Confirm => "CONFIRM",
            Self::BindCarrier => "BIND_CARRIER",
            Self::ConfirmPickup => "CONFIRM_PICKUP",
            Self::StartTransit => "START_TRANSIT",
            Self::MarkDelivered => "MARK_DELIVERED",
            Self::Complete => "COMPLETE",
            Self::Cancel => "CANCEL",
            Self::Dispute => "DISPUTE",
        };
        f.write_str(s)
    }
}

/// Validate an event against the current status and return the next status.
///
/// The only transition table in the system. `BindCarrier` is accepted from
/// both `Created` (legacy direct assignment) and `SearchingCarrier`
/// (selection after bidding); everything else is a strict chain plus the
/// `Cancel`/`Dispute` side-exits from any non-terminal state.
pub fn advance(current: MissionStatus, event: MissionEvent) -> Result<MissionStatus, DomainError> {
    use MissionEvent as E;
    use MissionStatus as S;

    let next = match (current, event) {
        (S::Created, E::Confirm) => S::SearchingCarrier,
        (S::Created | S::SearchingCarrier, E::BindCarrier) => S::Accepted,
        (S::Accepted, E::ConfirmPickup) => S::PickupConfirmed,
        (S::PickupConfirmed, E::StartTransit) => S::InTransit,
        (S::InTransit, E::MarkDelivered) => S::Delivered,
        (S::Delivered, E::Complete) => S::Completed,
        (s, E::Cancel) if !s.is_terminal() => S::Cancelled,
        (s, E::Dispute) if !s.is_terminal() && s != S::Disputed => S::Disputed,
        (from, event) => return Err(DomainError::InvalidTransition { from, event }),
    };
    Ok(next)
}
