//! # Acceptance Ledger
//!
//! Durable record of carrier bids. The ledger is keyed by mission so the
//! two contract-bearing operations — uniqueness on submission and atomic
//! settling on selection — each run under one entry lock.
//!
//! Invariants enforced here:
//! - at most one acceptance row per `(mission_id, carrier_id)`, ever;
//! - for a given mission, at most one row is `ACCEPTED`, and the step that
//!   accepts it rejects every other `PENDING` row atomically.

use chrono::Utc;
use dashmap::DashMap;

use cartage_core::{AcceptanceId, AcceptanceStatus, DomainError, MissionId, UserId};

use crate::mission::MissionAcceptance;

/// Thread-safe acceptance ledger.
#[derive(Default)]
pub struct AcceptanceLedger {
    by_mission: DashMap<MissionId, Vec<MissionAcceptance>>,
}

impl AcceptanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a carrier's bid. A second submission for the same
    /// `(mission, carrier)` fails with [`DomainError::DuplicateAcceptance`]
    /// and never creates a second row, regardless of the first row's status.
    pub fn submit(
        &self,
        mission_id: MissionId,
        carrier_id: UserId,
        message: Option<String>,
    ) -> Result<MissionAcceptance, DomainError> {
        let mut rows = self.by_mission.entry(mission_id).or_default();

        if rows.iter().any(|a| a.carrier_id == carrier_id) {
            return Err(DomainError::DuplicateAcceptance);
        }

        let now = Utc::now();
        let acceptance = MissionAcceptance {
            id: AcceptanceId::new(),
            mission_id,
            carrier_id,
            status: AcceptanceStatus::Pending,
            message,
            created_at: now,
            updated_at: now,
        };
        rows.push(acceptance.clone());
        Ok(acceptance)
    }

    /// Settle a selection: mark the winner's `PENDING` row `ACCEPTED` and
    /// every other `PENDING` row `REJECTED`, in one locked step.
    ///
    /// Fails with `NotFound` if the winner has no row for this mission and
    /// `InvalidTransition`-adjacent `Validation` if the row is no longer
    /// pending — both without touching any sibling row.
    pub fn settle_selection(
        &self,
        mission_id: &MissionId,
        winner: &UserId,
    ) -> Result<MissionAcceptance, DomainError> {
        let mut rows = self
            .by_mission
            .get_mut(mission_id)
            .ok_or_else(|| DomainError::not_found("acceptance"))?;

        let winner_idx = rows
            .iter()
            .position(|a| a.carrier_id == *winner)
            .ok_or_else(|| DomainError::not_found("acceptance"))?;
        if rows[winner_idx].status != AcceptanceStatus::Pending {
            return Err(DomainError::Validation(
                "carrier's acceptance is no longer pending".to_string(),
            ));
        }

        let now = Utc::now();
        for (i, row) in rows.iter_mut().enumerate() {
            if row.status != AcceptanceStatus::Pending {
                continue;
            }
            row.status = if i == winner_idx {
                AcceptanceStatus::Accepted
            } else {
                AcceptanceStatus::Rejected
            };
            row.updated_at = now;
        }
        Ok(rows[winner_idx].clone())
    }

    /// Re-insert a persisted row during startup hydration, keeping its id,
    /// status, and timestamps. Rows whose `(mission, carrier)` pair is
    /// already present are skipped.
    pub fn restore(&self, acceptance: MissionAcceptance) {
        let mut rows = self.by_mission.entry(acceptance.mission_id).or_default();
        if rows.iter().any(|a| a.carrier_id == acceptance.carrier_id) {
            return;
        }
        rows.push(acceptance);
    }

    /// The acceptance row for a specific carrier, if any.
    pub fn find(&self, mission_id: &MissionId, carrier_id: &UserId) -> Option<MissionAcceptance> {
        self.by_mission
            .get(mission_id)?
            .iter()
            .find(|a| a.carrier_id == *carrier_id)
            .cloned()
    }

    /// All rows for a mission, oldest first (submission order).
    pub fn for_mission(&self, mission_id: &MissionId) -> Vec<MissionAcceptance> {
        self.by_mission
            .get(mission_id)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// Pending rows for a mission, oldest first.
    pub fn pending_for_mission(&self, mission_id: &MissionId) -> Vec<MissionAcceptance> {
        self.by_mission
            .get(mission_id)
            .map(|rows| {
                rows.iter()
                    .filter(|a| a.status == AcceptanceStatus::Pending)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}
