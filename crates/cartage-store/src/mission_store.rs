//! # Mission Store
//!
//! In-memory mission store backed by `DashMap`. Each guarded mutation takes
//! the mission's entry write lock for its whole read-validate-write cycle,
//! so concurrent callers serialize per mission and exactly one can observe
//! `carrier_id == None` during a binding race.

use dashmap::DashMap;
use chrono::Utc;

use cartage_core::{advance, DomainError, MissionEvent, MissionId, MissionStatus, Money, UserId};

use crate::mission::Mission;

/// Thread-safe mission store. Mutating methods are reserved for the
/// lifecycle engine; queries are open to projections.
#[derive(Default)]
pub struct MissionStore {
    missions: DashMap<MissionId, Mission>,
}

impl MissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a freshly created mission.
    pub fn insert(&self, mission: Mission) {
        self.missions.insert(mission.id, mission);
    }

    pub fn get(&self, id: &MissionId) -> Option<Mission> {
        self.missions.get(id).map(|m| m.clone())
    }

    /// The exclusivity compare-and-set: bind `carrier` to the mission iff
    /// no carrier is bound yet and the status still admits binding.
    ///
    /// Of any set of racing callers, exactly one succeeds; the rest fail
    /// with [`DomainError::AlreadyAssigned`] (carrier already set) or
    /// [`DomainError::InvalidTransition`] (status moved on).
    pub fn bind_carrier(&self, id: &MissionId, carrier: UserId) -> Result<Mission, DomainError> {
        let mut entry = self
            .missions
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("mission"))?;
        let mission = entry.value_mut();

        if mission.carrier_id.is_some() {
            return Err(DomainError::AlreadyAssigned);
        }
        let next = advance(mission.status, MissionEvent::BindCarrier)?;

        mission.carrier_id = Some(carrier);
        mission.status = next;
        mission.updated_at = Utc::now();
        Ok(mission.clone())
    }

    /// Advance the mission's status through the transition table.
    pub fn apply_event(&self, id: &MissionId, event: MissionEvent) -> Result<Mission, DomainError> {
        let mut entry = self
            .missions
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("mission"))?;
        let mission = entry.value_mut();

        let next = advance(mission.status, event)?;
        mission.status = next;
        mission.updated_at = Utc::now();
        Ok(mission.clone())
    }

    /// Raise the shipper-facing price. Monotonic: `new_final` must be at
    /// least the current final price, else
    /// [`DomainError::InvalidPriceDirection`] and the mission is untouched.
    ///
    /// Base and commission are re-derived holding the 10% commission ratio
    /// fixed; the base rounds down so the commission absorbs the remainder
    /// and `final >= base × 1.10` keeps holding at cent granularity.
    pub fn raise_price(&self, id: &MissionId, new_final: Money) -> Result<Mission, DomainError> {
        let mut entry = self
            .missions
            .get_mut(id)
            .ok_or_else(|| DomainError::not_found("mission"))?;
        let mission = entry.value_mut();

        if new_final < mission.pricing.final_price {
            return Err(DomainError::InvalidPriceDirection {
                floor: mission.pricing.final_price,
                offered: new_final,
            });
        }

        let base = new_final.ratio_floor(10, 11);
        // Never negative: base <= new_final by construction.
        let commission = new_final
            .checked_sub(base)
            .unwrap_or(Money::ZERO);

        mission.pricing.base_price = base;
        mission.pricing.commission_amount = commission;
        mission.pricing.final_price = new_final;
        mission.updated_at = Utc::now();
        Ok(mission.clone())
    }

    /// Missions open to carriers: unbound and still accepting, newest first.
    pub fn list_available(&self) -> Vec<Mission> {
        let mut out: Vec<Mission> = self
            .missions
            .iter()
            .filter(|m| m.status.accepts_carriers() && m.carrier_id.is_none())
            .map(|m| m.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// All missions posted by a shipper, newest first.
    pub fn list_for_shipper(&self, shipper: &UserId) -> Vec<Mission> {
        let mut out: Vec<Mission> = self
            .missions
            .iter()
            .filter(|m| m.shipper_id == *shipper)
            .map(|m| m.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// All missions a carrier is bound to, newest first.
    pub fn list_for_carrier(&self, carrier: &UserId) -> Vec<Mission> {
        let mut out: Vec<Mission> = self
            .missions
            .iter()
            .filter(|m| m.carrier_id.as_ref() == Some(carrier))
            .map(|m| m.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    /// Shipper's missions currently in one of the given statuses, newest first.
    pub fn list_for_shipper_in(&self, shipper: &UserId, statuses: &[MissionStatus]) -> Vec<Mission> {
        let mut out: Vec<Mission> = self
            .missions
            .iter()
            .filter(|m| m.shipper_id == *shipper && statuses.contains(&m.status))
            .map(|m| m.clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub fn len(&self) -> usize {
        self.missions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.missions.is_empty()
    }
}
