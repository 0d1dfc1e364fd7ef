//! # Mission Lifecycle Engine
//!
//! Orchestrates every status transition, price adjustment, and carrier
//! selection. Two public assignment paths — [`MissionLifecycleEngine::select_carrier`]
//! (via a bid) and [`MissionLifecycleEngine::accept_mission`] (legacy
//! direct) — funnel into the one compare-and-set binding primitive in the
//! mission store, so of any set of racing callers exactly one wins,
//! whichever entry point it came through.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cartage_core::{
    compute_pricing, DomainError, MissionEvent, MissionId, MissionStatus, Money, ShipmentClass,
    UserId,
};
use cartage_store::{
    AcceptanceLedger, GoodsDetails, Mission, MissionAcceptance, MissionStore, PartySummary,
    PricingBlock, Role, Stop, TemperatureRange, UserDirectory,
};

use crate::collaborators::{
    DistanceResolver, NotificationEvent, Notifier, FALLBACK_DISTANCE_KM,
};

// ---------------------------------------------------------------------------
// Input and output shapes
// ---------------------------------------------------------------------------

/// Everything a shipper supplies to create a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionDraft {
    pub shipment_class: ShipmentClass,
    pub pickup: Stop,
    pub delivery: Stop,
    pub goods_type: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub length_m: Option<f64>,
    #[serde(default)]
    pub width_m: Option<f64>,
    #[serde(default)]
    pub height_m: Option<f64>,
    #[serde(default)]
    pub fragile: bool,
    #[serde(default)]
    pub temperature_required: Option<TemperatureRange>,
    /// Road distance if the shipper already knows it; otherwise resolved.
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// A mission joined with party summaries for read paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionView {
    pub mission: Mission,
    pub shipper: Option<PartySummary>,
    pub carrier: Option<PartySummary>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The lifecycle engine. Cheap to clone handles via `Arc`; one instance is
/// shared across all request workers.
pub struct MissionLifecycleEngine {
    missions: Arc<MissionStore>,
    acceptances: Arc<AcceptanceLedger>,
    users: Arc<UserDirectory>,
    distance: Arc<dyn DistanceResolver>,
    notifier: Arc<dyn Notifier>,
}

impl MissionLifecycleEngine {
    pub fn new(
        missions: Arc<MissionStore>,
        acceptances: Arc<AcceptanceLedger>,
        users: Arc<UserDirectory>,
        distance: Arc<dyn DistanceResolver>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            missions,
            acceptances,
            users,
            distance,
            notifier,
        }
    }

    // -- Creation and pricing ------------------------------------------------

    /// Create a mission for `shipper_id`.
    ///
    /// Resolves distance through the collaborator when the draft does not
    /// carry one (resolver failure degrades to [`FALLBACK_DISTANCE_KM`]),
    /// derives volume from dimensions when absent, prices the shipment, and
    /// persists with status `CREATED` and no carrier. Nothing is persisted
    /// on any failure.
    pub fn create_mission(
        &self,
        draft: MissionDraft,
        shipper_id: UserId,
    ) -> Result<Mission, DomainError> {
        if !self.users.is_active_shipper(&shipper_id) {
            return Err(DomainError::not_found("shipper"));
        }
        validate_draft(&draft)?;

        let distance_km = match draft.distance_km {
            Some(d) => d,
            None => match self
                .distance
                .resolve(&draft.pickup.address, &draft.delivery.address)
            {
                Ok(d) if d.is_finite() && d > 0.0 => d,
                Ok(d) => {
                    tracing::warn!(distance = d, "distance resolver returned unusable value");
                    FALLBACK_DISTANCE_KM
                }
                Err(e) => {
                    tracing::warn!(error = %e, "distance resolver failed, using fallback estimate");
                    FALLBACK_DISTANCE_KM
                }
            },
        };

        let volume_m3 = draft.volume_m3.unwrap_or_else(|| {
            match (draft.length_m, draft.width_m, draft.height_m) {
                (Some(l), Some(w), Some(h)) => l * w * h,
                _ => 0.0,
            }
        });

        let breakdown = compute_pricing(distance_km, draft.shipment_class)?;
        let now = chrono::Utc::now();
        let mission = Mission {
            id: MissionId::new(),
            shipper_id,
            carrier_id: None,
            shipment_class: draft.shipment_class,
            pickup: draft.pickup,
            delivery: draft.delivery,
            goods: GoodsDetails {
                goods_type: draft.goods_type,
                weight_kg: draft.weight_kg,
                volume_m3,
                length_m: draft.length_m,
                width_m: draft.width_m,
                height_m: draft.height_m,
                fragile: draft.fragile,
                temperature_required: draft.temperature_required,
            },
            pricing: PricingBlock::from_breakdown(breakdown, distance_km),
            status: MissionStatus::Created,
            created_at: now,
            updated_at: now,
        };

        self.missions.insert(mission.clone());
        tracing::info!(mission_id = %mission.id, shipper_id = %shipper_id, "mission created");
        Ok(mission)
    }

    /// Raise the mission price. Only the owning shipper may call this, and
    /// the price may never drop below the current final price.
    pub fn set_price(
        &self,
        mission_id: MissionId,
        new_price: Money,
        requester: UserId,
    ) -> Result<Mission, DomainError> {
        let mission = self.require_mission(&mission_id)?;
        require_owner(&mission, &requester)?;
        self.missions.raise_price(&mission_id, new_price)
    }

    /// Confirm the mission: `CREATED → SEARCHING_CARRIER`.
    ///
    /// Payment confirmation is an external precondition signal from the
    /// payments collaborator; this engine checks ownership and status only.
    pub fn confirm_mission(
        &self,
        mission_id: MissionId,
        requester: UserId,
    ) -> Result<Mission, DomainError> {
        let mission = self.require_mission(&mission_id)?;
        require_owner(&mission, &requester)?;
        self.missions.apply_event(&mission_id, MissionEvent::Confirm)
    }

    // -- Bidding and selection ----------------------------------------------

    /// Record a carrier's bid on a mission. Does not mutate the mission.
    pub fn submit_acceptance(
        &self,
        mission_id: MissionId,
        carrier_id: UserId,
        message: Option<String>,
    ) -> Result<MissionAcceptance, DomainError> {
        if !self.users.is_active_carrier(&carrier_id) {
            return Err(DomainError::not_found("carrier"));
        }
        let mission = self.require_mission(&mission_id)?;
        if mission.carrier_id.is_some() {
            return Err(DomainError::AlreadyAssigned);
        }
        if !mission.status.accepts_carriers() {
            return Err(DomainError::InvalidTransition {
                from: mission.status,
                event: MissionEvent::BindCarrier,
            });
        }

        // Uniqueness on (mission, carrier) is the ledger's job; a racing
        // duplicate from the same carrier loses there, not here.
        let acceptance = self.acceptances.submit(mission_id, carrier_id, message)?;

        self.emit(NotificationEvent::AcceptanceSubmitted {
            mission_id,
            carrier_id,
            shipper_id: mission.shipper_id,
        });
        Ok(acceptance)
    }

    /// Exclusively bind the chosen carrier and settle all pending bids.
    ///
    /// Preconditions (owner, `SEARCHING_CARRIER`, pending bid) are checked
    /// up front, but the serialization point is the store's compare-and-set
    /// bind: of any concurrent selections (or direct acceptances) exactly
    /// one observes `carrier_id == None` and wins. Only the winner settles
    /// the ledger, so the settle step cannot conflict.
    pub fn select_carrier(
        &self,
        mission_id: MissionId,
        carrier_id: UserId,
        shipper_id: UserId,
    ) -> Result<Mission, DomainError> {
        let mission = self.require_mission(&mission_id)?;
        require_owner(&mission, &shipper_id)?;
        if mission.status != MissionStatus::SearchingCarrier {
            return Err(DomainError::InvalidTransition {
                from: mission.status,
                event: MissionEvent::BindCarrier,
            });
        }
        match self.acceptances.find(&mission_id, &carrier_id) {
            Some(a) if a.status == cartage_core::AcceptanceStatus::Pending => {}
            Some(_) => {
                return Err(DomainError::Validation(
                    "carrier's acceptance is no longer pending".to_string(),
                ))
            }
            None => return Err(DomainError::not_found("acceptance")),
        }

        let bound = self.missions.bind_carrier(&mission_id, carrier_id)?;
        let settled = self.acceptances.settle_selection(&mission_id, &carrier_id);
        debug_assert!(settled.is_ok(), "winner settle must not conflict");
        settled?;

        tracing::info!(
            mission_id = %mission_id,
            carrier_id = %carrier_id,
            "carrier selected, pending bids settled"
        );
        self.emit(NotificationEvent::CarrierSelected {
            mission_id,
            carrier_id,
            shipper_id,
        });
        Ok(bound)
    }

    /// Legacy direct assignment: bind `carrier_id` without an intervening
    /// bid. Same exclusivity guarantee as [`Self::select_carrier`] — both
    /// paths race on the same compare-and-set.
    pub fn accept_mission(
        &self,
        mission_id: MissionId,
        carrier_id: UserId,
    ) -> Result<Mission, DomainError> {
        if !self.users.is_active_carrier(&carrier_id) {
            return Err(DomainError::not_found("carrier"));
        }
        // bind_carrier re-checks carrier_id and status under the entry lock.
        let bound = self.missions.bind_carrier(&mission_id, carrier_id)?;

        tracing::info!(mission_id = %mission_id, carrier_id = %carrier_id, "mission directly accepted");
        self.emit(NotificationEvent::CarrierSelected {
            mission_id,
            carrier_id,
            shipper_id: bound.shipper_id,
        });
        Ok(bound)
    }

    // -- Progress and side-exits --------------------------------------------

    /// Advance a bound mission through its delivery chain, or take a
    /// side-exit. Authorization depends on the event: the bound carrier
    /// drives pickup through delivery, the shipper completes, and either
    /// party may cancel or dispute.
    pub fn advance_status(
        &self,
        mission_id: MissionId,
        actor: UserId,
        event: MissionEvent,
    ) -> Result<Mission, DomainError> {
        let mission = self.require_mission(&mission_id)?;

        match event {
            MissionEvent::Confirm | MissionEvent::BindCarrier => {
                return Err(DomainError::Validation(format!(
                    "{event} has a dedicated operation and cannot be applied directly"
                )));
            }
            MissionEvent::ConfirmPickup | MissionEvent::StartTransit | MissionEvent::MarkDelivered => {
                if mission.carrier_id != Some(actor) {
                    return Err(DomainError::Forbidden(
                        "only the assigned carrier can report delivery progress".to_string(),
                    ));
                }
            }
            MissionEvent::Complete => {
                require_owner(&mission, &actor)?;
            }
            MissionEvent::Cancel | MissionEvent::Dispute => {
                let is_party =
                    mission.shipper_id == actor || mission.carrier_id == Some(actor);
                if !is_party {
                    return Err(DomainError::Forbidden(
                        "only a party to the mission can cancel or dispute it".to_string(),
                    ));
                }
            }
        }

        self.missions.apply_event(&mission_id, event)
    }

    /// Cancel side-exit; allowed from any non-terminal state and never
    /// blocked by selection locking.
    pub fn cancel_mission(&self, mission_id: MissionId, actor: UserId) -> Result<Mission, DomainError> {
        self.advance_status(mission_id, actor, MissionEvent::Cancel)
    }

    /// Dispute side-exit.
    pub fn dispute_mission(&self, mission_id: MissionId, actor: UserId) -> Result<Mission, DomainError> {
        self.advance_status(mission_id, actor, MissionEvent::Dispute)
    }

    // -- Read paths ----------------------------------------------------------

    /// A mission joined with its party summaries.
    pub fn get_mission(&self, mission_id: MissionId) -> Result<MissionView, DomainError> {
        let mission = self.require_mission(&mission_id)?;
        Ok(self.view(mission))
    }

    /// Missions open to carriers, newest first, with shipper summaries.
    pub fn available_missions(&self) -> Vec<MissionView> {
        self.missions
            .list_available()
            .into_iter()
            .map(|m| self.view(m))
            .collect()
    }

    /// Missions where `user_id` is a party, by role, newest first.
    pub fn my_missions(&self, user_id: UserId, role: Role) -> Vec<MissionView> {
        let missions = match role {
            Role::Shipper => self.missions.list_for_shipper(&user_id),
            Role::Carrier => self.missions.list_for_carrier(&user_id),
        };
        missions.into_iter().map(|m| self.view(m)).collect()
    }

    // -- Internals -----------------------------------------------------------

    fn require_mission(&self, id: &MissionId) -> Result<Mission, DomainError> {
        self.missions
            .get(id)
            .ok_or_else(|| DomainError::not_found("mission"))
    }

    fn view(&self, mission: Mission) -> MissionView {
        let shipper = self.users.party_summary(&mission.shipper_id);
        let carrier = mission
            .carrier_id
            .as_ref()
            .and_then(|c| self.users.party_summary(c));
        MissionView {
            mission,
            shipper,
            carrier,
        }
    }

    /// Fire-and-forget: a notifier failure is logged, never propagated.
    fn emit(&self, event: NotificationEvent) {
        if let Err(e) = self.notifier.notify(&event) {
            tracing::warn!(error = %e, ?event, "notification delivery failed");
        }
    }
}

fn require_owner(mission: &Mission, requester: &UserId) -> Result<(), DomainError> {
    if mission.shipper_id != *requester {
        return Err(DomainError::Forbidden(
            "only the mission's shipper may perform this operation".to_string(),
        ));
    }
    Ok(())
}

fn validate_draft(draft: &MissionDraft) -> Result<(), DomainError> {
    fn positive(name: &str, v: f64) -> Result<(), DomainError> {
        if !v.is_finite() || v <= 0.0 {
            return Err(DomainError::Validation(format!(
                "{name} must be a positive number, got {v}"
            )));
        }
        Ok(())
    }
    fn present(name: &str, v: &str) -> Result<(), DomainError> {
        if v.trim().is_empty() {
            return Err(DomainError::Validation(format!("{name} must not be empty")));
        }
        Ok(())
    }

    present("pickup.address", &draft.pickup.address)?;
    present("pickup.city", &draft.pickup.city)?;
    present("delivery.address", &draft.delivery.address)?;
    present("delivery.city", &draft.delivery.city)?;
    present("goods_type", &draft.goods_type)?;
    positive("weight_kg", draft.weight_kg)?;

    for (name, v) in [
        ("volume_m3", draft.volume_m3),
        ("length_m", draft.length_m),
        ("width_m", draft.width_m),
        ("height_m", draft.height_m),
        ("distance_km", draft.distance_km),
    ] {
        if let Some(v) = v {
            positive(name, v)?;
        }
    }

    if let (Some(p), Some(d)) = (draft.pickup.date, draft.delivery.date) {
        if d < p {
            return Err(DomainError::Validation(
                "delivery date must not precede pickup date".to_string(),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
