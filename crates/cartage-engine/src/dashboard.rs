//! # Shipper Dashboard Projections
//!
//! Read-only joins over the mission store, acceptance ledger, and user
//! directory. Nothing here mutates state; a projection taken mid-race is
//! simply a snapshot of whichever side committed first.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cartage_core::{DomainError, MissionId, MissionStatus, UserId};
use cartage_store::{
    AcceptanceLedger, Mission, MissionAcceptance, MissionStore, PartySummary, UserDirectory,
};

/// How many settled missions the recent-activity panel shows.
const RECENT_LIMIT: usize = 5;

/// A pending bid joined with the bidding carrier and its mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperOffer {
    pub acceptance: MissionAcceptance,
    /// `None` when the carrier account has since disappeared from the
    /// directory; the offer row is still shown.
    pub carrier: Option<PartySummary>,
    pub mission: Mission,
}

/// The three dashboard panels, fetched in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperDashboard {
    pub new_offers: Vec<ShipperOffer>,
    pub in_progress: Vec<Mission>,
    pub recent: Vec<Mission>,
}

/// Builds shipper-facing projections.
pub struct DashboardProjector {
    missions: Arc<MissionStore>,
    acceptances: Arc<AcceptanceLedger>,
    users: Arc<UserDirectory>,
}

impl DashboardProjector {
    pub fn new(
        missions: Arc<MissionStore>,
        acceptances: Arc<AcceptanceLedger>,
        users: Arc<UserDirectory>,
    ) -> Self {
        Self {
            missions,
            acceptances,
            users,
        }
    }

    /// Pending bids across the shipper's missions still searching for a
    /// carrier, newest bid first.
    pub fn shipper_offers(&self, shipper: &UserId) -> Vec<ShipperOffer> {
        let searching = self
            .missions
            .list_for_shipper_in(shipper, &[MissionStatus::SearchingCarrier]);

        let mut offers: Vec<ShipperOffer> = searching
            .into_iter()
            .flat_map(|mission| {
                self.acceptances
                    .pending_for_mission(&mission.id)
                    .into_iter()
                    .map(move |acceptance| {
                        let carrier = acceptance.carrier_id;
                        (mission.clone(), acceptance, carrier)
                    })
            })
            .map(|(mission, acceptance, carrier)| ShipperOffer {
                carrier: self.users.party_summary(&carrier),
                acceptance,
                mission,
            })
            .collect();
        offers.sort_by(|a, b| b.acceptance.created_at.cmp(&a.acceptance.created_at));
        offers
    }

    /// Missions with a bound carrier that have not yet settled, newest first.
    pub fn in_progress(&self, shipper: &UserId) -> Vec<Mission> {
        self.missions.list_for_shipper_in(
            shipper,
            &[
                MissionStatus::Accepted,
                MissionStatus::PickupConfirmed,
                MissionStatus::InTransit,
            ],
        )
    }

    /// The shipper's most recently settled missions, newest first, capped
    /// at [`RECENT_LIMIT`].
    pub fn recent(&self, shipper: &UserId) -> Vec<Mission> {
        let mut out = self.missions.list_for_shipper_in(
            shipper,
            &[
                MissionStatus::Delivered,
                MissionStatus::Completed,
                MissionStatus::Cancelled,
                MissionStatus::Disputed,
            ],
        );
        out.truncate(RECENT_LIMIT);
        out
    }

    /// All three panels at once.
    pub fn shipper_dashboard(&self, shipper: &UserId) -> ShipperDashboard {
        ShipperDashboard {
            new_offers: self.shipper_offers(shipper),
            in_progress: self.in_progress(shipper),
            recent: self.recent(shipper),
        }
    }

    /// Every acceptance row for one mission, oldest first, with carrier
    /// summaries. Owner-only.
    pub fn mission_offers(
        &self,
        mission_id: &MissionId,
        shipper: &UserId,
    ) -> Result<Vec<ShipperOffer>, DomainError> {
        let mission = self
            .missions
            .get(mission_id)
            .ok_or_else(|| DomainError::not_found("mission"))?;
        if mission.shipper_id != *shipper {
            return Err(DomainError::Forbidden(
                "only the mission's shipper may list its acceptances".to_string(),
            ));
        }

        Ok(self
            .acceptances
            .for_mission(mission_id)
            .into_iter()
            .map(|acceptance| ShipperOffer {
                carrier: self.users.party_summary(&acceptance.carrier_id),
                acceptance,
                mission: mission.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{FlatRateEstimator, LogNotifier};
    use crate::engine::{MissionDraft, MissionLifecycleEngine};
    use cartage_core::{AcceptanceStatus, MissionEvent, ShipmentClass};
    use cartage_store::{Role, Stop, UserRecord};

    struct World {
        engine: MissionLifecycleEngine,
        projector: DashboardProjector,
        users: Arc<UserDirectory>,
        shipper: UserId,
    }

    fn world() -> World {
        let missions = Arc::new(MissionStore::new());
        let acceptances = Arc::new(AcceptanceLedger::new());
        let users = Arc::new(UserDirectory::new());
        let shipper = UserRecord::new("Menuiserie Albin", Role::Shipper);
        let shipper_id = shipper.id;
        users.insert(shipper);

        let engine = MissionLifecycleEngine::new(
            Arc::clone(&missions),
            Arc::clone(&acceptances),
            Arc::clone(&users),
            Arc::new(FlatRateEstimator { distance_km: 80.0 }),
            Arc::new(LogNotifier),
        );
        let projector = DashboardProjector::new(missions, acceptances, users.clone());
        World {
            engine,
            projector,
            users,
            shipper: shipper_id,
        }
    }

    fn carrier(w: &World, name: &str) -> UserId {
        let c = UserRecord::new(name, Role::Carrier);
        let id = c.id;
        w.users.insert(c);
        id
    }

    fn draft() -> MissionDraft {
        let stop = |city: &str| Stop {
            address: format!("3 Avenue des Tilleuls, {city}"),
            city: city.to_string(),
            postal_code: "31000".to_string(),
            contact_name: "M. Albin".to_string(),
            contact_phone: "+33 6 55 44 33 22".to_string(),
            date: None,
            time_slot: None,
            instructions: None,
        };
        MissionDraft {
            shipment_class: ShipmentClass::Standard,
            pickup: stop("Toulouse"),
            delivery: stop("Bordeaux"),
            goods_type: "mobilier".to_string(),
            weight_kg: 180.0,
            volume_m3: Some(3.0),
            length_m: None,
            width_m: None,
            height_m: None,
            fragile: true,
            temperature_required: None,
            distance_km: Some(100.0),
        }
    }

    fn searching(w: &World) -> MissionId {
        let m = w.engine.create_mission(draft(), w.shipper).unwrap();
        w.engine.confirm_mission(m.id, w.shipper).unwrap();
        m.id
    }

    #[test]
    fn offers_show_pending_bids_with_carrier_summary() {
        let w = world();
        let mission = searching(&w);
        let c1 = carrier(&w, "Fret Express");
        let c2 = carrier(&w, "Sud Logistique");
        w.engine.submit_acceptance(mission, c1, None).unwrap();
        w.engine.submit_acceptance(mission, c2, None).unwrap();

        let offers = w.projector.shipper_offers(&w.shipper);
        assert_eq!(offers.len(), 2);
        assert!(offers
            .iter()
            .all(|o| o.acceptance.status == AcceptanceStatus::Pending));
        assert!(offers.iter().any(|o| o
            .carrier
            .as_ref()
            .is_some_and(|c| c.name == "Fret Express")));
        // Newest bid first.
        assert!(offers[0].acceptance.created_at >= offers[1].acceptance.created_at);
    }

    #[test]
    fn offers_drain_once_settled() {
        let w = world();
        let mission = searching(&w);
        let c1 = carrier(&w, "A");
        let c2 = carrier(&w, "B");
        w.engine.submit_acceptance(mission, c1, None).unwrap();
        w.engine.submit_acceptance(mission, c2, None).unwrap();
        w.engine.select_carrier(mission, c1, w.shipper).unwrap();

        // Mission left SEARCHING_CARRIER and every row settled.
        assert!(w.projector.shipper_offers(&w.shipper).is_empty());
        assert_eq!(w.projector.in_progress(&w.shipper).len(), 1);
    }

    #[test]
    fn recent_caps_at_five() {
        let w = world();
        for _ in 0..7 {
            let id = searching(&w);
            w.engine.cancel_mission(id, w.shipper).unwrap();
        }
        let recent = w.projector.recent(&w.shipper);
        assert_eq!(recent.len(), 5);
        assert!(recent
            .iter()
            .all(|m| m.status == MissionStatus::Cancelled));
    }

    #[test]
    fn dashboard_panels_partition_by_status() {
        let w = world();

        // One searching with a bid, one in progress, one delivered.
        let searching_id = searching(&w);
        let bidder = carrier(&w, "bidder");
        w.engine.submit_acceptance(searching_id, bidder, None).unwrap();

        let progress_id = searching(&w);
        let hauler = carrier(&w, "hauler");
        w.engine.submit_acceptance(progress_id, hauler, None).unwrap();
        w.engine.select_carrier(progress_id, hauler, w.shipper).unwrap();

        let done_id = searching(&w);
        let runner = carrier(&w, "runner");
        w.engine.submit_acceptance(done_id, runner, None).unwrap();
        w.engine.select_carrier(done_id, runner, w.shipper).unwrap();
        for event in [
            MissionEvent::ConfirmPickup,
            MissionEvent::StartTransit,
            MissionEvent::MarkDelivered,
        ] {
            w.engine.advance_status(done_id, runner, event).unwrap();
        }

        let dash = w.projector.shipper_dashboard(&w.shipper);
        assert_eq!(dash.new_offers.len(), 1);
        assert_eq!(dash.new_offers[0].mission.id, searching_id);
        assert_eq!(dash.in_progress.len(), 1);
        assert_eq!(dash.in_progress[0].id, progress_id);
        assert_eq!(dash.recent.len(), 1);
        assert_eq!(dash.recent[0].id, done_id);
    }

    #[test]
    fn mission_offers_owner_only_oldest_first() {
        let w = world();
        let mission = searching(&w);
        let c1 = carrier(&w, "first");
        let c2 = carrier(&w, "second");
        w.engine.submit_acceptance(mission, c1, None).unwrap();
        w.engine.submit_acceptance(mission, c2, None).unwrap();

        let rows = w.projector.mission_offers(&mission, &w.shipper).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].acceptance.carrier_id, c1);

        assert_eq!(
            w.projector
                .mission_offers(&mission, &UserId::new())
                .unwrap_err()
                .kind(),
            "FORBIDDEN"
        );
    }

    #[test]
    fn empty_dashboard_for_unknown_shipper() {
        let w = world();
        let dash = w.projector.shipper_dashboard(&UserId::new());
        assert!(dash.new_offers.is_empty());
        assert!(dash.in_progress.is_empty());
        assert!(dash.recent.is_empty());
    }
}
