//! # Mission and Acceptance Records
//!
//! The two persisted record types of the core. A [`Mission`] is owned by
//! the shipper who created it; a [`MissionAcceptance`] is a carrier's bid,
//! unique per `(mission_id, carrier_id)` for all time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cartage_core::{
    AcceptanceId, AcceptanceStatus, MissionId, MissionStatus, Money, PricingBreakdown,
    ShipmentClass, UserId,
};
use cartage_core::pricing::{COMMISSION_RATE, VAT_RATE};

/// Temperature requirement for sensitive goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureRange {
    /// -18°C to 0°C
    Frozen,
    /// 0°C to +7°C
    Refrigerated,
    /// +15°C to +25°C
    Ambient,
    /// +2°C to +8°C
    Controlled,
    Other,
}

/// One end of a mission: address, contact, timing, instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub contact_name: String,
    pub contact_phone: String,
    pub date: Option<NaiveDate>,
    /// Free-form time slot, e.g. "14:00-16:00".
    pub time_slot: Option<String>,
    pub instructions: Option<String>,
}

/// Goods descriptors, immutable after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsDetails {
    pub goods_type: String,
    pub weight_kg: f64,
    pub volume_m3: f64,
    pub length_m: Option<f64>,
    pub width_m: Option<f64>,
    pub height_m: Option<f64>,
    pub fragile: bool,
    pub temperature_required: Option<TemperatureRange>,
}

/// The mission's pricing block. `commission_rate` and `vat_rate` are fixed
/// platform constants captured at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingBlock {
    pub base_price: Money,
    pub commission_rate: f64,
    pub commission_amount: Money,
    pub vat_rate: f64,
    pub vat_amount: Money,
    pub final_price: Money,
    pub distance_km: f64,
}

impl PricingBlock {
    /// Capture a calculator breakdown into a mission pricing block.
    pub fn from_breakdown(b: PricingBreakdown, distance_km: f64) -> Self {
        Self {
            base_price: b.base_price,
            commission_rate: COMMISSION_RATE,
            commission_amount: b.commission_amount,
            vat_rate: VAT_RATE,
            vat_amount: b.vat_amount,
            final_price: b.final_price,
            distance_km,
        }
    }

    /// The lowest final price ever admissible for this mission:
    /// `base × (1 + commission_rate)` at cent granularity.
    pub fn floor(&self) -> Money {
        self.base_price + self.base_price.ratio(10, 100)
    }
}

/// A single shipment job posted by a shipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub shipper_id: UserId,
    /// Set exactly once, by the carrier-binding primitive.
    pub carrier_id: Option<UserId>,
    pub shipment_class: ShipmentClass,
    pub pickup: Stop,
    pub delivery: Stop,
    pub goods: GoodsDetails,
    pub pricing: PricingBlock,
    pub status: MissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Mission {
    /// Structural invariant: carrier is bound iff the status requires one
    /// (Cancelled/Disputed may retain a stale carrier from before the exit).
    pub fn carrier_invariant_holds(&self) -> bool {
        if self.status.requires_carrier() {
            self.carrier_id.is_some()
        } else if matches!(self.status, MissionStatus::Cancelled | MissionStatus::Disputed) {
            true
        } else {
            self.carrier_id.is_none()
        }
    }
}

/// A carrier's expressed willingness to fulfil a mission, pending shipper
/// selection. Never mutated after selection settles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionAcceptance {
    pub id: AcceptanceId,
    pub mission_id: MissionId,
    pub carrier_id: UserId,
    pub status: AcceptanceStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
