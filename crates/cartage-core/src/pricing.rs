//! # Pricing Calculator
//!
//! Pure function from (distance, shipment class) to the full price
//! breakdown. Called once at mission creation; no side effects.
//!
//! The formula is VAT-inclusive and canonical:
//!
//! ```text
//! base       = distance_km × rate_per_km      (0.70 STANDARD, 1.20 EXPRESS)
//! commission = base × 10%
//! vat        = (base + commission) × 20%
//! final      = base + commission + vat
//! ```
//!
//! Each derived amount is rounded half-up at the cent independently.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::money::Money;

/// Platform commission, as a fraction of the base price.
pub const COMMISSION_RATE: f64 = 0.10;

/// VAT applied on top of base + commission.
pub const VAT_RATE: f64 = 0.20;

/// Per-km rate in cents for standard shipments.
pub const STANDARD_RATE_CENTS: i64 = 70;

/// Per-km rate in cents for express shipments.
pub const EXPRESS_RATE_CENTS: i64 = 120;

/// Shipment service class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentClass {
    Standard,
    Express,
}

impl ShipmentClass {
    /// Per-km rate in cents.
    pub fn rate_cents(&self) -> i64 {
        match self {
            Self::Standard => STANDARD_RATE_CENTS,
            Self::Express => EXPRESS_RATE_CENTS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Express => "EXPRESS",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "STANDARD" => Some(Self::Standard),
            "EXPRESS" => Some(Self::Express),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShipmentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full price breakdown produced at mission creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub base_price: Money,
    pub commission_amount: Money,
    pub vat_amount: Money,
    pub final_price: Money,
}

/// Compute the price breakdown for a mission.
///
/// `distance_km` must be finite and strictly positive.
pub fn compute_pricing(
    distance_km: f64,
    class: ShipmentClass,
) -> Result<PricingBreakdown, DomainError> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return Err(DomainError::Validation(format!(
            "distance_km must be a positive number, got {distance_km}"
        )));
    }

    let base_price = Money::from_major(distance_km * class.rate_cents() as f64 / 100.0)?;
    let commission_amount = base_price.ratio(10, 100);
    let with_commission = base_price + commission_amount;
    let vat_amount = with_commission.ratio(20, 100);
    let final_price = with_commission + vat_amount;

    Ok(PricingBreakdown {
        base_price,
        commission_amount,
        vat_amount,
        final_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_vector_100km_standard() {
        let p = compute_pricing(100.0, ShipmentClass::Standard).expect("pricing");
        assert_eq!(p.base_price, Money::from_cents(7000));
        assert_eq!(p.commission_amount, Money::from_cents(700));
        assert_eq!(p.vat_amount, Money::from_cents(1540));
        assert_eq!(p.final_price, Money::from_cents(9240));
    }

    #[test]
    fn express_uses_its_own_rate_not_a_surcharge() {
        // 1.20/km, not 0.70 × 1.30.
        let p = compute_pricing(100.0, ShipmentClass::Express).expect("pricing");
        assert_eq!(p.base_price, Money::from_cents(12000));
        assert_eq!(p.final_price, Money::from_cents(15840));
    }

    #[test]
    fn fractional_distance_rounds_at_the_cent() {
        // 12.345 km × 0.70 = 8.6415 → 8.64; commission 0.864 → 0.86;
        // vat (8.64+0.86)×0.20 = 1.90 exact.
        let p = compute_pricing(12.345, ShipmentClass::Standard).expect("pricing");
        assert_eq!(p.base_price, Money::from_cents(864));
        assert_eq!(p.commission_amount, Money::from_cents(86));
        assert_eq!(p.vat_amount, Money::from_cents(190));
        assert_eq!(p.final_price, Money::from_cents(1140));
    }

    #[test]
    fn rejects_non_positive_and_non_finite_distance() {
        for bad in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            assert!(compute_pricing(bad, ShipmentClass::Standard).is_err());
        }
    }

    #[test]
    fn determinism() {
        let a = compute_pricing(57.3, ShipmentClass::Express).unwrap();
        let b = compute_pricing(57.3, ShipmentClass::Express).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        /// Final price strictly increases with distance for a fixed class.
        /// Steps of at least 0.02 km guarantee at least one cent of base
        /// movement at the standard rate.
        #[test]
        fn final_price_monotonic_in_distance(d in 0.1f64..5000.0, delta in 0.02f64..500.0) {
            let near = compute_pricing(d, ShipmentClass::Standard).unwrap();
            let far = compute_pricing(d + delta, ShipmentClass::Standard).unwrap();
            prop_assert!(far.final_price > near.final_price);
        }

        /// Express always beats standard for the same distance.
        #[test]
        fn express_dearer_than_standard(d in 0.1f64..5000.0) {
            let std = compute_pricing(d, ShipmentClass::Standard).unwrap();
            let exp = compute_pricing(d, ShipmentClass::Express).unwrap();
            prop_assert!(exp.final_price > std.final_price);
        }

        /// The floor invariant holds straight out of the calculator:
        /// final ≥ base × 1.10 at cent granularity.
        #[test]
        fn final_covers_base_plus_commission(d in 0.1f64..5000.0) {
            let p = compute_pricing(d, ShipmentClass::Standard).unwrap();
            let floor = p.base_price + p.base_price.ratio(10, 100);
            prop_assert!(p.final_price >= floor);
        }
    }
}
