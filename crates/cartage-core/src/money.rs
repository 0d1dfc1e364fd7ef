//! # Fixed-Point Money
//!
//! All monetary amounts are euro cents held in an `i64`. Rounding happens
//! exactly once per derived amount, at cent granularity, using round-half-up
//! so that test vectors are reproducible across platforms.
//!
//! On the wire a [`Money`] is a plain JSON number with two decimal places
//! (`92.4` / `92.40` both deserialize to 9240 cents).

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// A non-negative amount of money in euro cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Wrap an exact cent amount.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount in major units (euros), for display only.
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Convert a fractional major-unit amount (e.g. a JSON `92.4`) to cents,
    /// rounding half-up at the cent.
    ///
    /// Fails on non-finite or negative input.
    pub fn from_major(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::Validation(
                "monetary amount must be a finite number".to_string(),
            ));
        }
        if value < 0.0 {
            return Err(DomainError::Validation(
                "monetary amount must not be negative".to_string(),
            ));
        }
        Ok(Self(round_half_up_cents(value * 100.0)))
    }

    /// Multiply by `num / den` with round-half-up at the cent.
    ///
    /// Used for commission (10/100) and VAT (20/100) derivation. `den` must
    /// be positive; amounts are non-negative by construction.
    pub fn ratio(self, num: i64, den: i64) -> Money {
        debug_assert!(den > 0);
        let scaled = self.0 as i128 * num as i128;
        let den = den as i128;
        // Half-up for non-negative quantities: floor((2a + b) / 2b).
        Money(((scaled * 2 + den) / (den * 2)) as i64)
    }

    /// Divide by `num / den` rounding DOWN.
    ///
    /// Used when deriving a base price from a caller-chosen final price:
    /// rounding the base down lets the commission absorb the remainder, so
    /// `final >= base * (1 + commission_rate)` keeps holding at cent
    /// granularity.
    pub fn ratio_floor(self, num: i64, den: i64) -> Money {
        debug_assert!(den > 0);
        Money((self.0 as i128 * num as i128 / den as i128) as i64)
    }

    /// Saturating addition; amounts in this domain never approach i64::MAX.
    pub fn saturating_add(self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Checked subtraction; `None` if the result would be negative.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        let v = self.0 - other.0;
        (v >= 0).then_some(Money(v))
    }
}

/// Round a fractional cent count half-up to an integer cent count.
///
/// Decimal inputs whose nearest f64 sits just below the half-cent boundary
/// (`1.255 * 100.0 == 125.49999999999999`) must still round up like their
/// decimal reading. A few ulps of relative slack absorb the representation
/// error without reaching any value that is genuinely below the boundary.
fn round_half_up_cents(fractional_cents: f64) -> i64 {
    let slack = fractional_cents * (4.0 * f64::EPSILON);
    (fractional_cents + slack + 0.5).floor() as i64
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Money::from_major(raw).map_err(D::Error::custom)
    }
}
