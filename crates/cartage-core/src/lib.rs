//! # cartage-core — Domain Primitives
//!
//! Shared building blocks for the Cartage freight marketplace:
//!
//! - **Identifiers** ([`ids`]): distinct newtypes per entity — you cannot
//!   pass a [`UserId`] where a [`MissionId`] is expected.
//! - **Money** ([`money`]): fixed-point euro cents with round-half-up at
//!   the cent. No floating-point money crosses a module boundary.
//! - **Status machine** ([`status`]): mission and acceptance lifecycles
//!   with a single authoritative transition function, [`status::advance`].
//! - **Pricing** ([`pricing`]): the pure distance/class pricing calculator.
//! - **Errors** ([`error`]): the [`DomainError`] taxonomy every layer
//!   returns; no other error type crosses the engine boundary.

pub mod error;
pub mod ids;
pub mod money;
pub mod pricing;
pub mod status;

pub use error::DomainError;
pub use ids::{AcceptanceId, MissionId, UserId};
pub use money::Money;
pub use pricing::{compute_pricing, PricingBreakdown, ShipmentClass};
pub use status::{advance, AcceptanceStatus, MissionEvent, MissionStatus};
