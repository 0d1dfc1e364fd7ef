//! # cartage-store — Durable Records
//!
//! In-memory stores backed by `DashMap`, one entry lock per mission. Every
//! guarded mutation (carrier binding, status advance, price raise,
//! selection settling) runs its read-validate-write cycle under a single
//! entry lock, so transitions are TOCTOU-free within a process. The SQL
//! write-through layer in `cartage-api` carries the equivalent guards for
//! multi-process deployments (conditional update + affected-row check,
//! unique key on `(mission_id, carrier_id)`).
//!
//! Only the lifecycle engine calls the mutating methods; projections read.

pub mod ledger;
pub mod mission;
pub mod mission_store;
pub mod users;

pub use ledger::AcceptanceLedger;
pub use mission::{GoodsDetails, Mission, MissionAcceptance, PricingBlock, Stop, TemperatureRange};
pub use mission_store::MissionStore;
pub use users::{PartySummary, Role, UserDirectory, UserRecord};
