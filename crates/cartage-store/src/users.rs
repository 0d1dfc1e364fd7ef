//! # User Directory
//!
//! Minimal account records consumed by the core: shipper validation at
//! mission creation and carrier summaries for dashboard joins. Account
//! management itself (registration, documents, reviews) lives outside the
//! core and feeds this directory.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use cartage_core::UserId;

/// Platform role of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Shipper,
    Carrier,
}

/// An account record, as the core sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    pub active: bool,
    pub avatar: Option<String>,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub completed_missions: u32,
}

impl UserRecord {
    /// A fresh active account with no history.
    pub fn new(name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            role,
            active: true,
            avatar: None,
            average_rating: 0.0,
            total_reviews: 0,
            completed_missions: 0,
        }
    }
}

/// Party summary joined into mission and dashboard projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySummary {
    pub id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub average_rating: f64,
    pub total_reviews: u32,
}

/// Thread-safe account directory.
#[derive(Default)]
pub struct UserDirectory {
    users: DashMap<UserId, UserRecord>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.insert(user.id, user);
    }

    pub fn get(&self, id: &UserId) -> Option<UserRecord> {
        self.users.get(id).map(|u| u.clone())
    }

    /// Whether `id` names an existing, active shipper account.
    pub fn is_active_shipper(&self, id: &UserId) -> bool {
        self.users
            .get(id)
            .map(|u| u.active && u.role == Role::Shipper)
            .unwrap_or(false)
    }

    /// Whether `id` names an existing, active carrier account.
    pub fn is_active_carrier(&self, id: &UserId) -> bool {
        self.users
            .get(id)
            .map(|u| u.active && u.role == Role::Carrier)
            .unwrap_or(false)
    }

    /// Summary for projection joins; `None` if the account is unknown.
    pub fn party_summary(&self, id: &UserId) -> Option<PartySummary> {
        self.users.get(id).map(|u| PartySummary {
            id: u.id,
            name: u.name.clone(),
            avatar: u.avatar.clone(),
            average_rating: u.average_rating,
            total_reviews: u.total_reviews,
        })
    }
}
