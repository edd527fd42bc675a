//! Alerts and their lifecycle state machine.
//!
//! ```text
//! generated ─► assigned ─► acknowledged ─► inReview ─► resolved
//!     │           │  ▲           │             │
//!     │           └──┘ reassign  └─► resolved  │
//!     └───────────┴──────────────┴─────────────┴─► archived
//! ```
//!
//! `resolved` and `archived` are terminal. Every mutation bumps `version`.

use crate::{
    recommendation::Recommendation,
    types::{AlertId, EntityId, EntityType, OrgId, Severity},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Baseline cooldown. Shipment delays use it as is.
pub const DEFAULT_COOLDOWN_MS: i64 = HOUR_MS;

/// Escalation never goes past this level.
pub const MAX_ESCALATION_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum AlertType {
    SupplierRisk,
    ShipmentDelay,
    InventoryLow,
    InventoryStockout,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupplierRisk => "supplierRisk",
            Self::ShipmentDelay => "shipmentDelay",
            Self::InventoryLow => "inventoryLow",
            Self::InventoryStockout => "inventoryStockout",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "supplierRisk" => Some(Self::SupplierRisk),
            "shipmentDelay" => Some(Self::ShipmentDelay),
            "inventoryLow" => Some(Self::InventoryLow),
            "inventoryStockout" => Some(Self::InventoryStockout),
            _ => None,
        }
    }

    /// Hardcoded cooldown used when the organization sets none.
    pub fn default_cooldown_ms(&self) -> i64 {
        match self {
            Self::SupplierRisk => 4 * HOUR_MS,
            Self::ShipmentDelay => DEFAULT_COOLDOWN_MS,
            Self::InventoryLow | Self::InventoryStockout => 2 * HOUR_MS,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    Generated,
    Assigned,
    Acknowledged,
    InReview,
    Resolved,
    Archived,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::Assigned => "assigned",
            Self::Acknowledged => "acknowledged",
            Self::InReview => "inReview",
            Self::Resolved => "resolved",
            Self::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generated" => Some(Self::Generated),
            "assigned" => Some(Self::Assigned),
            "acknowledged" => Some(Self::Acknowledged),
            "inReview" => Some(Self::InReview),
            "resolved" => Some(Self::Resolved),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }

    /// Statuses reachable from this one.
    pub fn valid_transitions(&self) -> &'static [AlertStatus] {
        use AlertStatus::*;
        match self {
            Generated => &[Assigned, Archived],
            Assigned => &[Assigned, Acknowledged, Archived],
            Acknowledged => &[InReview, Resolved, Archived],
            InReview => &[Resolved, Archived],
            Resolved | Archived => &[],
        }
    }

    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Statuses the escalation engine watches: someone owns the alert but
    /// has not closed it.
    pub const ESCALATABLE: [AlertStatus; 3] = [Self::Assigned, Self::Acknowledged, Self::InReview];
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EscalationEntry {
    /// The level reached by this escalation.
    pub level: u8,
    pub escalated_at: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub organization_id: OrgId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub related_entity_type: EntityType,
    pub related_entity_id: EntityId,
    pub risk_score_id: Option<String>,
    pub status: AlertStatus,
    pub assigned_to: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
    pub escalation_level: u8,
    pub escalation_history: Vec<EscalationEntry>,
    pub recommendations: Vec<Recommendation>,
    pub cooldown_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Alert {
    /// Escalation timer origin: the latest escalation, else the assignment.
    pub fn escalation_reference_time(&self) -> Option<DateTime<Utc>> {
        self.escalation_history
            .last()
            .map(|e| e.escalated_at)
            .or(self.assigned_at)
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none() && !self.status.is_terminal()
    }
}
