//! Per-organization configuration: tier thresholds, escalation overrides,
//! alert cooldowns and agent run bookkeeping.
//!
//! One row per organization, created lazily with the defaults below the first
//! time anything asks for it. Threshold bands are validated on every write.

use crate::{
    alert::AlertType,
    error::{RiskError, RiskResult},
    types::{EntityType, OrgId, Severity},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper bounds (inclusive) of the low, medium and high tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdBand {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// 0–30 low, 31–60 medium, 61–80 high, 81–100 critical.
pub const DEFAULT_BAND: ThresholdBand = ThresholdBand { low: 30.0, medium: 60.0, high: 80.0 };

impl Default for ThresholdBand {
    fn default() -> Self {
        DEFAULT_BAND
    }
}

impl ThresholdBand {
    pub fn validate(&self, name: &str) -> RiskResult<()> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !(in_range(self.low) && in_range(self.medium) && in_range(self.high)) {
            return Err(RiskError::validation(format!(
                "{name} thresholds must lie within 0..=100"
            )));
        }
        if self.low >= self.medium || self.medium >= self.high {
            return Err(RiskError::validation(format!(
                "{name} thresholds must be in ascending order: low < medium < high"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct RiskThresholds {
    pub supplier: ThresholdBand,
    pub shipment: ThresholdBand,
    pub inventory: ThresholdBand,
}

impl RiskThresholds {
    pub fn for_entity(&self, entity_type: EntityType) -> ThresholdBand {
        match entity_type {
            EntityType::Supplier => self.supplier,
            EntityType::Shipment => self.shipment,
            EntityType::Inventory => self.inventory,
        }
    }

    pub fn validate(&self) -> RiskResult<()> {
        self.supplier.validate("Supplier")?;
        self.shipment.validate("Shipment")?;
        self.inventory.validate("Inventory")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRule {
    pub severity: Severity,
    pub level: u8,
    pub timeout_minutes: u32,
    pub escalate_to_role: String,
}

impl EscalationRule {
    fn new(severity: Severity, level: u8, timeout_minutes: u32, role: &str) -> Self {
        Self { severity, level, timeout_minutes, escalate_to_role: role.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationConfig {
    pub organization_id: OrgId,
    pub risk_thresholds: RiskThresholds,
    pub alert_escalation_rules: Vec<EscalationRule>,
    /// Alert type → cooldown in milliseconds.
    pub alert_cooldowns: BTreeMap<AlertType, i64>,
    /// Notification recipients for high/critical alerts.
    #[serde(default)]
    pub notification_recipients: Vec<String>,
    /// Agent run key → last successful run. Best-effort bookkeeping.
    #[serde(default)]
    pub last_agent_run: BTreeMap<String, DateTime<Utc>>,
}

impl OrganizationConfig {
    /// The configuration a new organization starts with.
    pub fn with_defaults(organization_id: impl Into<OrgId>) -> Self {
        let alert_escalation_rules = vec![
            EscalationRule::new(Severity::Critical, 0, 15, "riskAnalyst"),
            EscalationRule::new(Severity::Critical, 1, 30, "orgAdmin"),
            EscalationRule::new(Severity::Critical, 2, 60, "superAdmin"),
            EscalationRule::new(Severity::High, 0, 30, "riskAnalyst"),
            EscalationRule::new(Severity::High, 1, 60, "orgAdmin"),
            EscalationRule::new(Severity::High, 2, 120, "superAdmin"),
        ];
        let alert_cooldowns = [
            AlertType::SupplierRisk,
            AlertType::ShipmentDelay,
            AlertType::InventoryStockout,
        ]
        .into_iter()
        .map(|t| (t, t.default_cooldown_ms()))
        .collect();

        Self {
            organization_id: organization_id.into(),
            risk_thresholds: RiskThresholds::default(),
            alert_escalation_rules,
            alert_cooldowns,
            notification_recipients: Vec::new(),
            last_agent_run: BTreeMap::new(),
        }
    }

    /// Write-time invariants. Called by the store before every save.
    pub fn validate(&self) -> RiskResult<()> {
        self.risk_thresholds.validate()?;
        for rule in &self.alert_escalation_rules {
            if rule.level > 3 {
                return Err(RiskError::validation(format!(
                    "escalation rule level {} out of range 0..=3",
                    rule.level
                )));
            }
            if rule.timeout_minutes == 0 {
                return Err(RiskError::validation("escalation rule timeout must be >= 1 minute"));
            }
        }
        if let Some((alert_type, ms)) = self.alert_cooldowns.iter().find(|(_, ms)| **ms < 0) {
            return Err(RiskError::validation(format!(
                "cooldown for {alert_type} must not be negative (got {ms})"
            )));
        }
        Ok(())
    }

    pub fn cooldown_ms(&self, alert_type: AlertType) -> Option<i64> {
        self.alert_cooldowns.get(&alert_type).copied()
    }
}
