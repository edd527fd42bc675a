//! Rule-based mitigation recommendations.
//!
//! Table lookup by (entity type, risk tier), followed by bonus rules that fire
//! on individual score components. Deterministic: the same inputs always yield
//! the same list in the same order.

use crate::{
    scoring::{shipment, supplier},
    types::{Components, EntityType, Priority, RiskTier, Severity},
};
use serde::{Deserialize, Serialize};
use Severity::{Critical as P0, High as P1, Low as P3, Medium as P2};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub rationale: String,
}

struct Rule {
    priority: Priority,
    action: &'static str,
    rationale: &'static str,
}

const fn rule(priority: Priority, action: &'static str, rationale: &'static str) -> Rule {
    Rule { priority, action, rationale }
}

// ── Supplier ─────────────────────────────────────────────────────────────────

const SUPPLIER_CRITICAL: &[Rule] = &[
    rule(P0, "Immediately activate backup supplier for all critical orders",
        "Supplier at critical risk level: primary supply chain at risk"),
    rule(P0, "Escalate to procurement director for emergency sourcing",
        "Critical risk requires executive-level intervention"),
    rule(P1, "Freeze new purchase orders until risk is resolved",
        "Prevent further exposure to high-risk supplier"),
    rule(P1, "Request financial guarantees or letters of credit",
        "Financial instability detected"),
    rule(P2, "Initiate supplier audit and performance review",
        "Document risk factors for compliance"),
];

const SUPPLIER_HIGH: &[Rule] = &[
    rule(P1, "Allocate critical orders to backup supplier",
        "High delay rate detected, diversify supply"),
    rule(P1, "Request financial guarantees or letters of credit",
        "Financial stability concerns identified"),
    rule(P2, "Increase safety stock for products from this supplier",
        "Buffer against potential supply disruption"),
    rule(P2, "Schedule performance review meeting with supplier",
        "Address quality and delivery issues"),
    rule(P3, "Identify and qualify alternative suppliers",
        "Reduce single-supplier dependency"),
];

const SUPPLIER_MEDIUM: &[Rule] = &[
    rule(P2, "Monitor supplier performance closely for next 30 days",
        "Medium risk: trend monitoring required"),
    rule(P2, "Review and update lead time buffers", "Account for potential delays"),
    rule(P3, "Request updated financial stability report", "Ensure financial data is current"),
];

const SUPPLIER_LOW: &[Rule] = &[
    rule(P3, "Continue standard monitoring schedule",
        "Supplier performing within acceptable parameters"),
];

// ── Shipment ─────────────────────────────────────────────────────────────────

const SHIPMENT_CRITICAL: &[Rule] = &[
    rule(P0, "Contact carrier immediately for shipment status update",
        "Critical delay detected, immediate action required"),
    rule(P0, "Notify receiving team and adjust production schedule",
        "Downstream operations at risk"),
    rule(P1, "Explore expedited shipping alternatives", "Consider air freight to recover delay"),
    rule(P1, "Activate contingency inventory from safety stock", "Prevent production stoppage"),
    rule(P2, "File delay claim with carrier if applicable", "Recover costs from SLA breach"),
];

const SHIPMENT_HIGH: &[Rule] = &[
    rule(P1, "Contact carrier for updated ETA and delay reason",
        "High delay risk calls for proactive communication"),
    rule(P1, "Alert downstream stakeholders of potential delay",
        "Allow time for contingency planning"),
    rule(P2, "Review weather and route conditions", "Assess if rerouting is feasible"),
    rule(P2, "Check safety stock levels for affected products", "Ensure buffer stock is adequate"),
];

const SHIPMENT_MEDIUM: &[Rule] = &[
    rule(P2, "Monitor shipment tracking closely", "Medium risk: increased monitoring recommended"),
    rule(P3, "Verify carrier contact information is current",
        "Ensure rapid communication if issues arise"),
];

const SHIPMENT_LOW: &[Rule] = &[
    rule(P3, "Continue standard shipment monitoring", "Shipment on track"),
];

// ── Inventory ────────────────────────────────────────────────────────────────

const INVENTORY_CRITICAL: &[Rule] = &[
    rule(P0, "Place emergency replenishment order immediately",
        "Stock critically low, stockout imminent"),
    rule(P0, "Activate safety stock and notify operations team",
        "Prevent production or fulfillment stoppage"),
    rule(P1, "Contact supplier for expedited delivery", "Standard lead time insufficient"),
    rule(P1, "Identify alternative suppliers for emergency sourcing",
        "Primary supplier may not meet timeline"),
    rule(P2, "Review demand forecast and adjust reorder point",
        "Prevent recurrence of stockout risk"),
];

const INVENTORY_HIGH: &[Rule] = &[
    rule(P1, "Initiate replenishment order: stock below reorder point", "Reorder point breached"),
    rule(P1, "Review and increase safety stock level",
        "Current buffer insufficient for demand variability"),
    rule(P2, "Assess demand forecast accuracy", "High variance detected in demand patterns"),
    rule(P2, "Coordinate with supplier on delivery schedule", "Align supply with demand forecast"),
];

const INVENTORY_MEDIUM: &[Rule] = &[
    rule(P2, "Monitor stock levels daily", "Approaching reorder point"),
    rule(P3, "Review demand forecast for next 30 days", "Ensure replenishment timing is accurate"),
];

const INVENTORY_LOW: &[Rule] = &[
    rule(P3, "Continue standard inventory monitoring", "Stock levels adequate"),
];

// ── Bonus rules ──────────────────────────────────────────────────────────────

const GEOPOLITICAL_BONUS: Rule = rule(
    P1,
    "Review geopolitical risk exposure and consider regional diversification",
    "Geopolitical risk flag active for supplier region",
);

const WEATHER_BONUS: Rule = rule(
    P1,
    "Monitor weather conditions along route and prepare for rerouting",
    "Severe weather conditions detected on shipment route",
);

/// Weather component at or above this earns the reroute recommendation.
const SEVERE_WEATHER_SCORE: f64 = 30.0;

fn table(entity_type: EntityType, tier: RiskTier) -> &'static [Rule] {
    use EntityType::*;
    use RiskTier::*;
    match (entity_type, tier) {
        (Supplier, Critical) => SUPPLIER_CRITICAL,
        (Supplier, High) => SUPPLIER_HIGH,
        (Supplier, Medium) => SUPPLIER_MEDIUM,
        (Supplier, Low) => SUPPLIER_LOW,
        (Shipment, Critical) => SHIPMENT_CRITICAL,
        (Shipment, High) => SHIPMENT_HIGH,
        (Shipment, Medium) => SHIPMENT_MEDIUM,
        (Shipment, Low) => SHIPMENT_LOW,
        (Inventory, Critical) => INVENTORY_CRITICAL,
        (Inventory, High) => INVENTORY_HIGH,
        (Inventory, Medium) => INVENTORY_MEDIUM,
        (Inventory, Low) => INVENTORY_LOW,
    }
}

impl Rule {
    fn to_recommendation(&self) -> Recommendation {
        Recommendation {
            priority: self.priority,
            action: self.action.to_string(),
            rationale: self.rationale.to_string(),
        }
    }
}

/// Recommendations for an entity. Unknown entity types yield an empty list.
pub fn recommend(entity_type: &str, tier: RiskTier, components: &Components) -> Vec<Recommendation> {
    let Some(kind) = EntityType::parse(entity_type) else {
        return Vec::new();
    };

    let mut out: Vec<Recommendation> = table(kind, tier).iter().map(Rule::to_recommendation).collect();
    let component = |name: &str| components.get(name).copied().unwrap_or(0.0);

    match kind {
        EntityType::Supplier if component(supplier::GEOPOLITICAL) > 0.0 => {
            out.push(GEOPOLITICAL_BONUS.to_recommendation());
        }
        EntityType::Shipment if component(shipment::WEATHER) >= SEVERE_WEATHER_SCORE => {
            out.push(WEATHER_BONUS.to_recommendation());
        }
        _ => {}
    }
    out
}
