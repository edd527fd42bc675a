//! Snapshots of the supply-chain entities the agents evaluate.
//!
//! Entity CRUD belongs to the surrounding application; the engine only needs
//! to read these rows, and to write them back under a version check.
//! Derived fields are recomputed by `derive_inventory_fields` before every
//! inventory write, never implicitly.

use crate::{
    error::{RiskError, RiskResult},
    types::{EntityId, OrgId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Supplier ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SupplierStatus {
    Active,
    UnderWatch,
    HighRisk,
    Inactive,
    Suspended,
}

impl SupplierStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::UnderWatch => "underWatch",
            Self::HighRisk => "highRisk",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "underWatch" => Self::UnderWatch,
            "highRisk" => Self::HighRisk,
            "inactive" => Self::Inactive,
            "suspended" => Self::Suspended,
            _ => Self::Active,
        }
    }

    /// Statuses the supplier agent keeps evaluating.
    pub const MONITORED: [SupplierStatus; 3] = [Self::Active, Self::UnderWatch, Self::HighRisk];
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialStability {
    /// 0–100, higher is healthier.
    pub score: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    /// Percentage of shipments delivered on time.
    pub on_time_delivery_rate: Option<f64>,
    /// Percentage of defective units.
    pub defect_rate: Option<f64>,
    /// Disputes per year.
    pub dispute_frequency: Option<f64>,
    /// Last time shipment activity refreshed these metrics.
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub id: EntityId,
    pub organization_id: OrgId,
    pub supplier_code: String,
    pub name: String,
    pub country: String,
    pub status: SupplierStatus,
    pub financial_stability: Option<FinancialStability>,
    pub performance_metrics: Option<PerformanceMetrics>,
    pub geopolitical_risk_flag: bool,
    pub version: i64,
}

// ── Shipment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ShipmentStatus {
    Registered,
    InTransit,
    Delayed,
    Rerouted,
    Delivered,
    Cancelled,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::InTransit => "inTransit",
            Self::Delayed => "delayed",
            Self::Rerouted => "rerouted",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "inTransit" => Self::InTransit,
            "delayed" => Self::Delayed,
            "rerouted" => Self::Rerouted,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            _ => Self::Registered,
        }
    }

    /// Statuses the shipment agent keeps evaluating.
    pub const ACTIVE: [ShipmentStatus; 4] =
        [Self::Registered, Self::InTransit, Self::Delayed, Self::Rerouted];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum WeatherRisk {
    Low,
    Medium,
    High,
    Severe,
}

impl WeatherRisk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Severe => "severe",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "severe" => Some(Self::Severe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEvent {
    pub timestamp: DateTime<Utc>,
    pub location: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: EntityId,
    pub organization_id: OrgId,
    pub shipment_number: String,
    pub supplier_id: Option<EntityId>,
    pub carrier: String,
    pub status: ShipmentStatus,
    pub estimated_arrival: Option<DateTime<Utc>>,
    pub weather_risk: Option<WeatherRisk>,
    /// 0–100 route hazard index.
    pub route_risk_index: Option<f64>,
    /// 0–100 carrier on-time reliability.
    pub carrier_reliability: Option<f64>,
    /// Chronological; the last entry is the most recent event.
    pub tracking_events: Vec<TrackingEvent>,
    pub version: i64,
}

// ── Inventory ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StockStatus {
    Adequate,
    Low,
    Critical,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adequate => "adequate",
            Self::Low => "low",
            Self::Critical => "critical",
            Self::OutOfStock => "outOfStock",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "low" => Self::Low,
            "critical" => Self::Critical,
            "outOfStock" => Self::OutOfStock,
            _ => Self::Adequate,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemandSample {
    /// e.g. "2026-06"
    pub period: String,
    pub forecasted_demand: f64,
    pub actual_demand: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: EntityId,
    pub organization_id: OrgId,
    pub sku: String,
    pub product_name: String,
    pub current_stock: f64,
    pub reorder_point: f64,
    pub safety_stock: f64,
    pub lead_time_days: f64,
    pub average_daily_demand: f64,
    pub demand_history: Vec<DemandSample>,
    pub supplier_id: Option<EntityId>,
    /// Derived: see `derive_inventory_fields`.
    pub days_of_cover: f64,
    /// Derived: see `derive_inventory_fields`.
    pub stock_status: StockStatus,
    pub version: i64,
}

/// Days of cover reported when there is stock but no demand.
pub const UNBOUNDED_COVER_DAYS: f64 = 999.0;

/// Recompute days-of-cover and stock status. Rejects negative stock.
pub fn derive_inventory_fields(item: &mut InventoryItem) -> RiskResult<()> {
    if item.current_stock < 0.0 {
        return Err(RiskError::validation(format!(
            "inventory '{}': stock cannot be negative ({})",
            item.sku, item.current_stock
        )));
    }

    item.days_of_cover = if item.average_daily_demand > 0.0 {
        item.current_stock / item.average_daily_demand
    } else if item.current_stock > 0.0 {
        UNBOUNDED_COVER_DAYS
    } else {
        0.0
    };

    item.stock_status = if item.current_stock <= 0.0 {
        StockStatus::OutOfStock
    } else if item.current_stock <= item.safety_stock {
        StockStatus::Critical
    } else if item.current_stock <= item.reorder_point {
        StockStatus::Low
    } else {
        StockStatus::Adequate
    };

    Ok(())
}
