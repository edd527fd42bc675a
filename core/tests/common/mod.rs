//! Shared fixtures: an in-memory engine on a manual clock, plus entity builders.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use riskwatch_core::{
    alert::{Alert, AlertType},
    audit::{AuditEntry, AuditSink},
    clock::ManualClock,
    config::EngineConfig,
    dispatcher::DispatchParams,
    engine::RiskEngine,
    entity::{
        DemandSample, FinancialStability, InventoryItem, PerformanceMetrics, Shipment, ShipmentStatus,
        StockStatus, Supplier, SupplierStatus, TrackingEvent, WeatherRisk,
    },
    error::{RiskError, RiskResult},
    store::RiskStore,
    types::{Components, EntityType, Severity},
};
use std::sync::Arc;

pub const ORG: &str = "org-acme";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
}

pub struct Fixture {
    pub engine: RiskEngine,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::on(RiskStore::in_memory().unwrap())
    }

    /// Backed by a named shared-cache memory database, so a test can open a
    /// second raw connection to `uri` and tamper with rows.
    pub fn shared(name: &str) -> (Self, String) {
        let uri = format!("file:{name}_{}?mode=memory&cache=shared", uuid::Uuid::new_v4().simple());
        (Self::on(RiskStore::open(&uri).unwrap()), uri)
    }

    fn on(store: RiskStore) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        store.migrate().unwrap();
        store.insert_organization(ORG, "Acme Manufacturing", start_time()).unwrap();

        let clock = Arc::new(ManualClock::new(start_time()));
        let engine = RiskEngine::new(Arc::new(store), EngineConfig::default()).with_clock(clock.clone());
        Self { engine, clock }
    }

    /// Every audit write from here on fails.
    pub fn with_failing_audit(mut self) -> Self {
        self.engine = self.engine.with_audit(Arc::new(UnavailableAudit));
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.engine.now()
    }

    pub fn dispatch_supplier_alert(&self, entity_id: &str, severity: Severity) -> Option<Alert> {
        self.engine
            .dispatcher()
            .dispatch(DispatchParams {
                organization_id: ORG.into(),
                alert_type: AlertType::SupplierRisk,
                severity,
                title: format!("Supplier Risk Alert: {entity_id}"),
                description: "test".into(),
                related_entity_type: EntityType::Supplier,
                related_entity_id: entity_id.into(),
                risk_score_id: None,
                score_components: Components::new(),
                cooldown_ms: None,
            })
            .unwrap()
    }
}

pub struct UnavailableAudit;

impl AuditSink for UnavailableAudit {
    fn create_log(&self, _entry: &AuditEntry) -> RiskResult<()> {
        Err(RiskError::Other(anyhow::anyhow!("audit store unavailable")))
    }
}

/// A supplier with complete, fresh data and a low score.
pub fn healthy_supplier(id: &str, now: DateTime<Utc>) -> Supplier {
    Supplier {
        id: id.into(),
        organization_id: ORG.into(),
        supplier_code: format!("SUP-{id}"),
        name: format!("Supplier {id}"),
        country: "DE".into(),
        status: SupplierStatus::Active,
        financial_stability: Some(FinancialStability {
            score: Some(85.0),
            last_updated: Some(now - Duration::days(5)),
        }),
        performance_metrics: Some(PerformanceMetrics {
            on_time_delivery_rate: Some(97.0),
            defect_rate: Some(1.0),
            dispute_frequency: Some(0.0),
            last_updated: Some(now - Duration::days(2)),
        }),
        geopolitical_risk_flag: false,
        version: 0,
    }
}

/// Scores 76 under the default band: high.
pub fn risky_supplier(id: &str, now: DateTime<Utc>) -> Supplier {
    Supplier {
        financial_stability: Some(FinancialStability {
            score: Some(5.0),
            last_updated: Some(now - Duration::days(5)),
        }),
        performance_metrics: Some(PerformanceMetrics {
            on_time_delivery_rate: Some(10.0),
            defect_rate: Some(80.0),
            dispute_frequency: Some(10.0),
            last_updated: Some(now - Duration::days(2)),
        }),
        geopolitical_risk_flag: true,
        ..healthy_supplier(id, now)
    }
}

pub fn late_shipment(id: &str, now: DateTime<Utc>) -> Shipment {
    Shipment {
        id: id.into(),
        organization_id: ORG.into(),
        shipment_number: format!("SHP-{id}"),
        supplier_id: None,
        carrier: "Maersk".into(),
        status: ShipmentStatus::Delayed,
        estimated_arrival: Some(now - Duration::hours(48)),
        weather_risk: Some(WeatherRisk::Severe),
        route_risk_index: Some(100.0),
        carrier_reliability: Some(0.0),
        tracking_events: vec![TrackingEvent {
            timestamp: now - Duration::hours(30),
            location: "Rotterdam".into(),
            status: "inTransit".into(),
        }],
        version: 0,
    }
}

pub fn inventory_item(id: &str, stock: f64, supplier_id: Option<&str>) -> InventoryItem {
    InventoryItem {
        id: id.into(),
        organization_id: ORG.into(),
        sku: format!("SKU-{id}"),
        product_name: format!("Part {id}"),
        current_stock: stock,
        reorder_point: 100.0,
        safety_stock: 40.0,
        lead_time_days: 10.0,
        average_daily_demand: 10.0,
        demand_history: vec![
            DemandSample { period: "2026-04".into(), forecasted_demand: 300.0, actual_demand: Some(290.0) },
            DemandSample { period: "2026-05".into(), forecasted_demand: 300.0, actual_demand: Some(310.0) },
        ],
        supplier_id: supplier_id.map(str::to_string),
        days_of_cover: 0.0,
        stock_status: StockStatus::Adequate,
        version: 0,
    }
}
