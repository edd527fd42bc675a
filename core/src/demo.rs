//! Deterministic demo data.
//!
//! RULE: the same seed always produces the same organizations, suppliers,
//! shipments and inventory, so runner sessions are reproducible.
//!
//! Roughly one entity in five is generated with missing or stale inputs so
//! that low-confidence scores show up alongside clean ones.

use crate::{
    entity::{
        DemandSample, FinancialStability, InventoryItem, PerformanceMetrics, Shipment, ShipmentStatus,
        StockStatus, Supplier, SupplierStatus, TrackingEvent, WeatherRisk,
    },
    error::RiskResult,
    store::RiskStore,
};
use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::Serialize;

/// Seeded RNG for demo generation.
pub struct DemoRng {
    inner: Pcg64Mcg,
}

impl DemoRng {
    pub fn new(seed: u64) -> Self {
        Self { inner: Pcg64Mcg::seed_from_u64(seed) }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n). `n` must be non-zero.
    pub fn below(&mut self, n: u64) -> u64 {
        self.inner.next_u64() % n.max(1)
    }

    /// Uniform float in [lo, hi).
    pub fn between(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

const COMPANY_PREFIXES: &[&str] = &[
    "Summit", "Harbor", "Northwind", "Keystone", "Pioneer", "Meridian", "Atlas", "Crescent",
    "Granite", "Evergreen", "Blue Ridge", "Ironwood",
];

const COMPANY_INDUSTRIES: &[&str] = &[
    "Components", "Plastics", "Metals", "Textiles", "Electronics", "Packaging", "Chemicals",
    "Fasteners", "Logistics", "Foods",
];

const COMPANY_SUFFIXES: &[&str] = &["Inc", "Ltd", "GmbH", "Co", "Group", "Industries"];

const COUNTRIES: &[&str] = &["US", "DE", "CN", "VN", "MX", "IN", "PL", "BR", "TR", "KR"];

const CARRIERS: &[&str] = &["Maersk", "MSC", "CMA CGM", "DHL", "FedEx Freight", "Kuehne+Nagel"];

const PORTS: &[&str] = &["Rotterdam", "Shanghai", "Los Angeles", "Hamburg", "Singapore", "Busan"];

const PRODUCTS: &[&str] = &[
    "Bearing", "Gasket", "Circuit Board", "Valve", "Bracket", "Sensor", "Cable Harness", "Pump",
    "Filter", "Motor",
];

fn company_name(rng: &mut DemoRng) -> String {
    format!(
        "{} {} {}",
        rng.pick(COMPANY_PREFIXES),
        rng.pick(COMPANY_INDUSTRIES),
        rng.pick(COMPANY_SUFFIXES)
    )
}

#[derive(Debug, Clone, Copy)]
pub struct DemoSize {
    pub organizations: usize,
    pub suppliers_per_org: usize,
    pub shipments_per_org: usize,
    pub items_per_org: usize,
}

impl Default for DemoSize {
    fn default() -> Self {
        Self { organizations: 2, suppliers_per_org: 8, shipments_per_org: 12, items_per_org: 15 }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DemoSummary {
    pub organizations: Vec<String>,
    pub suppliers: usize,
    pub shipments: usize,
    pub inventory_items: usize,
}

/// Populate `store` with demo tenants. Organization ids are `demo-org-{n}`.
pub fn seed_demo(store: &RiskStore, seed: u64, size: DemoSize, now: DateTime<Utc>) -> RiskResult<DemoSummary> {
    let mut rng = DemoRng::new(seed);
    let mut summary = DemoSummary::default();

    for n in 1..=size.organizations {
        let org = format!("demo-org-{n}");
        store.insert_organization(&org, &company_name(&mut rng), now)?;

        let mut supplier_ids = Vec::new();
        for i in 1..=size.suppliers_per_org {
            let supplier = demo_supplier(&mut rng, &org, i, now);
            store.insert_supplier(&supplier)?;
            supplier_ids.push(supplier.id);
        }
        for i in 1..=size.shipments_per_org {
            store.insert_shipment(&demo_shipment(&mut rng, &org, i, &supplier_ids, now))?;
        }
        for i in 1..=size.items_per_org {
            store.insert_inventory_item(&demo_item(&mut rng, &org, i, &supplier_ids))?;
        }

        summary.suppliers += size.suppliers_per_org;
        summary.shipments += size.shipments_per_org;
        summary.inventory_items += size.items_per_org;
        summary.organizations.push(org);
    }

    log::info!(
        "demo data seeded: seed={seed} orgs={} suppliers={} shipments={} items={}",
        summary.organizations.len(),
        summary.suppliers,
        summary.shipments,
        summary.inventory_items
    );
    Ok(summary)
}

fn demo_supplier(rng: &mut DemoRng, org: &str, n: usize, now: DateTime<Utc>) -> Supplier {
    let sparse = rng.chance(0.2);
    let updated = now - Duration::days(rng.below(120) as i64);

    Supplier {
        id: format!("{org}-sup-{n}"),
        organization_id: org.to_string(),
        supplier_code: format!("SUP-{n:04}"),
        name: company_name(rng),
        country: rng.pick(COUNTRIES).to_string(),
        status: if rng.chance(0.15) { SupplierStatus::UnderWatch } else { SupplierStatus::Active },
        financial_stability: (!sparse).then(|| FinancialStability {
            score: Some(rng.between(20.0, 95.0).round()),
            last_updated: Some(updated),
        }),
        performance_metrics: (!sparse).then(|| PerformanceMetrics {
            on_time_delivery_rate: Some(rng.between(60.0, 99.0).round()),
            defect_rate: Some((rng.between(0.0, 8.0) * 10.0).round() / 10.0),
            dispute_frequency: Some(rng.below(12) as f64),
            last_updated: Some(updated),
        }),
        geopolitical_risk_flag: rng.chance(0.15),
        version: 0,
    }
}

fn demo_shipment(rng: &mut DemoRng, org: &str, n: usize, supplier_ids: &[String], now: DateTime<Utc>) -> Shipment {
    const WEATHER: [WeatherRisk; 4] = [WeatherRisk::Low, WeatherRisk::Medium, WeatherRisk::High, WeatherRisk::Severe];

    // ETA anywhere from three days ago to five days out.
    let eta = now + Duration::hours(rng.below(192) as i64 - 72);
    let events = (0..rng.below(4))
        .map(|k| TrackingEvent {
            timestamp: now - Duration::hours((rng.below(30) + k * 6) as i64),
            location: rng.pick(PORTS).to_string(),
            status: "inTransit".into(),
        })
        .rev()
        .collect();
    let supplier_id = if supplier_ids.is_empty() {
        None
    } else {
        Some(supplier_ids[rng.below(supplier_ids.len() as u64) as usize].clone())
    };

    Shipment {
        id: format!("{org}-shp-{n}"),
        organization_id: org.to_string(),
        shipment_number: format!("SHP-{n:05}"),
        supplier_id,
        carrier: rng.pick(CARRIERS).to_string(),
        status: if eta < now { ShipmentStatus::Delayed } else { ShipmentStatus::InTransit },
        estimated_arrival: (!rng.chance(0.1)).then_some(eta),
        weather_risk: (!rng.chance(0.1)).then(|| WEATHER[rng.below(4) as usize]),
        route_risk_index: Some(rng.between(0.0, 100.0).round()),
        carrier_reliability: (!rng.chance(0.1)).then(|| rng.between(70.0, 99.0).round()),
        tracking_events: events,
        version: 0,
    }
}

fn demo_item(rng: &mut DemoRng, org: &str, n: usize, supplier_ids: &[String]) -> InventoryItem {
    let demand = rng.between(2.0, 40.0).round();
    let reorder_point = demand * 10.0;
    let history = (1..=rng.below(7))
        .map(|month| {
            let forecast = demand * 30.0;
            DemandSample {
                period: format!("2026-{month:02}"),
                forecasted_demand: forecast,
                actual_demand: Some((forecast * rng.between(0.6, 1.4)).round()),
            }
        })
        .collect();
    let supplier_id = if supplier_ids.is_empty() || rng.chance(0.1) {
        None
    } else {
        Some(supplier_ids[rng.below(supplier_ids.len() as u64) as usize].clone())
    };

    InventoryItem {
        id: format!("{org}-inv-{n}"),
        organization_id: org.to_string(),
        sku: format!("SKU-{n:05}"),
        product_name: format!("{} {}", rng.pick(PRODUCTS), rng.pick(&["A", "B", "C", "X", "Pro"])),
        current_stock: if rng.chance(0.1) { 0.0 } else { (reorder_point * rng.between(0.2, 3.0)).round() },
        reorder_point,
        safety_stock: demand * 4.0,
        lead_time_days: rng.between(5.0, 30.0).round(),
        average_daily_demand: demand,
        demand_history: history,
        supplier_id,
        days_of_cover: 0.0,
        stock_status: StockStatus::Adequate,
        version: 0,
    }
}
