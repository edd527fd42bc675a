//! Supplier, shipment and inventory queries.
//!
//! Every update is a compare-and-swap on `version`; the stored row comes back
//! with the bumped version.

use super::{
    check_versioned_update, json_col, opt_json_col, opt_ts, opt_ts_col, RiskStore,
};
use crate::{
    entity::{
        derive_inventory_fields, InventoryItem, Shipment, ShipmentStatus, StockStatus, Supplier,
        SupplierStatus, WeatherRisk,
    },
    error::{RiskError, RiskResult},
};
use rusqlite::{params, OptionalExtension, Row};

const SUPPLIER_COLUMNS: &str = "id, organization_id, supplier_code, name, country, status,
    financial_stability, performance_metrics, geopolitical_risk_flag, version";

const SHIPMENT_COLUMNS: &str = "id, organization_id, shipment_number, supplier_id, carrier,
    status, estimated_arrival, weather_risk, route_risk_index, carrier_reliability,
    tracking_events, version";

const INVENTORY_COLUMNS: &str = "id, organization_id, sku, product_name, current_stock,
    reorder_point, safety_stock, lead_time_days, average_daily_demand, demand_history,
    supplier_id, days_of_cover, stock_status, version";

fn supplier_from_row(r: &Row<'_>) -> rusqlite::Result<Supplier> {
    Ok(Supplier {
        id: r.get(0)?,
        organization_id: r.get(1)?,
        supplier_code: r.get(2)?,
        name: r.get(3)?,
        country: r.get(4)?,
        status: SupplierStatus::parse(&r.get::<_, String>(5)?),
        financial_stability: opt_json_col(r, 6)?,
        performance_metrics: opt_json_col(r, 7)?,
        geopolitical_risk_flag: r.get::<_, i32>(8)? != 0,
        version: r.get(9)?,
    })
}

fn shipment_from_row(r: &Row<'_>) -> rusqlite::Result<Shipment> {
    Ok(Shipment {
        id: r.get(0)?,
        organization_id: r.get(1)?,
        shipment_number: r.get(2)?,
        supplier_id: r.get(3)?,
        carrier: r.get(4)?,
        status: ShipmentStatus::parse(&r.get::<_, String>(5)?),
        estimated_arrival: opt_ts_col(r, 6)?,
        weather_risk: r
            .get::<_, Option<String>>(7)?
            .as_deref()
            .and_then(WeatherRisk::parse),
        route_risk_index: r.get(8)?,
        carrier_reliability: r.get(9)?,
        tracking_events: json_col(r, 10)?,
        version: r.get(11)?,
    })
}

fn inventory_from_row(r: &Row<'_>) -> rusqlite::Result<InventoryItem> {
    Ok(InventoryItem {
        id: r.get(0)?,
        organization_id: r.get(1)?,
        sku: r.get(2)?,
        product_name: r.get(3)?,
        current_stock: r.get(4)?,
        reorder_point: r.get(5)?,
        safety_stock: r.get(6)?,
        lead_time_days: r.get(7)?,
        average_daily_demand: r.get(8)?,
        demand_history: json_col(r, 9)?,
        supplier_id: r.get(10)?,
        days_of_cover: r.get(11)?,
        stock_status: StockStatus::parse(&r.get::<_, String>(12)?),
        version: r.get(13)?,
    })
}

impl RiskStore {
    // ── Suppliers ──────────────────────────────────────────────

    pub fn insert_supplier(&self, s: &Supplier) -> RiskResult<()> {
        self.conn().execute(
            "INSERT INTO supplier (id, organization_id, supplier_code, name, country, status,
                financial_stability, performance_metrics, geopolitical_risk_flag, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0)",
            params![
                s.id,
                s.organization_id,
                s.supplier_code,
                s.name,
                s.country,
                s.status.as_str(),
                s.financial_stability.as_ref().map(serde_json::to_string).transpose()?,
                s.performance_metrics.as_ref().map(serde_json::to_string).transpose()?,
                s.geopolitical_risk_flag as i32,
            ],
        )?;
        Ok(())
    }

    /// Suppliers the supplier agent evaluates: active, under watch or high risk.
    pub fn find_active_suppliers(&self, organization_id: &str) -> RiskResult<Vec<Supplier>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUPPLIER_COLUMNS} FROM supplier
             WHERE organization_id=?1 AND status IN ('active', 'underWatch', 'highRisk')
             ORDER BY supplier_code"
        ))?;
        let rows = stmt.query_map(params![organization_id], supplier_from_row)?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }

    pub fn get_supplier(&self, organization_id: &str, id: &str) -> RiskResult<Supplier> {
        self.conn()
            .query_row(
                &format!("SELECT {SUPPLIER_COLUMNS} FROM supplier WHERE id=?1 AND organization_id=?2"),
                params![id, organization_id],
                supplier_from_row,
            )
            .optional()?
            .ok_or_else(|| RiskError::not_found("supplier", id))
    }

    pub fn update_supplier(&self, s: &Supplier, expected_version: i64) -> RiskResult<Supplier> {
        let conn = self.conn();
        let n = conn.execute(
            "UPDATE supplier SET name=?1, country=?2, status=?3, financial_stability=?4,
                performance_metrics=?5, geopolitical_risk_flag=?6, version=version+1
             WHERE id=?7 AND organization_id=?8 AND version=?9",
            params![
                s.name,
                s.country,
                s.status.as_str(),
                s.financial_stability.as_ref().map(serde_json::to_string).transpose()?,
                s.performance_metrics.as_ref().map(serde_json::to_string).transpose()?,
                s.geopolitical_risk_flag as i32,
                s.id,
                s.organization_id,
                expected_version,
            ],
        )?;
        check_versioned_update(&conn, n, "supplier", &s.id, &s.organization_id, expected_version)?;
        Ok(Supplier { version: expected_version + 1, ..s.clone() })
    }

    // ── Shipments ──────────────────────────────────────────────

    pub fn insert_shipment(&self, s: &Shipment) -> RiskResult<()> {
        self.conn().execute(
            "INSERT INTO shipment (id, organization_id, shipment_number, supplier_id, carrier,
                status, estimated_arrival, weather_risk, route_risk_index, carrier_reliability,
                tracking_events, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
            params![
                s.id,
                s.organization_id,
                s.shipment_number,
                s.supplier_id,
                s.carrier,
                s.status.as_str(),
                opt_ts(s.estimated_arrival),
                s.weather_risk.map(|w| w.as_str()),
                s.route_risk_index,
                s.carrier_reliability,
                serde_json::to_string(&s.tracking_events)?,
            ],
        )?;
        Ok(())
    }

    /// Shipments still moving: registered, in transit, delayed or rerouted.
    pub fn find_active_shipments(&self, organization_id: &str) -> RiskResult<Vec<Shipment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SHIPMENT_COLUMNS} FROM shipment
             WHERE organization_id=?1
               AND status IN ('registered', 'inTransit', 'delayed', 'rerouted')
             ORDER BY shipment_number"
        ))?;
        let rows = stmt.query_map(params![organization_id], shipment_from_row)?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }

    pub fn get_shipment(&self, organization_id: &str, id: &str) -> RiskResult<Shipment> {
        self.conn()
            .query_row(
                &format!("SELECT {SHIPMENT_COLUMNS} FROM shipment WHERE id=?1 AND organization_id=?2"),
                params![id, organization_id],
                shipment_from_row,
            )
            .optional()?
            .ok_or_else(|| RiskError::not_found("shipment", id))
    }

    pub fn update_shipment(&self, s: &Shipment, expected_version: i64) -> RiskResult<Shipment> {
        let conn = self.conn();
        let n = conn.execute(
            "UPDATE shipment SET carrier=?1, status=?2, estimated_arrival=?3, weather_risk=?4,
                route_risk_index=?5, carrier_reliability=?6, tracking_events=?7,
                version=version+1
             WHERE id=?8 AND organization_id=?9 AND version=?10",
            params![
                s.carrier,
                s.status.as_str(),
                opt_ts(s.estimated_arrival),
                s.weather_risk.map(|w| w.as_str()),
                s.route_risk_index,
                s.carrier_reliability,
                serde_json::to_string(&s.tracking_events)?,
                s.id,
                s.organization_id,
                expected_version,
            ],
        )?;
        check_versioned_update(&conn, n, "shipment", &s.id, &s.organization_id, expected_version)?;
        Ok(Shipment { version: expected_version + 1, ..s.clone() })
    }

    // ── Inventory ──────────────────────────────────────────────

    /// Derived fields are recomputed before the write; the stored copy is returned.
    pub fn insert_inventory_item(&self, item: &InventoryItem) -> RiskResult<InventoryItem> {
        let mut item = item.clone();
        derive_inventory_fields(&mut item)?;
        item.version = 0;
        self.conn().execute(
            "INSERT INTO inventory_item (id, organization_id, sku, product_name, current_stock,
                reorder_point, safety_stock, lead_time_days, average_daily_demand,
                demand_history, supplier_id, days_of_cover, stock_status, version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)",
            params![
                item.id,
                item.organization_id,
                item.sku,
                item.product_name,
                item.current_stock,
                item.reorder_point,
                item.safety_stock,
                item.lead_time_days,
                item.average_daily_demand,
                serde_json::to_string(&item.demand_history)?,
                item.supplier_id,
                item.days_of_cover,
                item.stock_status.as_str(),
            ],
        )?;
        Ok(item)
    }

    pub fn find_active_inventory(&self, organization_id: &str) -> RiskResult<Vec<InventoryItem>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory_item
             WHERE organization_id=?1
             ORDER BY sku"
        ))?;
        let rows = stmt.query_map(params![organization_id], inventory_from_row)?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }

    pub fn get_inventory_item(&self, organization_id: &str, id: &str) -> RiskResult<InventoryItem> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {INVENTORY_COLUMNS} FROM inventory_item WHERE id=?1 AND organization_id=?2"
                ),
                params![id, organization_id],
                inventory_from_row,
            )
            .optional()?
            .ok_or_else(|| RiskError::not_found("inventory_item", id))
    }

    pub fn update_inventory_item(&self, item: &InventoryItem, expected_version: i64) -> RiskResult<InventoryItem> {
        let mut item = item.clone();
        derive_inventory_fields(&mut item)?;
        let conn = self.conn();
        let n = conn.execute(
            "UPDATE inventory_item SET product_name=?1, current_stock=?2, reorder_point=?3,
                safety_stock=?4, lead_time_days=?5, average_daily_demand=?6, demand_history=?7,
                supplier_id=?8, days_of_cover=?9, stock_status=?10, version=version+1
             WHERE id=?11 AND organization_id=?12 AND version=?13",
            params![
                item.product_name,
                item.current_stock,
                item.reorder_point,
                item.safety_stock,
                item.lead_time_days,
                item.average_daily_demand,
                serde_json::to_string(&item.demand_history)?,
                item.supplier_id,
                item.days_of_cover,
                item.stock_status.as_str(),
                item.id,
                item.organization_id,
                expected_version,
            ],
        )?;
        check_versioned_update(&conn, n, "inventory_item", &item.id, &item.organization_id, expected_version)?;
        item.version = expected_version + 1;
        Ok(item)
    }
}
