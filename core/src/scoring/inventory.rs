//! Inventory risk: stockout probability 50%, demand variance 30%,
//! supplier risk adjustment 20%.

use super::{finish, Confidence, ScoreResult, Weighted};
use crate::{entity::InventoryItem, org_config::ThresholdBand};

pub const STOCKOUT: &str = "stockoutProbability";
pub const DEMAND_VARIANCE: &str = "demandVarianceScore";
pub const SUPPLIER_ADJUSTMENT: &str = "supplierRiskAdjustment";

/// Supplier score assumed when the item has no scored supplier.
pub const UNKNOWN_SUPPLIER_SCORE: f64 = 50.0;

fn stockout_probability(item: &InventoryItem) -> f64 {
    let days_of_cover = item.current_stock / item.average_daily_demand;
    if days_of_cover < 1.0 {
        100.0
    } else if item.current_stock < item.safety_stock {
        90.0
    } else if item.current_stock < item.reorder_point {
        60.0
    } else {
        (100.0 - (days_of_cover / (item.lead_time_days * 1.5)) * 100.0).clamp(0.0, 100.0)
    }
}

/// Population standard deviation of the recorded actual demand.
fn demand_std_dev(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// `supplier_score` is the supplier's current overall score, if it has one.
pub fn score_inventory(
    item: &InventoryItem,
    supplier_score: Option<f64>,
    band: &ThresholdBand,
) -> ScoreResult {
    let mut confidence = Confidence::new();

    let stockout = if item.average_daily_demand <= 0.0 {
        confidence.penalize(10, "Average daily demand is zero or unavailable");
        0.0
    } else {
        stockout_probability(item)
    };

    let demand_variance = if item.demand_history.len() >= 2 && item.average_daily_demand > 0.0 {
        let actual: Vec<f64> = item.demand_history.iter().filter_map(|s| s.actual_demand).collect();
        if actual.len() >= 2 {
            (demand_std_dev(&actual) / item.average_daily_demand * 50.0).min(30.0)
        } else {
            confidence.penalize(10, "Insufficient historical demand data for variance calculation");
            10.0
        }
    } else {
        confidence.penalize(10, "Demand forecast data unavailable");
        10.0
    };

    let supplier_adjustment = supplier_score.unwrap_or(UNKNOWN_SUPPLIER_SCORE) * 0.20;

    finish(
        &[
            Weighted { name: STOCKOUT, value: stockout, weight: 0.50 },
            Weighted { name: DEMAND_VARIANCE, value: demand_variance, weight: 0.30 },
            Weighted { name: SUPPLIER_ADJUSTMENT, value: supplier_adjustment, weight: 0.20 },
        ],
        confidence,
        band,
    )
}
