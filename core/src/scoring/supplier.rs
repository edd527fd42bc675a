//! Supplier risk: delay 30%, financial 25%, defect 20%, dispute 15%,
//! geopolitical 10%.

use super::{finish, Confidence, ScoreResult, Weighted};
use crate::{entity::Supplier, org_config::ThresholdBand};
use chrono::{DateTime, Duration, Utc};

pub const DELAY: &str = "delayScore";
pub const FINANCIAL: &str = "financialScore";
pub const DEFECT: &str = "defectScore";
pub const DISPUTE: &str = "disputeScore";
pub const GEOPOLITICAL: &str = "geopoliticalScore";

/// Financial data and shipment activity older than this are stale.
const STALE_AFTER_DAYS: i64 = 90;

pub fn score_supplier(supplier: &Supplier, band: &ThresholdBand, now: DateTime<Utc>) -> ScoreResult {
    let metrics = supplier.performance_metrics.clone().unwrap_or_default();
    let financial = supplier.financial_stability.clone().unwrap_or_default();
    let stale = |ts: Option<DateTime<Utc>>| {
        ts.is_some_and(|t| now - t > Duration::days(STALE_AFTER_DAYS))
    };

    let mut confidence = Confidence::new();

    let delay = match metrics.on_time_delivery_rate {
        Some(rate) => ((1.0 - rate / 100.0) * 100.0).clamp(0.0, 100.0),
        None => {
            confidence.penalize(20, "On-time delivery rate unavailable");
            50.0
        }
    };

    let financial_score = match financial.score {
        Some(score) => {
            if stale(financial.last_updated) {
                confidence.penalize(20, "Financial stability data is older than 90 days");
            }
            (100.0 - score).clamp(0.0, 100.0)
        }
        None => {
            confidence.penalize(20, "Financial stability score unavailable");
            50.0
        }
    };

    let defect = match metrics.defect_rate {
        Some(rate) => rate.clamp(0.0, 100.0),
        None => {
            confidence.penalize(10, "Defect rate unavailable");
            0.0
        }
    };

    let dispute = match metrics.dispute_frequency {
        Some(freq) => (freq * 5.0).clamp(0.0, 50.0),
        None => {
            confidence.penalize(10, "Dispute frequency unavailable");
            0.0
        }
    };

    let geopolitical = if supplier.geopolitical_risk_flag { 20.0 } else { 0.0 };

    if stale(metrics.last_updated) {
        confidence.penalize(20, "No shipment data in the last 90 days");
    }

    finish(
        &[
            Weighted { name: DELAY, value: delay, weight: 0.30 },
            Weighted { name: FINANCIAL, value: financial_score, weight: 0.25 },
            Weighted { name: DEFECT, value: defect, weight: 0.20 },
            Weighted { name: DISPUTE, value: dispute, weight: 0.15 },
            Weighted { name: GEOPOLITICAL, value: geopolitical, weight: 0.10 },
        ],
        confidence,
        band,
    )
}
