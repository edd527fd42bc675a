//! Scoring properties that hold across the whole input space.

mod common;

use common::{healthy_supplier, inventory_item, late_shipment, start_time};
use riskwatch_core::{
    entity::{derive_inventory_fields, WeatherRisk},
    org_config::{ThresholdBand, DEFAULT_BAND},
    scoring::{
        classify_tier, inventory::STOCKOUT, score_inventory, score_shipment, score_supplier,
        LOW_CONFIDENCE_BELOW,
    },
};

/// Every score lands in 0..=100 and a higher score never gets a lower tier.
#[test]
fn scores_bounded_and_tiers_monotonic() {
    let now = start_time();
    let mut results = Vec::new();

    for on_time in [0.0, 25.0, 50.0, 75.0, 100.0, 140.0] {
        for financial in [-20.0, 0.0, 50.0, 100.0] {
            let mut s = healthy_supplier("sup-grid", now);
            if let Some(m) = s.performance_metrics.as_mut() {
                m.on_time_delivery_rate = Some(on_time);
                m.defect_rate = Some(on_time / 2.0);
                m.dispute_frequency = Some(financial / 5.0);
            }
            if let Some(f) = s.financial_stability.as_mut() {
                f.score = Some(financial);
            }
            s.geopolitical_risk_flag = on_time > 50.0;
            results.push(score_supplier(&s, &DEFAULT_BAND, now));
        }
    }
    for weather in [None, Some(WeatherRisk::Low), Some(WeatherRisk::Severe)] {
        let mut sh = late_shipment("shp-grid", now);
        sh.weather_risk = weather;
        results.push(score_shipment(&sh, &DEFAULT_BAND, now));
        sh.estimated_arrival = None;
        sh.tracking_events.clear();
        results.push(score_shipment(&sh, &DEFAULT_BAND, now));
    }
    for stock in [0.0, 5.0, 30.0, 80.0, 500.0, 10_000.0] {
        for supplier_score in [None, Some(0.0), Some(100.0)] {
            let mut item = inventory_item("inv-grid", stock, None);
            derive_inventory_fields(&mut item).unwrap();
            results.push(score_inventory(&item, supplier_score, &DEFAULT_BAND));
        }
    }

    for r in &results {
        assert!(r.overall_score <= 100, "score out of range: {}", r.overall_score);
        assert!(r.confidence <= 100);
        assert_eq!(r.low_confidence, r.confidence < LOW_CONFIDENCE_BELOW);
    }

    let mut sorted: Vec<_> = results.iter().map(|r| (r.overall_score, r.risk_tier)).collect();
    sorted.sort();
    for pair in sorted.windows(2) {
        assert!(pair[0].1 <= pair[1].1, "tier decreased: {:?} -> {:?}", pair[0], pair[1]);
    }
}

#[test]
fn custom_band_shifts_tiers() {
    let strict = ThresholdBand { low: 10.0, medium: 20.0, high: 30.0 };
    let sh = late_shipment("shp-1", start_time());

    let default = score_shipment(&sh, &DEFAULT_BAND, start_time());
    let tight = score_shipment(&sh, &strict, start_time());

    assert_eq!(default.overall_score, tight.overall_score);
    assert_eq!(tight.risk_tier, classify_tier(tight.overall_score, &strict));
    assert!(tight.risk_tier > default.risk_tier);
}

#[test]
fn empty_shelf_with_demand_is_certain_stockout() {
    let mut item = inventory_item("inv-empty", 0.0, None);
    derive_inventory_fields(&mut item).unwrap();

    let result = score_inventory(&item, None, &DEFAULT_BAND);
    assert_eq!(result.component(STOCKOUT), 100.0);
}

#[test]
fn supplier_without_metrics_is_low_confidence() {
    let mut s = healthy_supplier("sup-bare", start_time());
    s.performance_metrics = None;
    s.financial_stability = None;

    let result = score_supplier(&s, &DEFAULT_BAND, start_time());
    assert!(result.confidence <= 60, "confidence {}", result.confidence);
    assert!(result.low_confidence);
    let warning = result.confidence_warning.unwrap();
    assert!(warning.contains("On-time delivery rate unavailable"), "{warning}");
}
