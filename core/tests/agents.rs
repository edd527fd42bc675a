//! Entity agents end to end: score, persist, alert, isolate failures.

mod common;

use common::{healthy_supplier, inventory_item, late_shipment, risky_supplier, Fixture, ORG};
use riskwatch_core::{
    agent::Agent,
    alert::AlertType,
    error::RiskError,
    org_config::ThresholdBand,
    types::{EntityType, EvaluatedBy, RiskTier, Severity},
};

#[test]
fn supplier_agent_scores_everyone_and_alerts_on_high_risk() {
    let fx = Fixture::new();
    let store = &fx.engine.store;
    store.insert_supplier(&healthy_supplier("sup-ok", fx.now())).unwrap();
    store.insert_supplier(&risky_supplier("sup-bad", fx.now())).unwrap();

    let agent = &fx.engine.agents()[0];
    let summary = agent.run(None).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.alerts_generated, 1);
    assert_eq!(summary.errors, 0);

    let bad = store.get_score(ORG, EntityType::Supplier, "sup-bad").unwrap().unwrap();
    assert_eq!(bad.overall_score, 76);
    assert_eq!(bad.risk_tier, RiskTier::High);
    assert_eq!(bad.evaluated_by, EvaluatedBy::Agent);

    let alerts = store.list_alerts(ORG, None).unwrap();
    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.alert_type, AlertType::SupplierRisk);
    assert_eq!(alert.severity, Severity::High);
    assert_eq!(alert.title, "Supplier Risk Alert: Supplier sup-bad (HIGH)");
    assert_eq!(
        alert.description,
        "Supplier \"Supplier sup-bad\" (SUP-sup-bad) has a risk score of 76/100."
    );
    assert_eq!(alert.risk_score_id.as_deref(), Some(bad.id.as_str()));

    // Second pass: score history grows, cooldown holds back the alert.
    fx.clock.advance_minutes(240);
    let summary = agent.run(Some(ORG)).unwrap();
    assert_eq!(summary.alerts_generated, 0);
    let bad = store.get_score(ORG, EntityType::Supplier, "sup-bad").unwrap().unwrap();
    assert_eq!(bad.previous_score, Some(76));
    assert_eq!(store.get_score_history(ORG, EntityType::Supplier, "sup-bad").unwrap().len(), 1);
}

#[test]
fn shipment_agent_respects_organization_thresholds() {
    let fx = Fixture::new();
    fx.engine.store.insert_shipment(&late_shipment("shp-1", fx.now())).unwrap();

    // 38/100 is only medium under the default band.
    let summary = fx.engine.agents()[1].run(None).unwrap();
    assert_eq!(summary.alerts_generated, 0);

    let mut config = fx.engine.org_config(ORG).unwrap();
    config.risk_thresholds.shipment = ThresholdBand { low: 10.0, medium: 20.0, high: 30.0 };
    fx.engine.store.save_org_config(&config, fx.now()).unwrap();

    let outcome = fx.engine.evaluate_entity(ORG, EntityType::Shipment, "shp-1").unwrap();
    assert_eq!(outcome.score.risk_tier, RiskTier::Critical);
    assert_eq!(outcome.score.evaluated_by, EvaluatedBy::Manual);
    let alert = outcome.alert.expect("critical shipment alert");
    assert_eq!(alert.alert_type, AlertType::ShipmentDelay);
    assert!(alert.description.contains("ETA deviation: 50h."), "{}", alert.description);
    // Severe weather earns the reroute recommendation.
    assert!(alert.recommendations.iter().any(|r| r.action.contains("rerouting")));
}

#[test]
fn inventory_agent_uses_supplier_score_and_picks_alert_type() {
    let fx = Fixture::new();
    let store = &fx.engine.store;
    store.insert_supplier(&risky_supplier("sup-bad", fx.now())).unwrap();
    store.insert_inventory_item(&inventory_item("inv-empty", 0.0, Some("sup-bad"))).unwrap();
    store.insert_inventory_item(&inventory_item("inv-low", 30.0, None)).unwrap();

    // Before the supplier is scored the adjustment assumes 50.
    let before = fx.engine.evaluate_entity(ORG, EntityType::Inventory, "inv-empty").unwrap();
    assert_eq!(before.score.components["supplierRiskAdjustment"], 10.0);

    fx.engine.agents()[0].run(None).unwrap();
    fx.clock.advance_minutes(180);
    let summary = fx.engine.agents()[2].run(None).unwrap();
    assert_eq!(summary.processed, 2);
    // Only the empty shelf alerts; the two-hour stockout cooldown has lapsed.
    assert_eq!(summary.alerts_generated, 1);

    let empty = store.get_score(ORG, EntityType::Inventory, "inv-empty").unwrap().unwrap();
    assert_eq!(empty.components["supplierRiskAdjustment"], 15.0);
    assert_eq!(empty.components["stockoutProbability"], 100.0);

    let stockout: Vec<_> = store
        .list_alerts(ORG, None)
        .unwrap()
        .into_iter()
        .filter(|a| a.related_entity_id == "inv-empty")
        .collect();
    assert_eq!(stockout.len(), 2);
    assert!(stockout.iter().all(|a| a.alert_type == AlertType::InventoryStockout));
    assert!(stockout[0].description.contains("Current stock: 0, Days of cover: 0.0."));
    assert!(store
        .list_alerts(ORG, None)
        .unwrap()
        .iter()
        .all(|a| a.related_entity_id != "inv-low"));
}

#[test]
fn manual_evaluation_of_missing_entity_is_not_found() {
    let fx = Fixture::new();
    let err = fx.engine.evaluate_entity(ORG, EntityType::Supplier, "ghost").unwrap_err();
    assert!(matches!(err, RiskError::NotFound { .. }), "{err}");
}

#[test]
fn broken_organization_is_counted_and_skipped() {
    let (fx, uri) = Fixture::shared("agent_isolation");
    fx.engine.store.insert_supplier(&risky_supplier("sup-bad", fx.now())).unwrap();
    fx.engine.store.insert_organization("org-zz-broken", "Broken", fx.now()).unwrap();
    let raw = rusqlite::Connection::open_with_flags(
        &uri,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
    )
    .unwrap();
    raw.execute(
        "INSERT INTO organization_config (organization_id, config, updated_at)
         VALUES ('org-zz-broken', '{', 0)",
        [],
    )
    .unwrap();

    let summary = fx.engine.agents()[0].run(None).unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.alerts_generated, 1);
    assert_eq!(summary.errors, 1);
}

#[test]
fn inactive_organizations_are_skipped() {
    let fx = Fixture::new();
    fx.engine.store.insert_supplier(&risky_supplier("sup-bad", fx.now())).unwrap();
    fx.engine.store.set_organization_active(ORG, false).unwrap();

    let summary = fx.engine.agents()[0].run(None).unwrap();
    assert_eq!(summary.processed, 0);
    assert!(fx.engine.store.get_score(ORG, EntityType::Supplier, "sup-bad").unwrap().is_none());
}
