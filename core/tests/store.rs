//! Store queries the agents lean on: entity versioning, scope filters,
//! score history and the tier distribution.

mod common;

use common::{healthy_supplier, inventory_item, risky_supplier, Fixture, ORG};
use riskwatch_core::{
    agent::Agent,
    entity::{StockStatus, SupplierStatus},
    error::RiskError,
    types::{EntityType, RiskTier},
};

#[test]
fn entity_updates_are_versioned() {
    let fx = Fixture::new();
    let store = &fx.engine.store;
    store.insert_supplier(&healthy_supplier("sup-1", fx.now())).unwrap();

    let mut s = store.get_supplier(ORG, "sup-1").unwrap();
    s.status = SupplierStatus::UnderWatch;
    let updated = store.update_supplier(&s, 0).unwrap();
    assert_eq!(updated.version, 1);

    let err = store.update_supplier(&s, 0).unwrap_err();
    assert!(matches!(err, RiskError::ConcurrencyConflict { .. }), "{err}");

    let err = store.get_supplier("org-other", "sup-1").unwrap_err();
    assert!(matches!(err, RiskError::NotFound { .. }));
}

#[test]
fn inventory_fields_are_derived_on_write() {
    let fx = Fixture::new();
    let store = &fx.engine.store;

    let item = store.insert_inventory_item(&inventory_item("inv-1", 250.0, None)).unwrap();
    assert_eq!(item.days_of_cover, 25.0);
    assert_eq!(item.stock_status, StockStatus::Adequate);

    let mut item = store.get_inventory_item(ORG, "inv-1").unwrap();
    item.current_stock = 35.0;
    let item = store.update_inventory_item(&item, item.version).unwrap();
    assert_eq!(item.stock_status, StockStatus::Critical);
    assert_eq!(store.get_inventory_item(ORG, "inv-1").unwrap().days_of_cover, 3.5);

    let err = store
        .insert_inventory_item(&inventory_item("inv-neg", -1.0, None))
        .unwrap_err();
    assert!(matches!(err, RiskError::Validation(_)));
}

#[test]
fn only_watchable_suppliers_are_evaluated() {
    let fx = Fixture::new();
    let store = &fx.engine.store;
    for (id, status) in [
        ("sup-a", SupplierStatus::Active),
        ("sup-w", SupplierStatus::UnderWatch),
        ("sup-h", SupplierStatus::HighRisk),
        ("sup-i", SupplierStatus::Inactive),
        ("sup-s", SupplierStatus::Suspended),
    ] {
        let mut s = healthy_supplier(id, fx.now());
        s.status = status;
        store.insert_supplier(&s).unwrap();
    }

    let ids: Vec<String> = store.find_active_suppliers(ORG).unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, ["sup-a", "sup-h", "sup-w"]);
}

#[test]
fn tier_distribution_counts_every_tier() {
    let fx = Fixture::new();
    let store = &fx.engine.store;
    store.insert_supplier(&healthy_supplier("sup-ok", fx.now())).unwrap();
    store.insert_supplier(&risky_supplier("sup-bad-1", fx.now())).unwrap();
    store.insert_supplier(&risky_supplier("sup-bad-2", fx.now())).unwrap();
    store.insert_inventory_item(&inventory_item("inv-1", 30.0, None)).unwrap();

    fx.engine.agents()[0].run(None).unwrap();
    fx.engine.agents()[2].run(None).unwrap();

    let suppliers = store.risk_tier_distribution(ORG, Some(EntityType::Supplier)).unwrap();
    assert_eq!(suppliers[&RiskTier::High], 2);
    assert_eq!(suppliers[&RiskTier::Critical], 0);
    assert_eq!(suppliers.values().sum::<u64>(), 3);

    let all = store.risk_tier_distribution(ORG, None).unwrap();
    assert_eq!(all[&RiskTier::Medium], suppliers[&RiskTier::Medium] + 1);

    let ranked = store.list_scores(ORG, EntityType::Supplier).unwrap();
    assert_eq!(ranked[0].overall_score, 76);
    assert_eq!(ranked.last().unwrap().entity_id, "sup-ok");
}

#[test]
fn score_history_is_capped() {
    let mut fx = Fixture::new();
    let mut config = (*fx.engine.config).clone();
    config.score_history_cap = 3;
    fx.engine.config = std::sync::Arc::new(config);
    fx.engine.store.insert_supplier(&risky_supplier("sup-bad", fx.now())).unwrap();

    for _ in 0..6 {
        fx.engine.evaluate_entity(ORG, EntityType::Supplier, "sup-bad").unwrap();
        fx.clock.advance_minutes(60);
    }

    let history = fx
        .engine
        .store
        .get_score_history(ORG, EntityType::Supplier, "sup-bad")
        .unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.windows(2).all(|w| w[0].evaluated_at < w[1].evaluated_at));
    assert_eq!(history[2].evaluated_at, fx.now() - chrono::Duration::minutes(120));
}
