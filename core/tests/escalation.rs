//! Escalation over the store: timing, ladder, audit, isolation.

mod common;

use common::{Fixture, ORG};
use riskwatch_core::{
    alert::Alert,
    org_config::EscalationRule,
    types::{Actor, Role, Severity},
};

fn assigned_alert(fx: &Fixture, entity: &str, severity: Severity) -> Alert {
    let alert = fx.dispatch_supplier_alert(entity, severity).unwrap();
    let me = Actor::new("analyst-1", Role::RiskAnalyst);
    fx.engine.workflow().assign(ORG, &alert.id, "analyst-1", &me, alert.version).unwrap()
}

#[test]
fn high_alert_escalates_after_thirty_one_minutes_not_twenty_nine() {
    let fx = Fixture::new();
    let alert = assigned_alert(&fx, "sup-1", Severity::High);

    fx.clock.advance_minutes(29);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.escalated, 0);
    assert_eq!(summary.processed, 1);
    assert_eq!(fx.engine.store.get_alert(ORG, &alert.id).unwrap().escalation_level, 0);

    fx.clock.advance_minutes(2);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.escalated, 1);

    let stored = fx.engine.store.get_alert(ORG, &alert.id).unwrap();
    assert_eq!(stored.escalation_level, 1);
    assert_eq!(stored.version, alert.version + 1);
    assert_eq!(stored.escalation_history.len(), 1);
    assert_eq!(stored.escalation_history[0].reason, "Auto-escalated after 31 minutes at level 0");

    let audit = fx.engine.store.audit_log_for(ORG, &alert.id).unwrap();
    let escalated = audit.iter().find(|e| e.action == "alert.escalated").unwrap();
    assert_eq!(escalated.metadata["fromLevel"], 0);
    assert_eq!(escalated.metadata["toLevel"], 1);
    assert!(escalated.user_id.is_none());
}

#[test]
fn ladder_stops_at_level_three() {
    let fx = Fixture::new();
    let alert = assigned_alert(&fx, "sup-1", Severity::Critical);

    // Critical: 15, then 30, then 60 minutes.
    for minutes in [15, 30, 60] {
        fx.clock.advance_minutes(minutes);
        assert_eq!(fx.engine.escalation().run(Some(ORG)).unwrap().escalated, 1);
    }
    fx.clock.advance_minutes(24 * 60);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.escalated, 0);
    assert_eq!(summary.processed, 0);

    let stored = fx.engine.store.get_alert(ORG, &alert.id).unwrap();
    assert_eq!(stored.escalation_level, 3);
    let levels: Vec<u8> = stored.escalation_history.iter().map(|e| e.level).collect();
    assert_eq!(levels, vec![1, 2, 3]);
}

#[test]
fn unassigned_and_resolved_alerts_are_left_alone() {
    let fx = Fixture::new();
    fx.dispatch_supplier_alert("sup-unowned", Severity::Critical).unwrap();

    let done = assigned_alert(&fx, "sup-done", Severity::Critical);
    let me = Actor::new("analyst-1", Role::RiskAnalyst);
    let wf = fx.engine.workflow();
    let done = wf.acknowledge(ORG, &done.id, &me, done.version).unwrap();
    wf.resolve(ORG, &done.id, None, &me, done.version).unwrap();

    fx.clock.advance_minutes(600);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.escalated, 0);
}

#[test]
fn organization_rules_override_defaults() {
    let fx = Fixture::new();
    let mut config = fx.engine.org_config(ORG).unwrap();
    config.alert_escalation_rules = vec![EscalationRule {
        severity: Severity::Medium,
        level: 0,
        timeout_minutes: 5,
        escalate_to_role: "orgAdmin".into(),
    }];
    fx.engine.store.save_org_config(&config, fx.now()).unwrap();

    let medium = assigned_alert(&fx, "sup-1", Severity::Medium);
    fx.clock.advance_minutes(6);
    assert_eq!(fx.engine.escalation().run(None).unwrap().escalated, 1);
    assert_eq!(fx.engine.store.get_alert(ORG, &medium.id).unwrap().escalation_level, 1);
}

#[test]
fn failing_organization_does_not_stop_the_scan() {
    let (fx, uri) = Fixture::shared("escalation_isolation");
    let alert = assigned_alert(&fx, "sup-1", Severity::High);

    // A second org whose stored config is unreadable.
    fx.engine.store.insert_organization("org-broken", "Broken", fx.now()).unwrap();
    let raw = rusqlite::Connection::open_with_flags(
        &uri,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE | rusqlite::OpenFlags::SQLITE_OPEN_URI,
    )
    .unwrap();
    raw.execute(
        "INSERT INTO organization_config (organization_id, config, updated_at)
         VALUES ('org-broken', 'not json', 0)",
        [],
    )
    .unwrap();

    fx.clock.advance_minutes(45);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.escalated, 1);
    assert_eq!(fx.engine.store.get_alert(ORG, &alert.id).unwrap().escalation_level, 1);
}

#[test]
fn audit_failure_keeps_the_escalation() {
    let fx = Fixture::new().with_failing_audit();
    let alert = assigned_alert(&fx, "sup-1", Severity::High);

    fx.clock.advance_minutes(31);
    let summary = fx.engine.escalation().run(None).unwrap();
    assert_eq!(summary.escalated, 1);
    assert_eq!(summary.errors, 0);

    let stored = fx.engine.store.get_alert(ORG, &alert.id).unwrap();
    assert_eq!(stored.escalation_level, 1);
    assert!(fx.engine.store.audit_log_for(ORG, &alert.id).unwrap().is_empty());
}
