//! Alert lifecycle: transitions, permissions, optimistic concurrency.

mod common;

use common::{Fixture, ORG};
use riskwatch_core::{
    alert::AlertStatus,
    error::RiskError,
    types::{Actor, Role, Severity},
};
use std::sync::{Arc, Barrier};

fn analyst() -> Actor {
    Actor::new("analyst-1", Role::RiskAnalyst)
}

#[test]
fn resolve_from_generated_is_rejected() {
    let fx = Fixture::new();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();

    let err = fx
        .engine
        .workflow()
        .resolve(ORG, &alert.id, Some("done"), &analyst(), alert.version)
        .unwrap_err();
    assert!(matches!(err, RiskError::BusinessRule(_)), "{err}");

    let unchanged = fx.engine.store.get_alert(ORG, &alert.id).unwrap();
    assert_eq!(unchanged.status, AlertStatus::Generated);
    assert_eq!(unchanged.version, alert.version);
}

#[test]
fn assign_acknowledge_review_resolve() {
    let fx = Fixture::new();
    let wf = fx.engine.workflow();
    let me = analyst();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();

    let a = wf.assign(ORG, &alert.id, &me.user_id, &me, alert.version).unwrap();
    assert_eq!(a.status, AlertStatus::Assigned);
    assert_eq!(a.assigned_at, Some(fx.now()));
    assert_eq!(a.version, 1);

    fx.clock.advance_minutes(5);
    let a = wf.acknowledge(ORG, &a.id, &me, a.version).unwrap();
    assert_eq!(a.status, AlertStatus::Acknowledged);
    assert_eq!(a.acknowledged_at, Some(fx.now()));

    let a = wf.start_review(ORG, &a.id, &me, a.version).unwrap();
    assert_eq!(a.status, AlertStatus::InReview);

    let a = wf.resolve(ORG, &a.id, Some("backup supplier engaged"), &me, a.version).unwrap();
    assert_eq!(a.status, AlertStatus::Resolved);
    assert_eq!(a.resolution_notes.as_deref(), Some("backup supplier engaged"));
    assert_eq!(a.version, 4);

    let stored = fx.engine.store.get_alert(ORG, &a.id).unwrap();
    assert_eq!(stored, a);

    let actions: Vec<String> = fx
        .engine
        .store
        .audit_log_for(ORG, &a.id)
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(
        actions,
        ["alert.generated", "alert.assigned", "alert.acknowledged", "alert.reviewStarted", "alert.resolved"]
    );

    // Terminal.
    let err = wf.archive(ORG, &a.id, &me, a.version).unwrap_err();
    assert!(matches!(err, RiskError::BusinessRule(_)));
}

#[test]
fn only_assignee_or_admin_acknowledges() {
    let fx = Fixture::new();
    let wf = fx.engine.workflow();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::Critical).unwrap();
    let a = wf.assign(ORG, &alert.id, "analyst-1", &analyst(), alert.version).unwrap();

    let other = Actor::new("analyst-2", Role::RiskAnalyst);
    let err = wf.acknowledge(ORG, &a.id, &other, a.version).unwrap_err();
    assert!(matches!(err, RiskError::Forbidden(_)));

    let admin = Actor::new("admin-1", Role::OrgAdmin);
    let a = wf.acknowledge(ORG, &a.id, &admin, a.version).unwrap();
    assert_eq!(a.status, AlertStatus::Acknowledged);
}

#[test]
fn reassign_and_validation() {
    let fx = Fixture::new();
    let wf = fx.engine.workflow();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();

    let err = wf.assign(ORG, &alert.id, "  ", &analyst(), alert.version).unwrap_err();
    assert!(matches!(err, RiskError::Validation(_)));

    let a = wf.assign(ORG, &alert.id, "analyst-1", &analyst(), alert.version).unwrap();
    let a = wf.assign(ORG, &a.id, "analyst-2", &analyst(), a.version).unwrap();
    assert_eq!(a.assigned_to.as_deref(), Some("analyst-2"));
}

#[test]
fn stale_version_is_a_conflict_not_a_missing_alert() {
    let fx = Fixture::new();
    let wf = fx.engine.workflow();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();
    wf.assign(ORG, &alert.id, "analyst-1", &analyst(), alert.version).unwrap();

    let err = wf.assign(ORG, &alert.id, "analyst-2", &analyst(), alert.version).unwrap_err();
    assert!(matches!(err, RiskError::ConcurrencyConflict { expected: 0, .. }), "{err}");
    assert!(err.is_retryable());

    let err = wf.assign(ORG, "no-such-alert", "analyst-2", &analyst(), 0).unwrap_err();
    assert!(matches!(err, RiskError::NotFound { .. }), "{err}");
}

/// Two writers holding the same version race; exactly one wins.
#[test]
fn concurrent_writers_exactly_one_wins() {
    let fx = Fixture::new();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["analyst-1", "analyst-2"]
        .into_iter()
        .map(|user| {
            let engine = fx.engine.clone();
            let barrier = barrier.clone();
            let id = alert.id.clone();
            std::thread::spawn(move || {
                let actor = Actor::new(user, Role::RiskAnalyst);
                barrier.wait();
                engine.workflow().assign(ORG, &id, user, &actor, 0)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(r, RiskError::ConcurrencyConflict { .. }), "{r}");
    }
    assert_eq!(fx.engine.store.get_alert(ORG, &alert.id).unwrap().version, 1);
}

#[test]
fn soft_delete_is_admin_only_and_hides_the_alert() {
    let fx = Fixture::new();
    let wf = fx.engine.workflow();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();

    let err = wf.soft_delete(ORG, &alert.id, &analyst(), alert.version).unwrap_err();
    assert!(matches!(err, RiskError::Forbidden(_)));

    let admin = Actor::new("admin-1", Role::SuperAdmin);
    wf.soft_delete(ORG, &alert.id, &admin, alert.version).unwrap();
    assert!(matches!(
        fx.engine.store.get_alert(ORG, &alert.id),
        Err(RiskError::NotFound { .. })
    ));

    // Reaped only once past retention.
    assert_eq!(fx.engine.purge_expired_alerts().unwrap(), 0);
    fx.clock.advance(chrono::Duration::days(91));
    assert_eq!(fx.engine.purge_expired_alerts().unwrap(), 1);
}

#[test]
fn audit_failure_keeps_the_transition() {
    let fx = Fixture::new().with_failing_audit();
    let alert = fx.dispatch_supplier_alert("sup-1", Severity::High).unwrap();

    let assigned = fx
        .engine
        .workflow()
        .assign(ORG, &alert.id, "analyst-1", &analyst(), alert.version)
        .unwrap();
    let stored = fx.engine.store.get_alert(ORG, &alert.id).unwrap();
    assert_eq!(stored.status, AlertStatus::Assigned);
    assert_eq!(stored.version, assigned.version);
}
