//! Alert workflow actions.
//!
//! Each action:
//!   1. loads the live alert (not found if missing or soft-deleted),
//!   2. rejects a stale `expected_version` as a concurrency conflict,
//!   3. checks the actor where the action needs it,
//!   4. validates the transition against `AlertStatus::valid_transitions`,
//!   5. writes with a compare-and-swap on the version,
//!   6. records a best-effort audit entry.

use crate::{
    alert::{Alert, AlertStatus},
    audit::{record_audit, AuditEntry},
    engine::RiskEngine,
    error::{RiskError, RiskResult},
    types::Actor,
};
use serde_json::json;

pub struct AlertWorkflow {
    engine: RiskEngine,
}

impl AlertWorkflow {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    /// Assign (or reassign) an alert to a user.
    pub fn assign(
        &self,
        organization_id: &str,
        alert_id: &str,
        assignee: &str,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        if assignee.trim().is_empty() {
            return Err(RiskError::validation("assignee must not be empty"));
        }
        let now = self.engine.now();
        self.transition(organization_id, alert_id, expected_version, actor, Action::Assign, |alert| {
            alert.assigned_to = Some(assignee.to_string());
            alert.assigned_at = Some(now);
            json!({ "assignedTo": assignee })
        })
    }

    /// Only the assignee or an administrator may acknowledge.
    pub fn acknowledge(
        &self,
        organization_id: &str,
        alert_id: &str,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        let now = self.engine.now();
        self.transition(organization_id, alert_id, expected_version, actor, Action::Acknowledge, |alert| {
            alert.acknowledged_at = Some(now);
            json!({})
        })
    }

    pub fn start_review(
        &self,
        organization_id: &str,
        alert_id: &str,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        self.transition(organization_id, alert_id, expected_version, actor, Action::StartReview, |_| json!({}))
    }

    pub fn resolve(
        &self,
        organization_id: &str,
        alert_id: &str,
        resolution_notes: Option<&str>,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        let now = self.engine.now();
        let notes = resolution_notes.unwrap_or_default().to_string();
        self.transition(organization_id, alert_id, expected_version, actor, Action::Resolve, |alert| {
            alert.resolved_at = Some(now);
            alert.resolution_notes = Some(notes.clone());
            json!({ "resolutionNotes": notes })
        })
    }

    /// Retire an open alert without resolving it.
    pub fn archive(
        &self,
        organization_id: &str,
        alert_id: &str,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        self.transition(organization_id, alert_id, expected_version, actor, Action::Archive, |_| json!({}))
    }

    /// Hide the alert. The row stays until the retention purge reaps it.
    pub fn soft_delete(
        &self,
        organization_id: &str,
        alert_id: &str,
        actor: &Actor,
        expected_version: i64,
    ) -> RiskResult<Alert> {
        if !actor.role.is_admin() {
            return Err(RiskError::Forbidden("only administrators can delete alerts".into()));
        }
        let mut alert = self.load(organization_id, alert_id, expected_version)?;
        let now = self.engine.now();
        alert.deleted_at = Some(now);
        let stored = self.engine.store.update_alert(&alert, expected_version)?;
        self.audit(&stored, actor, "alert.deleted", json!({}));
        Ok(stored)
    }

    fn load(&self, organization_id: &str, alert_id: &str, expected_version: i64) -> RiskResult<Alert> {
        let alert = self.engine.store.get_alert(organization_id, alert_id)?;
        if alert.version != expected_version {
            return Err(RiskError::ConcurrencyConflict {
                entity: "alert",
                id: alert_id.to_string(),
                expected: expected_version,
            });
        }
        Ok(alert)
    }

    fn transition(
        &self,
        organization_id: &str,
        alert_id: &str,
        expected_version: i64,
        actor: &Actor,
        action: Action,
        apply: impl FnOnce(&mut Alert) -> serde_json::Value,
    ) -> RiskResult<Alert> {
        let mut alert = self.load(organization_id, alert_id, expected_version)?;

        if action == Action::Acknowledge
            && alert.assigned_to.as_deref() != Some(actor.user_id.as_str())
            && !actor.role.is_admin()
        {
            return Err(RiskError::Forbidden(
                "only the assigned user or an administrator can acknowledge this alert".into(),
            ));
        }

        let next = action.target();
        if !alert.status.can_transition_to(next) {
            return Err(RiskError::business_rule(format!(
                "cannot {} alert in '{}' status",
                action.verb(),
                alert.status
            )));
        }

        let from = alert.status;
        alert.status = next;
        let mut metadata = apply(&mut alert);
        let stored = self.engine.store.update_alert(&alert, expected_version)?;

        log::info!(
            "alert={} org={} {from} -> {next} by user={}",
            stored.id,
            stored.organization_id,
            actor.user_id
        );
        if let Some(map) = metadata.as_object_mut() {
            map.insert("from".into(), json!(from));
            map.insert("to".into(), json!(next));
        }
        self.audit(&stored, actor, action.audit_name(), metadata);
        Ok(stored)
    }

    fn audit(&self, alert: &Alert, actor: &Actor, action: &str, metadata: serde_json::Value) {
        record_audit(
            self.engine.audit.as_ref(),
            AuditEntry::alert_action(
                &alert.organization_id,
                Some(&actor.user_id),
                action,
                &alert.id,
                metadata,
                self.engine.now(),
            ),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Assign,
    Acknowledge,
    StartReview,
    Resolve,
    Archive,
}

impl Action {
    fn target(self) -> AlertStatus {
        match self {
            Self::Assign => AlertStatus::Assigned,
            Self::Acknowledge => AlertStatus::Acknowledged,
            Self::StartReview => AlertStatus::InReview,
            Self::Resolve => AlertStatus::Resolved,
            Self::Archive => AlertStatus::Archived,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Acknowledge => "acknowledge",
            Self::StartReview => "start review of",
            Self::Resolve => "resolve",
            Self::Archive => "archive",
        }
    }

    fn audit_name(self) -> &'static str {
        match self {
            Self::Assign => "alert.assigned",
            Self::Acknowledge => "alert.acknowledged",
            Self::StartReview => "alert.reviewStarted",
            Self::Resolve => "alert.resolved",
            Self::Archive => "alert.archived",
        }
    }
}
