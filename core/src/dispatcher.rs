//! Alert dispatch: cooldown check, recommendations, persistence, audit.
//!
//! Deduplication is by cooldown, not by idempotency key. While an open alert
//! for the same (organization, entity, alert type) is cooling down, dispatch
//! returns `None`. A different alert type, or the same type after the
//! cooldown expires, always produces a new alert.

use crate::{
    alert::{Alert, AlertStatus, AlertType},
    audit::{record_audit, AuditEntry},
    engine::RiskEngine,
    error::RiskResult,
    notify::Notification,
    recommendation::recommend,
    types::{Components, EntityId, EntityType, OrgId, RiskTier, Severity},
};
use chrono::Duration;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct DispatchParams {
    pub organization_id: OrgId,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub related_entity_type: EntityType,
    pub related_entity_id: EntityId,
    pub risk_score_id: Option<String>,
    /// Feeds the component-specific recommendation rules.
    pub score_components: Components,
    /// Overrides every other cooldown source when set.
    pub cooldown_ms: Option<i64>,
}

pub struct AlertDispatcher {
    engine: RiskEngine,
}

impl AlertDispatcher {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    pub fn dispatch(&self, params: DispatchParams) -> RiskResult<Option<Alert>> {
        let store = &self.engine.store;
        let now = self.engine.now();

        // 1. Cooldown
        if store
            .check_cooldown(&params.organization_id, &params.related_entity_id, params.alert_type, now)?
            .is_some()
        {
            log::debug!(
                "dispatch suppressed: org={} entity={} type={}",
                params.organization_id,
                params.related_entity_id,
                params.alert_type
            );
            return Ok(None);
        }

        // 2. Recommendations
        let recommendations = recommend(
            params.related_entity_type.as_str(),
            tier_for(params.severity),
            &params.score_components,
        );

        // 3. Cooldown duration
        let org_config = self.engine.org_config(&params.organization_id)?;
        let cooldown_ms = params
            .cooldown_ms
            .or_else(|| org_config.cooldown_ms(params.alert_type))
            .unwrap_or_else(|| params.alert_type.default_cooldown_ms());

        // 4. Persist
        let alert = Alert {
            id: uuid::Uuid::new_v4().to_string(),
            organization_id: params.organization_id,
            alert_type: params.alert_type,
            severity: params.severity,
            title: params.title,
            description: params.description,
            related_entity_type: params.related_entity_type,
            related_entity_id: params.related_entity_id,
            risk_score_id: params.risk_score_id,
            status: AlertStatus::Generated,
            assigned_to: None,
            assigned_at: None,
            acknowledged_at: None,
            resolved_at: None,
            resolution_notes: None,
            escalation_level: 0,
            escalation_history: Vec::new(),
            recommendations,
            cooldown_until: now + Duration::milliseconds(cooldown_ms),
            created_at: now,
            deleted_at: None,
            version: 0,
        };
        if !store.create_alert_unless_cooling(&alert, now)? {
            // Lost the race against a concurrent dispatch of the same fingerprint.
            return Ok(None);
        }
        log::info!(
            "alert dispatched: id={} org={} type={} severity={} entity={}:{}",
            alert.id,
            alert.organization_id,
            alert.alert_type,
            alert.severity,
            alert.related_entity_type,
            alert.related_entity_id
        );

        // 5. Audit and notify, both best-effort.
        record_audit(
            self.engine.audit.as_ref(),
            AuditEntry::alert_action(
                &alert.organization_id,
                None,
                "alert.generated",
                &alert.id,
                json!({
                    "alertType": alert.alert_type,
                    "severity": alert.severity,
                    "relatedEntityType": alert.related_entity_type,
                    "relatedEntityId": alert.related_entity_id,
                }),
                now,
            ),
        );
        if matches!(alert.severity, Severity::High | Severity::Critical) {
            self.notify_recipients(&alert, &org_config.notification_recipients);
        }

        Ok(Some(alert))
    }

    fn notify_recipients(&self, alert: &Alert, recipients: &[String]) {
        for recipient in recipients {
            let notification = Notification {
                organization_id: alert.organization_id.clone(),
                recipient: recipient.clone(),
                subject: alert.title.clone(),
                message: alert.description.clone(),
                severity: alert.severity,
            };
            if let Err(e) = self.engine.notifier.send_notification(&notification) {
                log::warn!("notification to {recipient} for alert={} failed: {e}", alert.id);
            }
        }
    }
}

fn tier_for(severity: Severity) -> RiskTier {
    match severity {
        Severity::Low => RiskTier::Low,
        Severity::Medium => RiskTier::Medium,
        Severity::High => RiskTier::High,
        Severity::Critical => RiskTier::Critical,
    }
}
