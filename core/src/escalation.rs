//! Time-based escalation of unresolved alerts.
//!
//! An owned alert (assigned, acknowledged or in review) climbs one level each
//! time it sits longer than the timeout for its (severity, level). The timer
//! starts at the latest escalation, or at assignment if there was none.
//! Level 3 is the top of the ladder: such alerts stay with whoever holds them.

use crate::{
    agent::{organizations, AgentRunSummary},
    alert::{Alert, EscalationEntry, MAX_ESCALATION_LEVEL},
    audit::{record_audit, AuditEntry},
    engine::RiskEngine,
    error::RiskResult,
    org_config::EscalationRule,
    types::Severity,
};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Default timeouts in minutes, indexed by current level.
pub const DEFAULT_ESCALATION_TIMEOUTS: [(Severity, [u32; 3]); 4] = [
    (Severity::Critical, [15, 30, 60]),
    (Severity::High, [30, 60, 120]),
    (Severity::Medium, [60, 120, 240]),
    (Severity::Low, [120, 240, 480]),
];

/// Organization rule for (severity, level) if there is one, else the default ladder.
pub fn escalation_timeout(severity: Severity, level: u8, rules: &[EscalationRule]) -> Option<u32> {
    if let Some(rule) = rules.iter().find(|r| r.severity == severity && r.level == level) {
        return Some(rule.timeout_minutes);
    }
    DEFAULT_ESCALATION_TIMEOUTS
        .iter()
        .find(|(s, _)| *s == severity)
        .and_then(|(_, ladder)| ladder.get(level as usize).copied())
}

#[derive(Debug, Clone, PartialEq)]
pub enum EscalationDecision {
    /// Already at the top of the ladder.
    AtMaxLevel,
    /// Never assigned and never escalated: no timer to measure.
    NoReferenceTime,
    NoTimeout,
    NotDue { elapsed_minutes: f64, timeout_minutes: u32 },
    Escalate(EscalationEntry),
}

/// Decide whether `alert` is due for escalation at `now`.
pub fn evaluate_escalation(alert: &Alert, rules: &[EscalationRule], now: DateTime<Utc>) -> EscalationDecision {
    let level = alert.escalation_level;
    if level >= MAX_ESCALATION_LEVEL {
        return EscalationDecision::AtMaxLevel;
    }
    let Some(timeout_minutes) = escalation_timeout(alert.severity, level, rules) else {
        return EscalationDecision::NoTimeout;
    };
    let Some(reference) = alert.escalation_reference_time() else {
        return EscalationDecision::NoReferenceTime;
    };

    let elapsed_minutes = (now - reference).num_milliseconds() as f64 / 60_000.0;
    if elapsed_minutes < f64::from(timeout_minutes) {
        return EscalationDecision::NotDue { elapsed_minutes, timeout_minutes };
    }

    EscalationDecision::Escalate(EscalationEntry {
        level: level + 1,
        escalated_at: now,
        reason: format!(
            "Auto-escalated after {} minutes at level {level}",
            elapsed_minutes.round() as i64
        ),
    })
}

pub struct EscalationEngine {
    engine: RiskEngine,
}

impl EscalationEngine {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    /// Scan every active organization, or just `target_org`.
    ///
    /// Failing to list organizations fails the run. Anything after that is
    /// counted in `errors` and the scan moves on.
    pub fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary> {
        let orgs = organizations(&self.engine, target_org)?;

        let mut summary = AgentRunSummary::default();
        for org in &orgs {
            if let Err(e) = self.escalate_org(org, &mut summary) {
                summary.errors += 1;
                log::error!("escalation: org={org} failed: {e}");
            }
        }
        log::info!(
            "escalation run complete: escalated={} errors={}",
            summary.escalated,
            summary.errors
        );
        Ok(summary)
    }

    fn escalate_org(&self, org: &str, summary: &mut AgentRunSummary) -> RiskResult<()> {
        let rules = self.engine.org_config(org)?.alert_escalation_rules;
        let alerts = self.engine.store.find_for_escalation(org)?;

        for alert in alerts {
            summary.processed += 1;
            match self.escalate_one(alert, &rules) {
                Ok(true) => summary.escalated += 1,
                Ok(false) => {}
                Err(e) => {
                    summary.errors += 1;
                    log::error!("escalation: org={org} alert failed: {e}");
                }
            }
        }
        Ok(())
    }

    fn escalate_one(&self, mut alert: Alert, rules: &[EscalationRule]) -> RiskResult<bool> {
        let now = self.engine.now();
        let entry = match evaluate_escalation(&alert, rules, now) {
            EscalationDecision::Escalate(entry) => entry,
            _ => return Ok(false),
        };

        let from_level = alert.escalation_level;
        let expected_version = alert.version;
        alert.escalation_level = entry.level;
        alert.escalation_history.push(entry);
        let stored = self.engine.store.update_alert(&alert, expected_version)?;

        log::info!(
            "alert={} escalated {from_level} -> {} severity={}",
            stored.id,
            stored.escalation_level,
            stored.severity
        );
        record_audit(
            self.engine.audit.as_ref(),
            AuditEntry::alert_action(
                &stored.organization_id,
                None,
                "alert.escalated",
                &stored.id,
                json!({
                    "fromLevel": from_level,
                    "toLevel": stored.escalation_level,
                    "severity": stored.severity,
                }),
                now,
            ),
        );
        Ok(true)
    }
}
