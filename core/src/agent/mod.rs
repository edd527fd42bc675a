//! Agent trait and the shared evaluation loop.
//!
//! RULE: Every agent implements `Agent`.
//! The scheduler calls `run()` on its own cadence, never two runs of the
//! same agent at once. Agents are synchronous; the scheduler moves them onto
//! the blocking pool.
//!
//! Failure isolation:
//!   - listing organizations fails ⇒ the run fails,
//!   - one organization fails ⇒ logged, counted, next organization,
//!   - one entity fails ⇒ logged, counted, next entity.

pub mod escalation;
pub mod inventory;
pub mod shipment;
pub mod supplier;

use crate::{
    alert::Alert,
    dispatcher::DispatchParams,
    engine::RiskEngine,
    error::RiskResult,
    org_config::OrganizationConfig,
    risk_score::{RiskScore, ScoreTarget},
    scoring::ScoreResult,
    types::{EvaluatedBy, OrgId, Severity},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentName {
    #[serde(rename = "supplierRiskAgent")]
    SupplierRisk,
    #[serde(rename = "shipmentRiskAgent")]
    ShipmentRisk,
    #[serde(rename = "inventoryRiskAgent")]
    InventoryRisk,
    #[serde(rename = "alertEscalationAgent")]
    AlertEscalation,
}

impl AgentName {
    pub const ALL: [AgentName; 4] = [
        Self::SupplierRisk,
        Self::ShipmentRisk,
        Self::InventoryRisk,
        Self::AlertEscalation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupplierRisk => "supplierRiskAgent",
            Self::ShipmentRisk => "shipmentRiskAgent",
            Self::InventoryRisk => "inventoryRiskAgent",
            Self::AlertEscalation => "alertEscalationAgent",
        }
    }

    /// Key under which the last run is stamped on each organization config.
    pub fn run_key(&self) -> &'static str {
        match self {
            Self::SupplierRisk => "supplierRisk",
            Self::ShipmentRisk => "shipmentRisk",
            Self::InventoryRisk => "inventoryRisk",
            Self::AlertEscalation => "alertEscalation",
        }
    }

    /// Accepts the full name or the run key.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s || a.run_key() == s)
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRunSummary {
    pub processed: u32,
    pub alerts_generated: u32,
    pub escalated: u32,
    pub errors: u32,
}

/// A scored entity and the alert it raised, if any.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub score: RiskScore,
    pub alert: Option<Alert>,
}

/// The contract every agent must fulfill.
pub trait Agent: Send + Sync {
    fn name(&self) -> AgentName;

    /// One full pass over every active organization, or only `target_org`.
    fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary>;
}

// ── Shared loop ──────────────────────────────────────────────────────────────

pub(crate) fn organizations(engine: &RiskEngine, target_org: Option<&str>) -> RiskResult<Vec<OrgId>> {
    match target_org {
        Some(org) => Ok(vec![org.to_string()]),
        None => engine.store.list_active_organizations(),
    }
}

/// Per-kind hooks for the entity evaluation loop.
pub(crate) trait EntityEvaluator {
    type Entity;

    fn agent(&self) -> AgentName;
    fn engine(&self) -> &RiskEngine;
    fn load_active(&self, organization_id: &str) -> RiskResult<Vec<Self::Entity>>;
    fn entity_id<'e>(&self, entity: &'e Self::Entity) -> &'e str;
    fn evaluate(
        &self,
        config: &OrganizationConfig,
        entity: &Self::Entity,
        evaluated_by: EvaluatedBy,
    ) -> RiskResult<EvaluationOutcome>;
}

pub(crate) fn run_entities<E: EntityEvaluator>(
    evaluator: &E,
    target_org: Option<&str>,
) -> RiskResult<AgentRunSummary> {
    let agent = evaluator.agent();
    let orgs = organizations(evaluator.engine(), target_org)?;
    let mut summary = AgentRunSummary::default();

    for org in &orgs {
        if let Err(e) = run_org(evaluator, org, &mut summary) {
            summary.errors += 1;
            log::error!("agent={agent} org={org} failed: {e}");
        }
    }

    log::info!(
        "agent={agent} run complete: orgs={} processed={} alerts={} errors={}",
        orgs.len(),
        summary.processed,
        summary.alerts_generated,
        summary.errors
    );
    Ok(summary)
}

fn run_org<E: EntityEvaluator>(evaluator: &E, org: &str, summary: &mut AgentRunSummary) -> RiskResult<()> {
    let config = evaluator.engine().org_config(org)?;
    let entities = evaluator.load_active(org)?;
    log::debug!("agent={} org={org} entities={}", evaluator.agent(), entities.len());

    for entity in &entities {
        match evaluator.evaluate(&config, entity, EvaluatedBy::Agent) {
            Ok(outcome) => {
                summary.processed += 1;
                if outcome.alert.is_some() {
                    summary.alerts_generated += 1;
                }
            }
            Err(e) => {
                summary.errors += 1;
                log::error!(
                    "agent={} org={org} entity={} failed: {e}",
                    evaluator.agent(),
                    evaluator.entity_id(entity)
                );
            }
        }
    }
    Ok(())
}

/// Persist `result` as the entity's score, then dispatch when the tier alerts.
pub(crate) fn record_and_alert(
    engine: &RiskEngine,
    target: ScoreTarget<'_>,
    result: &ScoreResult,
    evaluated_by: EvaluatedBy,
    alert: impl FnOnce(&RiskScore) -> AlertDraft,
) -> RiskResult<EvaluationOutcome> {
    let score = engine.store.upsert_score(
        target,
        result,
        evaluated_by,
        engine.now(),
        engine.config.score_history_cap,
    )?;

    if !score.risk_tier.is_alerting() {
        return Ok(EvaluationOutcome { score, alert: None });
    }

    let draft = alert(&score);
    let dispatched = engine.dispatcher().dispatch(DispatchParams {
        organization_id: score.organization_id.clone(),
        alert_type: draft.alert_type,
        severity: Severity::from_tier(score.risk_tier),
        title: draft.title,
        description: draft.description,
        related_entity_type: score.entity_type,
        related_entity_id: score.entity_id.clone(),
        risk_score_id: Some(score.id.clone()),
        score_components: score.components.clone(),
        cooldown_ms: None,
    })?;
    Ok(EvaluationOutcome { score, alert: dispatched })
}

/// What an agent contributes to an alert: the rest comes from the score.
pub(crate) struct AlertDraft {
    pub alert_type: crate::alert::AlertType,
    pub title: String,
    pub description: String,
}

/// Append the confidence warning, if any, to an alert description.
pub(crate) fn with_warning(description: String, warning: Option<&str>) -> String {
    match warning {
        Some(w) => format!("{description} {w}"),
        None => description,
    }
}
