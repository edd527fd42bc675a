//! The current risk score of an entity and its bounded history.
//!
//! One row per (organization, entity type, entity id). Re-evaluating an entity
//! never deletes anything: the displaced score moves into `score_history`,
//! which is capped and evicts its oldest entries first.

use crate::{
    scoring::ScoreResult,
    types::{Components, EntityId, EntityType, EvaluatedBy, OrgId, RiskTier},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum history entries kept per entity.
pub const SCORE_HISTORY_CAP: usize = 365;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryEntry {
    pub score: u8,
    pub risk_tier: RiskTier,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskScore {
    pub id: String,
    pub organization_id: OrgId,
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub overall_score: u8,
    pub risk_tier: RiskTier,
    pub components: Components,
    pub confidence: u8,
    pub low_confidence: bool,
    pub confidence_warning: Option<String>,
    pub evaluated_at: DateTime<Utc>,
    pub evaluated_by: EvaluatedBy,
    pub previous_score: Option<u8>,
    /// Oldest first.
    pub score_history: Vec<ScoreHistoryEntry>,
}

/// Identifies the entity being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTarget<'a> {
    pub organization_id: &'a str,
    pub entity_type: EntityType,
    pub entity_id: &'a str,
}

/// Fold a fresh evaluation into the entity's current score.
///
/// With no existing row a new one is created with empty history. Otherwise the
/// displaced score is appended to history (trimmed to `history_cap`) and
/// becomes `previous_score`. The row id is preserved across evaluations.
pub fn apply_evaluation(
    existing: Option<RiskScore>,
    target: ScoreTarget<'_>,
    result: &ScoreResult,
    evaluated_by: EvaluatedBy,
    now: DateTime<Utc>,
    history_cap: usize,
) -> RiskScore {
    let (id, previous_score, mut score_history) = match existing {
        Some(prev) => {
            let mut history = prev.score_history;
            history.push(ScoreHistoryEntry {
                score: prev.overall_score,
                risk_tier: prev.risk_tier,
                evaluated_at: prev.evaluated_at,
            });
            (prev.id, Some(prev.overall_score), history)
        }
        None => (uuid::Uuid::new_v4().to_string(), None, Vec::new()),
    };

    if score_history.len() > history_cap {
        let excess = score_history.len() - history_cap;
        score_history.drain(..excess);
    }

    RiskScore {
        id,
        organization_id: target.organization_id.to_string(),
        entity_type: target.entity_type,
        entity_id: target.entity_id.to_string(),
        overall_score: result.overall_score,
        risk_tier: result.risk_tier,
        components: result.components.clone(),
        confidence: result.confidence,
        low_confidence: result.low_confidence,
        confidence_warning: result.confidence_warning.clone(),
        evaluated_at: now,
        evaluated_by,
        previous_score,
        score_history,
    }
}
