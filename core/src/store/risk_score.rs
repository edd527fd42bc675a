//! Risk score queries: current score per entity, history, tier distribution.

use super::{enum_col, json_col, ts_col, RiskStore};
use crate::{
    error::RiskResult,
    risk_score::{apply_evaluation, RiskScore, ScoreHistoryEntry, ScoreTarget},
    scoring::ScoreResult,
    types::{to_millis, EntityType, EvaluatedBy, RiskTier},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

const SCORE_COLUMNS: &str = "id, organization_id, entity_type, entity_id, overall_score,
    risk_tier, components, confidence, low_confidence, confidence_warning, evaluated_at,
    evaluated_by, previous_score, score_history";

fn score_from_row(r: &Row<'_>) -> rusqlite::Result<RiskScore> {
    Ok(RiskScore {
        id: r.get(0)?,
        organization_id: r.get(1)?,
        entity_type: enum_col(r, 2, EntityType::parse)?,
        entity_id: r.get(3)?,
        overall_score: r.get(4)?,
        risk_tier: enum_col(r, 5, |s| s.parse().ok())?,
        components: json_col(r, 6)?,
        confidence: r.get(7)?,
        low_confidence: r.get::<_, i32>(8)? != 0,
        confidence_warning: r.get(9)?,
        evaluated_at: ts_col(r, 10)?,
        evaluated_by: EvaluatedBy::parse(&r.get::<_, String>(11)?),
        previous_score: r.get(12)?,
        score_history: json_col(r, 13)?,
    })
}

fn read_score(
    conn: &Connection,
    organization_id: &str,
    entity_type: EntityType,
    entity_id: &str,
) -> RiskResult<Option<RiskScore>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {SCORE_COLUMNS} FROM risk_score
                 WHERE organization_id=?1 AND entity_type=?2 AND entity_id=?3"
            ),
            params![organization_id, entity_type.as_str(), entity_id],
            score_from_row,
        )
        .optional()?)
}

impl RiskStore {
    pub fn get_score(
        &self,
        organization_id: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RiskResult<Option<RiskScore>> {
        read_score(&self.conn(), organization_id, entity_type, entity_id)
    }

    /// Write a fresh evaluation as the entity's current score, moving the
    /// displaced score into history. Read and write share one transaction.
    pub fn upsert_score(
        &self,
        target: ScoreTarget<'_>,
        result: &ScoreResult,
        evaluated_by: EvaluatedBy,
        now: DateTime<Utc>,
        history_cap: usize,
    ) -> RiskResult<RiskScore> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let existing = read_score(&tx, target.organization_id, target.entity_type, target.entity_id)?;
        let score = apply_evaluation(existing, target, result, evaluated_by, now, history_cap);

        tx.execute(
            "INSERT INTO risk_score (id, organization_id, entity_type, entity_id, overall_score,
                risk_tier, components, confidence, low_confidence, confidence_warning,
                evaluated_at, evaluated_by, previous_score, score_history)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (organization_id, entity_type, entity_id) DO UPDATE SET
                overall_score=excluded.overall_score,
                risk_tier=excluded.risk_tier,
                components=excluded.components,
                confidence=excluded.confidence,
                low_confidence=excluded.low_confidence,
                confidence_warning=excluded.confidence_warning,
                evaluated_at=excluded.evaluated_at,
                evaluated_by=excluded.evaluated_by,
                previous_score=excluded.previous_score,
                score_history=excluded.score_history",
            params![
                score.id,
                score.organization_id,
                score.entity_type.as_str(),
                score.entity_id,
                score.overall_score,
                score.risk_tier.as_str(),
                serde_json::to_string(&score.components)?,
                score.confidence,
                score.low_confidence as i32,
                score.confidence_warning,
                to_millis(score.evaluated_at),
                score.evaluated_by.as_str(),
                score.previous_score,
                serde_json::to_string(&score.score_history)?,
            ],
        )?;
        tx.commit()?;
        Ok(score)
    }

    /// Past scores, oldest first. Empty for entities never scored.
    pub fn get_score_history(
        &self,
        organization_id: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RiskResult<Vec<ScoreHistoryEntry>> {
        Ok(self
            .get_score(organization_id, entity_type, entity_id)?
            .map(|s| s.score_history)
            .unwrap_or_default())
    }

    /// Count of current scores per tier, optionally for one entity type.
    /// Every tier is present in the result, zero or not.
    pub fn risk_tier_distribution(
        &self,
        organization_id: &str,
        entity_type: Option<EntityType>,
    ) -> RiskResult<BTreeMap<RiskTier, u64>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT risk_tier, COUNT(*) FROM risk_score
             WHERE organization_id=?1 AND (?2 IS NULL OR entity_type=?2)
             GROUP BY risk_tier",
        )?;
        let rows = stmt.query_map(
            params![organization_id, entity_type.map(|t| t.as_str())],
            |r| Ok((enum_col(r, 0, |s| s.parse::<RiskTier>().ok())?, r.get::<_, i64>(1)?)),
        )?;

        let mut dist: BTreeMap<RiskTier, u64> =
            [RiskTier::Low, RiskTier::Medium, RiskTier::High, RiskTier::Critical]
                .into_iter()
                .map(|t| (t, 0))
                .collect();
        for r in rows {
            let (tier, count) = r?;
            dist.insert(tier, count as u64);
        }
        Ok(dist)
    }

    /// Current scores of one type, highest first.
    pub fn list_scores(&self, organization_id: &str, entity_type: EntityType) -> RiskResult<Vec<RiskScore>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCORE_COLUMNS} FROM risk_score
             WHERE organization_id=?1 AND entity_type=?2
             ORDER BY overall_score DESC, entity_id"
        ))?;
        let rows = stmt.query_map(params![organization_id, entity_type.as_str()], score_from_row)?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }
}
