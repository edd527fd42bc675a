//! Alert queries.
//!
//! Alerts are never hard-deleted here except by `purge_deleted_alerts`, which
//! reaps soft-deleted rows past the retention window.

use super::{check_versioned_update, enum_col, json_col, opt_ts, opt_ts_col, ts_col, RiskStore};
use crate::{
    alert::{Alert, AlertStatus, AlertType, MAX_ESCALATION_LEVEL},
    error::{RiskError, RiskResult},
    types::{to_millis, EntityType},
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

const ALERT_COLUMNS: &str = "id, organization_id, alert_type, severity, title, description,
    related_entity_type, related_entity_id, risk_score_id, status, assigned_to, assigned_at,
    acknowledged_at, resolved_at, resolution_notes, escalation_level, escalation_history,
    recommendations, cooldown_until, created_at, deleted_at, version";

fn alert_from_row(r: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: r.get(0)?,
        organization_id: r.get(1)?,
        alert_type: enum_col(r, 2, AlertType::parse)?,
        severity: enum_col(r, 3, |s| s.parse().ok())?,
        title: r.get(4)?,
        description: r.get(5)?,
        related_entity_type: enum_col(r, 6, EntityType::parse)?,
        related_entity_id: r.get(7)?,
        risk_score_id: r.get(8)?,
        status: enum_col(r, 9, AlertStatus::parse)?,
        assigned_to: r.get(10)?,
        assigned_at: opt_ts_col(r, 11)?,
        acknowledged_at: opt_ts_col(r, 12)?,
        resolved_at: opt_ts_col(r, 13)?,
        resolution_notes: r.get(14)?,
        escalation_level: r.get(15)?,
        escalation_history: json_col(r, 16)?,
        recommendations: json_col(r, 17)?,
        cooldown_until: ts_col(r, 18)?,
        created_at: ts_col(r, 19)?,
        deleted_at: opt_ts_col(r, 20)?,
        version: r.get(21)?,
    })
}

/// Open alert for the same fingerprint whose cooldown has not expired.
fn read_cooling_alert(
    conn: &Connection,
    organization_id: &str,
    related_entity_id: &str,
    alert_type: AlertType,
    now: DateTime<Utc>,
) -> RiskResult<Option<Alert>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {ALERT_COLUMNS} FROM alert
                 WHERE organization_id=?1 AND related_entity_id=?2 AND alert_type=?3
                   AND status NOT IN ('resolved', 'archived')
                   AND deleted_at IS NULL
                   AND cooldown_until > ?4
                 ORDER BY cooldown_until DESC
                 LIMIT 1"
            ),
            params![organization_id, related_entity_id, alert_type.as_str(), to_millis(now)],
            alert_from_row,
        )
        .optional()?)
}

fn insert_alert(conn: &Connection, a: &Alert) -> RiskResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO alert ({ALERT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21, ?22)"
        ),
        params![
            a.id,
            a.organization_id,
            a.alert_type.as_str(),
            a.severity.as_str(),
            a.title,
            a.description,
            a.related_entity_type.as_str(),
            a.related_entity_id,
            a.risk_score_id,
            a.status.as_str(),
            a.assigned_to,
            opt_ts(a.assigned_at),
            opt_ts(a.acknowledged_at),
            opt_ts(a.resolved_at),
            a.resolution_notes,
            a.escalation_level,
            serde_json::to_string(&a.escalation_history)?,
            serde_json::to_string(&a.recommendations)?,
            to_millis(a.cooldown_until),
            to_millis(a.created_at),
            opt_ts(a.deleted_at),
            a.version,
        ],
    )?;
    Ok(())
}

impl RiskStore {
    pub fn check_cooldown(
        &self,
        organization_id: &str,
        related_entity_id: &str,
        alert_type: AlertType,
        now: DateTime<Utc>,
    ) -> RiskResult<Option<Alert>> {
        read_cooling_alert(&self.conn(), organization_id, related_entity_id, alert_type, now)
    }

    /// Insert `alert` unless an open alert with the same fingerprint is still
    /// cooling down. The check and the insert run in one transaction under the
    /// connection lock, so two dispatches of the same fingerprint cannot both
    /// insert. Returns whether the alert was created.
    pub fn create_alert_unless_cooling(&self, alert: &Alert, now: DateTime<Utc>) -> RiskResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        if let Some(existing) = read_cooling_alert(
            &tx,
            &alert.organization_id,
            &alert.related_entity_id,
            alert.alert_type,
            now,
        )? {
            log::debug!(
                "alert suppressed by cooldown: type={} entity={} until={}",
                alert.alert_type,
                alert.related_entity_id,
                existing.cooldown_until
            );
            return Ok(false);
        }
        insert_alert(&tx, alert)?;
        tx.commit()?;
        Ok(true)
    }

    pub fn insert_alert(&self, alert: &Alert) -> RiskResult<()> {
        insert_alert(&self.conn(), alert)
    }

    /// A live (not soft-deleted) alert.
    pub fn get_alert(&self, organization_id: &str, id: &str) -> RiskResult<Alert> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {ALERT_COLUMNS} FROM alert
                     WHERE id=?1 AND organization_id=?2 AND deleted_at IS NULL"
                ),
                params![id, organization_id],
                alert_from_row,
            )
            .optional()?
            .ok_or_else(|| RiskError::not_found("alert", id))
    }

    /// Persist every mutable field of `alert`, conditioned on the stored
    /// version still being `expected_version`. Returns the stored alert.
    pub fn update_alert(&self, alert: &Alert, expected_version: i64) -> RiskResult<Alert> {
        let conn = self.conn();
        let n = conn.execute(
            "UPDATE alert SET status=?1, assigned_to=?2, assigned_at=?3, acknowledged_at=?4,
                resolved_at=?5, resolution_notes=?6, escalation_level=?7,
                escalation_history=?8, recommendations=?9, deleted_at=?10,
                version=version+1
             WHERE id=?11 AND organization_id=?12 AND version=?13",
            params![
                alert.status.as_str(),
                alert.assigned_to,
                opt_ts(alert.assigned_at),
                opt_ts(alert.acknowledged_at),
                opt_ts(alert.resolved_at),
                alert.resolution_notes,
                alert.escalation_level,
                serde_json::to_string(&alert.escalation_history)?,
                serde_json::to_string(&alert.recommendations)?,
                opt_ts(alert.deleted_at),
                alert.id,
                alert.organization_id,
                expected_version,
            ],
        )?;
        check_versioned_update(&conn, n, "alert", &alert.id, &alert.organization_id, expected_version)?;
        Ok(Alert { version: expected_version + 1, ..alert.clone() })
    }

    /// Owned, unfinished alerts that can still climb the ladder.
    pub fn find_for_escalation(&self, organization_id: &str) -> RiskResult<Vec<Alert>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert
             WHERE organization_id=?1
               AND status IN ('assigned', 'acknowledged', 'inReview')
               AND deleted_at IS NULL
               AND escalation_level < ?2
             ORDER BY created_at, id"
        ))?;
        let rows = stmt.query_map(params![organization_id, MAX_ESCALATION_LEVEL], alert_from_row)?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }

    /// Live alerts for an organization, newest first.
    pub fn list_alerts(&self, organization_id: &str, status: Option<AlertStatus>) -> RiskResult<Vec<Alert>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM alert
             WHERE organization_id=?1 AND deleted_at IS NULL
               AND (?2 IS NULL OR status=?2)
             ORDER BY created_at DESC, id"
        ))?;
        let rows = stmt.query_map(
            params![organization_id, status.map(|s| s.as_str())],
            alert_from_row,
        )?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }

    /// Hard-delete alerts soft-deleted before `cutoff`. Returns the count.
    pub fn purge_deleted_alerts(&self, cutoff: DateTime<Utc>) -> RiskResult<usize> {
        let n = self.conn().execute(
            "DELETE FROM alert WHERE deleted_at IS NOT NULL AND deleted_at < ?1",
            params![to_millis(cutoff)],
        )?;
        if n > 0 {
            log::info!("purged {n} soft-deleted alerts older than {cutoff}");
        }
        Ok(n)
    }
}
