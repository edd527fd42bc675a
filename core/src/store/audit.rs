//! Audit log queries.

use super::{ts_col, RiskStore};
use crate::{
    audit::{AuditEntry, AuditSink, AuditStatus},
    error::RiskResult,
    types::to_millis,
};
use rusqlite::params;

impl AuditSink for RiskStore {
    fn create_log(&self, entry: &AuditEntry) -> RiskResult<()> {
        self.conn().execute(
            "INSERT INTO audit_log (organization_id, user_id, action, entity_type, entity_id,
                metadata, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                entry.organization_id,
                entry.user_id,
                entry.action,
                entry.entity_type,
                entry.entity_id,
                serde_json::to_string(&entry.metadata)?,
                entry.status.as_str(),
                to_millis(entry.created_at),
            ],
        )?;
        Ok(())
    }
}

impl RiskStore {
    /// Audit entries for one entity, oldest first.
    pub fn audit_log_for(&self, organization_id: &str, entity_id: &str) -> RiskResult<Vec<AuditEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT organization_id, user_id, action, entity_type, entity_id, metadata, status,
                    created_at
             FROM audit_log
             WHERE organization_id=?1 AND entity_id=?2
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![organization_id, entity_id], |r| {
            Ok(AuditEntry {
                organization_id: r.get(0)?,
                user_id: r.get(1)?,
                action: r.get(2)?,
                entity_type: r.get(3)?,
                entity_id: r.get(4)?,
                metadata: super::json_col(r, 5)?,
                status: if r.get::<_, String>(6)? == "failure" {
                    AuditStatus::Failure
                } else {
                    AuditStatus::Success
                },
                created_at: ts_col(r, 7)?,
            })
        })?;
        let mut result = Vec::new();
        for r in rows {
            result.push(r?);
        }
        Ok(result)
    }
}
