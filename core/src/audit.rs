//! Audit trail.
//!
//! Audit writes are fire-and-forget from the engine's point of view: a failed
//! write is logged and never rolls back the change it describes.

use crate::{error::RiskResult, types::OrgId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub organization_id: OrgId,
    /// `None` for actions the engine takes on its own.
    pub user_id: Option<String>,
    /// Dotted action name, e.g. `alert.escalated`.
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub metadata: serde_json::Value,
    pub status: AuditStatus,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// A successful action on an alert.
    pub fn alert_action(
        organization_id: &str,
        user_id: Option<&str>,
        action: &str,
        alert_id: &str,
        metadata: serde_json::Value,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            organization_id: organization_id.to_string(),
            user_id: user_id.map(str::to_string),
            action: action.to_string(),
            entity_type: "alert".into(),
            entity_id: alert_id.to_string(),
            metadata,
            status: AuditStatus::Success,
            created_at: at,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn create_log(&self, entry: &AuditEntry) -> RiskResult<()>;
}

/// Write an audit entry, logging instead of failing.
pub fn record_audit(sink: &dyn AuditSink, entry: AuditEntry) {
    if let Err(e) = sink.create_log(&entry) {
        log::error!(
            "audit write failed: action={} {}={} org={}: {e}",
            entry.action,
            entry.entity_type,
            entry.entity_id,
            entry.organization_id
        );
    }
}
