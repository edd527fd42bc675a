//! Notification boundary. Delivery itself is someone else's job; the engine
//! hands over a message and moves on.

use crate::{error::RiskResult, types::Severity};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub organization_id: String,
    pub recipient: String,
    pub subject: String,
    pub message: String,
    pub severity: Severity,
}

pub trait Notifier: Send + Sync {
    fn send_notification(&self, notification: &Notification) -> RiskResult<()>;
}

/// Writes notifications to the log. The default when no transport is wired.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_notification(&self, n: &Notification) -> RiskResult<()> {
        log::info!(
            "notify org={} to={} severity={}: {}",
            n.organization_id,
            n.recipient,
            n.severity,
            n.subject
        );
        Ok(())
    }
}
