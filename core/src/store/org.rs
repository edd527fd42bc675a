//! Organization configuration queries.

use super::{list_active_orgs, RiskStore};
use crate::{
    error::RiskResult,
    org_config::OrganizationConfig,
    types::to_millis,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

/// Read the config, creating and storing the defaults if there is none yet.
fn load_or_create(conn: &Connection, organization_id: &str, now: DateTime<Utc>) -> RiskResult<OrganizationConfig> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT config FROM organization_config WHERE organization_id=?1",
            params![organization_id],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => {
            let config = OrganizationConfig::with_defaults(organization_id);
            write_config(conn, &config, now)?;
            log::info!("created default config for org={organization_id}");
            Ok(config)
        }
    }
}

fn write_config(conn: &Connection, config: &OrganizationConfig, now: DateTime<Utc>) -> RiskResult<()> {
    conn.execute(
        "INSERT INTO organization_config (organization_id, config, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (organization_id) DO UPDATE SET
            config=excluded.config, updated_at=excluded.updated_at",
        params![config.organization_id, serde_json::to_string(config)?, to_millis(now)],
    )?;
    Ok(())
}

impl RiskStore {
    /// The organization's config; created with defaults on first access.
    pub fn get_org_config(&self, organization_id: &str, now: DateTime<Utc>) -> RiskResult<OrganizationConfig> {
        load_or_create(&self.conn(), organization_id, now)
    }

    /// Validates before writing; an invalid config never reaches the table.
    pub fn save_org_config(&self, config: &OrganizationConfig, now: DateTime<Utc>) -> RiskResult<()> {
        config.validate()?;
        write_config(&self.conn(), config, now)
    }

    /// Stamp `run_key` with `at` on every active organization's config.
    /// Returns the number of organizations touched.
    pub fn record_agent_run(&self, run_key: &str, at: DateTime<Utc>) -> RiskResult<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let orgs = list_active_orgs(&tx)?;
        for org in &orgs {
            let mut config = load_or_create(&tx, org, at)?;
            config.last_agent_run.insert(run_key.to_string(), at);
            write_config(&tx, &config, at)?;
        }
        tx.commit()?;
        Ok(orgs.len())
    }
}
