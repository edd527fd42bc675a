//! Engine configuration: agent cadence, lock bookkeeping, retention.
//!
//! Organization-level knobs (thresholds, escalation rules, cooldowns) live
//! in `org_config` and the store, not here.

use crate::agent::AgentName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub interval_minutes: u64,
    /// A run holding its lock longer than this is reported as stale.
    pub lock_timeout_ms: u64,
    /// Extra attempts the scheduler makes after a failed run.
    pub max_retries: u32,
    pub enabled: bool,
    #[serde(default)]
    pub description: String,
}

impl AgentConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn lock_timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.lock_timeout_ms as i64)
    }

    fn defaults_for(agent: AgentName) -> Self {
        match agent {
            AgentName::SupplierRisk => Self {
                interval_minutes: 240,
                lock_timeout_ms: 5 * 60 * 1000,
                max_retries: 3,
                enabled: true,
                description: "Evaluates supplier risk from performance and financial data".into(),
            },
            AgentName::ShipmentRisk => Self {
                interval_minutes: 15,
                lock_timeout_ms: 5 * 60 * 1000,
                max_retries: 3,
                enabled: true,
                description: "Evaluates shipment risk from ETA deviation, weather and carrier data".into(),
            },
            AgentName::InventoryRisk => Self {
                interval_minutes: 30,
                lock_timeout_ms: 5 * 60 * 1000,
                max_retries: 3,
                enabled: true,
                description: "Evaluates inventory risk from stock levels and demand history".into(),
            },
            AgentName::AlertEscalation => Self {
                interval_minutes: 5,
                lock_timeout_ms: 2 * 60 * 1000,
                max_retries: 2,
                enabled: true,
                description: "Escalates unresolved alerts past their severity timeout".into(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub agents: BTreeMap<AgentName, AgentConfig>,
    /// Maximum score history entries kept per entity.
    pub score_history_cap: usize,
    /// Soft-deleted alerts older than this are purged.
    pub alert_retention_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agents: AgentName::ALL
                .iter()
                .map(|a| (*a, AgentConfig::defaults_for(*a)))
                .collect(),
            score_history_cap: crate::risk_score::SCORE_HISTORY_CAP,
            alert_retention_days: 90,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. Agents missing from the file keep their defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        #[derive(Deserialize)]
        struct EngineConfigFile {
            #[serde(default)]
            agents: BTreeMap<AgentName, AgentConfig>,
            score_history_cap: Option<usize>,
            alert_retention_days: Option<i64>,
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading engine config {path}: {e}"))?;
        let file: EngineConfigFile = serde_json::from_str(&raw)?;

        let mut config = Self::default();
        for (agent, agent_config) in file.agents {
            if agent_config.interval_minutes == 0 {
                anyhow::bail!("agent {agent}: interval_minutes must be > 0");
            }
            config.agents.insert(agent, agent_config);
        }
        if let Some(cap) = file.score_history_cap {
            config.score_history_cap = cap;
        }
        if let Some(days) = file.alert_retention_days {
            config.alert_retention_days = days;
        }
        log::info!("engine config loaded from {path}");
        Ok(config)
    }

    pub fn agent(&self, agent: AgentName) -> AgentConfig {
        self.agents
            .get(&agent)
            .cloned()
            .unwrap_or_else(|| AgentConfig::defaults_for(agent))
    }
}
