//! The wired risk engine: store, audit sink, notifier, clock and config.
//!
//! Everything is behind an `Arc`, so cloning a `RiskEngine` is cheap and each
//! component (dispatcher, workflow, escalation, agents) holds its own clone.
//!
//! AGENT ORDER (as registered by `agents()`):
//!   1. supplierRiskAgent     every 240 min
//!   2. shipmentRiskAgent     every 15 min
//!   3. inventoryRiskAgent    every 30 min  (reads supplier scores)
//!   4. alertEscalationAgent  every 5 min

use crate::{
    agent::{
        escalation::AlertEscalationAgent, inventory::InventoryRiskAgent,
        shipment::ShipmentRiskAgent, supplier::SupplierRiskAgent, Agent, EvaluationOutcome,
    },
    audit::AuditSink,
    clock::{Clock, SystemClock},
    config::EngineConfig,
    dispatcher::AlertDispatcher,
    error::RiskResult,
    escalation::EscalationEngine,
    notify::{LogNotifier, Notifier},
    org_config::OrganizationConfig,
    store::RiskStore,
    types::EntityType,
    workflow::AlertWorkflow,
};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct RiskEngine {
    pub store: Arc<RiskStore>,
    pub audit: Arc<dyn AuditSink>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<EngineConfig>,
}

impl RiskEngine {
    /// Audit entries go to the same store; notifications go to the log.
    pub fn new(store: Arc<RiskStore>, config: EngineConfig) -> Self {
        Self {
            audit: store.clone(),
            store,
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn org_config(&self, organization_id: &str) -> RiskResult<OrganizationConfig> {
        self.store.get_org_config(organization_id, self.now())
    }

    pub fn dispatcher(&self) -> AlertDispatcher {
        AlertDispatcher::new(self.clone())
    }

    pub fn workflow(&self) -> AlertWorkflow {
        AlertWorkflow::new(self.clone())
    }

    pub fn escalation(&self) -> EscalationEngine {
        EscalationEngine::new(self.clone())
    }

    /// All four agents, in the documented order.
    pub fn agents(&self) -> Vec<Arc<dyn Agent>> {
        vec![
            Arc::new(SupplierRiskAgent::new(self.clone())),
            Arc::new(ShipmentRiskAgent::new(self.clone())),
            Arc::new(InventoryRiskAgent::new(self.clone())),
            Arc::new(AlertEscalationAgent::new(self.clone())),
        ]
    }

    /// Score one entity now, outside the schedule. Recorded as a manual evaluation.
    pub fn evaluate_entity(
        &self,
        organization_id: &str,
        entity_type: EntityType,
        entity_id: &str,
    ) -> RiskResult<EvaluationOutcome> {
        match entity_type {
            EntityType::Supplier => SupplierRiskAgent::new(self.clone()).evaluate_one(organization_id, entity_id),
            EntityType::Shipment => ShipmentRiskAgent::new(self.clone()).evaluate_one(organization_id, entity_id),
            EntityType::Inventory => InventoryRiskAgent::new(self.clone()).evaluate_one(organization_id, entity_id),
        }
    }

    /// Reap soft-deleted alerts older than the retention window.
    pub fn purge_expired_alerts(&self) -> RiskResult<usize> {
        let cutoff = self.now() - Duration::days(self.config.alert_retention_days);
        self.store.purge_deleted_alerts(cutoff)
    }
}
