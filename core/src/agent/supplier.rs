use super::{record_and_alert, run_entities, with_warning, Agent, AgentName, AgentRunSummary, AlertDraft,
    EntityEvaluator, EvaluationOutcome};
use crate::{
    alert::AlertType,
    engine::RiskEngine,
    entity::Supplier,
    error::RiskResult,
    org_config::OrganizationConfig,
    risk_score::ScoreTarget,
    scoring::score_supplier,
    types::{EntityType, EvaluatedBy},
};

/// Scores active, watched and high-risk suppliers.
pub struct SupplierRiskAgent {
    engine: RiskEngine,
}

impl SupplierRiskAgent {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    /// Score one supplier now, regardless of its status.
    pub fn evaluate_one(&self, organization_id: &str, supplier_id: &str) -> RiskResult<EvaluationOutcome> {
        let config = self.engine.org_config(organization_id)?;
        let supplier = self.engine.store.get_supplier(organization_id, supplier_id)?;
        self.evaluate(&config, &supplier, EvaluatedBy::Manual)
    }
}

impl EntityEvaluator for SupplierRiskAgent {
    type Entity = Supplier;

    fn agent(&self) -> AgentName {
        AgentName::SupplierRisk
    }

    fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    fn load_active(&self, organization_id: &str) -> RiskResult<Vec<Supplier>> {
        self.engine.store.find_active_suppliers(organization_id)
    }

    fn entity_id<'e>(&self, supplier: &'e Supplier) -> &'e str {
        &supplier.id
    }

    fn evaluate(
        &self,
        config: &OrganizationConfig,
        supplier: &Supplier,
        evaluated_by: EvaluatedBy,
    ) -> RiskResult<EvaluationOutcome> {
        let band = config.risk_thresholds.for_entity(EntityType::Supplier);
        let result = score_supplier(supplier, &band, self.engine.now());
        let target = ScoreTarget {
            organization_id: &supplier.organization_id,
            entity_type: EntityType::Supplier,
            entity_id: &supplier.id,
        };

        record_and_alert(&self.engine, target, &result, evaluated_by, |score| AlertDraft {
            alert_type: AlertType::SupplierRisk,
            title: format!(
                "Supplier Risk Alert: {} ({})",
                supplier.name,
                score.risk_tier.as_str().to_uppercase()
            ),
            description: with_warning(
                format!(
                    "Supplier \"{}\" ({}) has a risk score of {}/100.",
                    supplier.name, supplier.supplier_code, score.overall_score
                ),
                score.confidence_warning.as_deref(),
            ),
        })
    }
}

impl Agent for SupplierRiskAgent {
    fn name(&self) -> AgentName {
        AgentName::SupplierRisk
    }

    fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary> {
        run_entities(self, target_org)
    }
}
