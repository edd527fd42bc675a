use super::{record_and_alert, run_entities, with_warning, Agent, AgentName, AgentRunSummary, AlertDraft,
    EntityEvaluator, EvaluationOutcome};
use crate::{
    alert::AlertType,
    engine::RiskEngine,
    entity::Shipment,
    error::RiskResult,
    org_config::OrganizationConfig,
    risk_score::ScoreTarget,
    scoring::{score_shipment, shipment::ETA_DEVIATION},
    types::{EntityType, EvaluatedBy},
};

/// Scores shipments that have not been delivered or cancelled.
pub struct ShipmentRiskAgent {
    engine: RiskEngine,
}

impl ShipmentRiskAgent {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    pub fn evaluate_one(&self, organization_id: &str, shipment_id: &str) -> RiskResult<EvaluationOutcome> {
        let config = self.engine.org_config(organization_id)?;
        let shipment = self.engine.store.get_shipment(organization_id, shipment_id)?;
        self.evaluate(&config, &shipment, EvaluatedBy::Manual)
    }
}

impl EntityEvaluator for ShipmentRiskAgent {
    type Entity = Shipment;

    fn agent(&self) -> AgentName {
        AgentName::ShipmentRisk
    }

    fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    fn load_active(&self, organization_id: &str) -> RiskResult<Vec<Shipment>> {
        self.engine.store.find_active_shipments(organization_id)
    }

    fn entity_id<'e>(&self, shipment: &'e Shipment) -> &'e str {
        &shipment.id
    }

    fn evaluate(
        &self,
        config: &OrganizationConfig,
        shipment: &Shipment,
        evaluated_by: EvaluatedBy,
    ) -> RiskResult<EvaluationOutcome> {
        let band = config.risk_thresholds.for_entity(EntityType::Shipment);
        let result = score_shipment(shipment, &band, self.engine.now());
        let target = ScoreTarget {
            organization_id: &shipment.organization_id,
            entity_type: EntityType::Shipment,
            entity_id: &shipment.id,
        };

        record_and_alert(&self.engine, target, &result, evaluated_by, |score| AlertDraft {
            alert_type: AlertType::ShipmentDelay,
            title: format!(
                "Shipment Delay Alert: {} ({})",
                shipment.shipment_number,
                score.risk_tier.as_str().to_uppercase()
            ),
            description: with_warning(
                format!(
                    "Shipment \"{}\" via {} has a risk score of {}/100. ETA deviation: {}h.",
                    shipment.shipment_number,
                    shipment.carrier,
                    score.overall_score,
                    result.component(ETA_DEVIATION)
                ),
                score.confidence_warning.as_deref(),
            ),
        })
    }
}

impl Agent for ShipmentRiskAgent {
    fn name(&self) -> AgentName {
        AgentName::ShipmentRisk
    }

    fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary> {
        run_entities(self, target_org)
    }
}
