use super::{record_and_alert, run_entities, with_warning, Agent, AgentName, AgentRunSummary, AlertDraft,
    EntityEvaluator, EvaluationOutcome};
use crate::{
    alert::AlertType,
    engine::RiskEngine,
    entity::InventoryItem,
    error::RiskResult,
    org_config::OrganizationConfig,
    risk_score::ScoreTarget,
    scoring::score_inventory,
    types::{EntityType, EvaluatedBy},
};

/// Scores every inventory item. Runs after the supplier agent in the
/// roster so that supplier scores are usually fresh.
pub struct InventoryRiskAgent {
    engine: RiskEngine,
}

impl InventoryRiskAgent {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }

    pub fn evaluate_one(&self, organization_id: &str, item_id: &str) -> RiskResult<EvaluationOutcome> {
        let config = self.engine.org_config(organization_id)?;
        let item = self.engine.store.get_inventory_item(organization_id, item_id)?;
        self.evaluate(&config, &item, EvaluatedBy::Manual)
    }

    /// The supplier's current overall score, if it has been scored.
    fn supplier_score(&self, item: &InventoryItem) -> RiskResult<Option<f64>> {
        let Some(supplier_id) = item.supplier_id.as_deref() else {
            return Ok(None);
        };
        let score = self
            .engine
            .store
            .get_score(&item.organization_id, EntityType::Supplier, supplier_id)?;
        Ok(score.map(|s| f64::from(s.overall_score)))
    }
}

impl EntityEvaluator for InventoryRiskAgent {
    type Entity = InventoryItem;

    fn agent(&self) -> AgentName {
        AgentName::InventoryRisk
    }

    fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    fn load_active(&self, organization_id: &str) -> RiskResult<Vec<InventoryItem>> {
        self.engine.store.find_active_inventory(organization_id)
    }

    fn entity_id<'e>(&self, item: &'e InventoryItem) -> &'e str {
        &item.id
    }

    fn evaluate(
        &self,
        config: &OrganizationConfig,
        item: &InventoryItem,
        evaluated_by: EvaluatedBy,
    ) -> RiskResult<EvaluationOutcome> {
        let band = config.risk_thresholds.for_entity(EntityType::Inventory);
        let supplier_score = self.supplier_score(item)?;
        let result = score_inventory(item, supplier_score, &band);
        let target = ScoreTarget {
            organization_id: &item.organization_id,
            entity_type: EntityType::Inventory,
            entity_id: &item.id,
        };

        record_and_alert(&self.engine, target, &result, evaluated_by, |score| AlertDraft {
            alert_type: if item.current_stock <= 0.0 {
                AlertType::InventoryStockout
            } else {
                AlertType::InventoryLow
            },
            title: format!(
                "Inventory Risk Alert: {} ({})",
                item.product_name,
                score.risk_tier.as_str().to_uppercase()
            ),
            description: with_warning(
                format!(
                    "SKU \"{}\" ({}) has a risk score of {}/100. Current stock: {}, Days of cover: {:.1}.",
                    item.sku, item.product_name, score.overall_score, item.current_stock, item.days_of_cover
                ),
                score.confidence_warning.as_deref(),
            ),
        })
    }
}

impl Agent for InventoryRiskAgent {
    fn name(&self) -> AgentName {
        AgentName::InventoryRisk
    }

    fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary> {
        run_entities(self, target_org)
    }
}
