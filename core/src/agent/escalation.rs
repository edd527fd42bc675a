use super::{Agent, AgentName, AgentRunSummary};
use crate::{engine::RiskEngine, error::RiskResult};

/// Scheduled wrapper around the escalation engine.
pub struct AlertEscalationAgent {
    engine: RiskEngine,
}

impl AlertEscalationAgent {
    pub fn new(engine: RiskEngine) -> Self {
        Self { engine }
    }
}

impl Agent for AlertEscalationAgent {
    fn name(&self) -> AgentName {
        AgentName::AlertEscalation
    }

    fn run(&self, target_org: Option<&str>) -> RiskResult<AgentRunSummary> {
        self.engine.escalation().run(target_org)
    }
}
