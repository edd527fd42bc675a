//! Deterministic risk scoring for suppliers, shipments and inventory.
//!
//! Every engine is a pure function of (entity snapshot, auxiliary inputs,
//! threshold band, now). Components are computed unrounded, the weighted sum
//! is taken over the unrounded values, and only then is the overall score
//! rounded. Exposed components are rounded separately.
//!
//! Confidence starts at 100 and loses a fixed penalty per missing or stale
//! input, each penalty leaving a human-readable warning behind.

pub mod inventory;
pub mod shipment;
pub mod supplier;

pub use inventory::score_inventory;
pub use shipment::score_shipment;
pub use supplier::score_supplier;

use crate::{
    org_config::ThresholdBand,
    types::{Components, RiskTier},
};
use serde::{Deserialize, Serialize};

/// Scores below this confidence are provisional.
pub const LOW_CONFIDENCE_BELOW: u8 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub overall_score: u8,
    pub risk_tier: RiskTier,
    pub components: Components,
    pub confidence: u8,
    pub low_confidence: bool,
    pub confidence_warning: Option<String>,
}

impl ScoreResult {
    pub fn component(&self, name: &str) -> f64 {
        self.components.get(name).copied().unwrap_or(0.0)
    }
}

/// `score > high ⇒ critical; > medium ⇒ high; > low ⇒ medium; else low`.
pub fn classify_tier(score: u8, band: &ThresholdBand) -> RiskTier {
    let score = f64::from(score);
    if score > band.high {
        RiskTier::Critical
    } else if score > band.medium {
        RiskTier::High
    } else if score > band.low {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Running confidence tally for one evaluation.
#[derive(Debug)]
pub(crate) struct Confidence {
    value: i32,
    warnings: Vec<String>,
}

impl Confidence {
    pub(crate) fn new() -> Self {
        Self { value: 100, warnings: Vec::new() }
    }

    pub(crate) fn penalize(&mut self, amount: i32, warning: impl Into<String>) {
        self.value -= amount;
        self.warnings.push(warning.into());
    }

    fn finish(self) -> (u8, Option<String>) {
        let value = self.value.clamp(0, 100) as u8;
        let warning = if self.warnings.is_empty() {
            None
        } else {
            Some(self.warnings.join("; "))
        };
        (value, warning)
    }
}

/// One weighted input to an overall score.
pub(crate) struct Weighted {
    pub name: &'static str,
    pub value: f64,
    pub weight: f64,
}

/// Combine weighted components into a finished result.
pub(crate) fn finish(
    parts: &[Weighted],
    confidence: Confidence,
    band: &ThresholdBand,
) -> ScoreResult {
    let sum: f64 = parts.iter().map(|p| p.value * p.weight).sum();
    let overall_score = sum.round().clamp(0.0, 100.0) as u8;

    let components = parts
        .iter()
        .map(|p| (p.name.to_string(), p.value.round()))
        .collect();

    let (confidence, confidence_warning) = confidence.finish();

    ScoreResult {
        overall_score,
        risk_tier: classify_tier(overall_score, band),
        components,
        confidence,
        low_confidence: confidence < LOW_CONFIDENCE_BELOW,
        confidence_warning,
    }
}
