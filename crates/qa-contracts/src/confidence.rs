use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tool::ToolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceSource {
    ToolOutput,
    ExecutionSuccess,
    DataQuality,
    TemporalConsistency,
    CrossValidation,
    Statistical,
    Domain,
    UserFeedback,
}

/// One observation fed into the Confidence Aggregator (spec.md §3, §4.10).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceInput {
    pub source_id: String,
    pub source_type: ConfidenceSource,
    /// High is good, `[0, 1]`.
    pub confidence: f64,
    /// High is bad, `[0, 1]`; independent of `confidence` per spec.md §9's
    /// fixed sign convention.
    pub uncertainty: f64,
    pub weight: f64,
    pub execution_time: f64,
    pub data_volume: usize,
}

impl ConfidenceInput {
    pub fn new(source_id: impl Into<String>, source_type: ConfidenceSource, confidence: f64) -> Self {
        Self {
            source_id: source_id.into(),
            source_type,
            confidence: confidence.clamp(0.0, 1.0),
            uncertainty: 0.0,
            weight: 1.0,
            execution_time: 0.0,
            data_volume: 0,
        }
    }
}

/// Output of the Confidence Aggregator. All scalar components are in
/// `[0, 1]` (spec.md §3 invariant, §8 quantified invariant 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub overall: f64,
    pub variance: f64,
    pub uncertainty_level: f64,
    pub reliability: f64,
    pub consensus_strength: f64,
    pub per_tool: BTreeMap<ToolId, f64>,
    pub per_source: BTreeMap<String, f64>,
    pub outliers: Vec<String>,
    pub distribution: BTreeMap<String, f64>,
}
