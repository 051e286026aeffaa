use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tool::ToolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FragmentType {
    Entity,
    Relationship,
    Theme,
    Metric,
    Summary,
    Finding,
    Evidence,
    Comparison,
    Answer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    ConfidenceWeighted,
    Majority,
    SourcePriority,
    ConsensusOnly,
    AllPerspectives,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        ConflictPolicy::ConfidenceWeighted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SynthesisStrategy {
    Comprehensive,
    Focused,
    Comparative,
    Narrative,
    Analytical,
    Summary,
}

impl Default for SynthesisStrategy {
    fn default() -> Self {
        SynthesisStrategy::Comprehensive
    }
}

/// A structured unit of synthesized content attributable to one or more
/// tools (spec.md §3, §4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisFragment {
    pub content: String,
    pub source_tools: Vec<ToolId>,
    pub confidence: f64,
    pub fragment_type: FragmentType,
    pub supporting_evidence: Vec<String>,
}

/// Quality metrics reported alongside a [`SynthesisResult`] (spec.md
/// §4.11 "Quality metrics").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub overall_confidence: f64,
    pub coverage: f64,
    pub coherence: f64,
}

/// Output of the Response Synthesizer: the structured answer to a question
/// plus caveats (spec.md §3, §4.11).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub primary_response: String,
    pub fragments: Vec<SynthesisFragment>,
    pub overall_confidence: f64,
    pub strategy: SynthesisStrategy,
    /// Fraction, keyed by tool, of how much each contributed content.
    pub tool_coverage: BTreeMap<ToolId, f64>,
    pub quality_metrics: QualityMetrics,
    pub alternatives: Vec<String>,
    pub caveats: Vec<String>,
}
