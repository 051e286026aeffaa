use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::tool::ToolId;

/// One of the fixed set of 15 question intents this core recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Intent {
    DocumentSummary,
    EntityExtraction,
    RelationshipAnalysis,
    Theme,
    SpecificSearch,
    Comparative,
    PatternDiscovery,
    Predictive,
    Causal,
    Temporal,
    Statistical,
    Anomaly,
    Sentiment,
    Hierarchical,
    Network,
}

impl Intent {
    /// All fifteen intents, in the order spec.md §3 enumerates them.
    pub const ALL: [Intent; 15] = [
        Intent::DocumentSummary,
        Intent::EntityExtraction,
        Intent::RelationshipAnalysis,
        Intent::Theme,
        Intent::SpecificSearch,
        Intent::Comparative,
        Intent::PatternDiscovery,
        Intent::Predictive,
        Intent::Causal,
        Intent::Temporal,
        Intent::Statistical,
        Intent::Anomaly,
        Intent::Sentiment,
        Intent::Hierarchical,
        Intent::Network,
    ];
}

/// Output of the Intent Classifier (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub primary: Intent,
    pub secondary: Vec<Intent>,
    pub per_intent_score: BTreeMap<Intent, f64>,
    pub confidence: f64,
    pub requires_multi_step: bool,
    pub recommended_tools: BTreeSet<ToolId>,
}

impl IntentResult {
    /// The default result for a question that carries no detectable
    /// intent signal at all (e.g. an empty question), per spec.md §4.1.
    pub fn default_for_empty() -> Self {
        Self {
            primary: Intent::DocumentSummary,
            secondary: Vec::new(),
            per_intent_score: BTreeMap::new(),
            confidence: 0.0,
            requires_multi_step: false,
            recommended_tools: BTreeSet::new(),
        }
    }
}
