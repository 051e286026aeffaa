use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Coarse bucket assigned to a question by the Complexity Analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
}

/// Output of the Complexity Analyzer (spec.md §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplexityResult {
    pub level: ComplexityLevel,
    pub estimated_tools: usize,
    pub parallelizable_components: usize,
    pub estimated_time: f64,
    pub estimated_memory: f64,
    pub execution_strategy_hint: String,
    /// Per-factor scores in `[0, 1]`, keyed by factor name (`word_count`,
    /// `entity_mentions`, `multi_part`, `comparison`, `aggregation`,
    /// `temporal`, `inference`, `nested_clauses`).
    pub factors: BTreeMap<String, f64>,
}
