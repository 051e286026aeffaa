//! Shared parameter-adaptation rules (spec.md §4.9 step ii). Pure and
//! side-effect free so both the DAG Builder / Execution Planner (initial
//! `adaptiveParameters` on an [`qa_contracts::ExecutionPlan`]) and the
//! Dynamic Executor (final per-dispatch overrides, spec.md §4.9) apply the
//! exact same rules rather than maintaining two copies.

use std::collections::BTreeMap;

use qa_contracts::{well_known as tools, ComplexityLevel, ComplexityResult, Context};
use serde_json::{json, Value};

/// Merges context/complexity-driven overrides into `base_parameters` for
/// one tool, per spec.md §4.9 step ii's five rules.
pub fn compute(
    tool_id: &str,
    base_parameters: &BTreeMap<String, Value>,
    context: &Context,
    complexity: &ComplexityResult,
) -> BTreeMap<String, Value> {
    let mut params = base_parameters.clone();

    if context.has_temporal && (tool_id == tools::NER || tool_id == tools::RELATIONSHIP_EXTRACTOR) {
        if let Some(first) = context.temporal_constraints.first() {
            params.insert("time_filter".to_string(), json!(first));
            params.insert("temporal_filtering_enabled".to_string(), json!(true));
        }
    }

    if tool_id == tools::CHUNKER {
        let chunk_size = match complexity.level {
            ComplexityLevel::Complex => 256,
            ComplexityLevel::Moderate => 512,
            ComplexityLevel::Simple => 1024,
        };
        params.insert("chunk_size".to_string(), json!(chunk_size));
    }

    if context.ambiguity > 0.5 && tool_id == tools::NER {
        params.insert("confidence_threshold".to_string(), json!(0.7));
    }

    if context.requires_comparison && tool_id == tools::RELATIONSHIP_EXTRACTOR {
        params.insert("comparison_mode".to_string(), json!(true));
        params.insert("comparison_entities".to_string(), json!(context.comparison_entities));
    }

    if (context.requires_aggregation || context.requires_comparison) && tool_id == tools::PAGERANK {
        let iterations = if context.requires_aggregation && context.requires_comparison {
            150
        } else {
            100
        };
        params.insert("iterations".to_string(), json!(iterations));
        params.insert("tolerance".to_string(), json!(1e-8));
        params.insert("entity_boost".to_string(), json!(context.mentioned_entities));
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complexity(level: ComplexityLevel) -> ComplexityResult {
        ComplexityResult {
            level,
            estimated_tools: 3,
            parallelizable_components: 0,
            estimated_time: 1.0,
            estimated_memory: 64.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        }
    }

    #[test]
    fn temporal_context_attaches_time_filter_to_ner() {
        let mut context = Context::default();
        context.has_temporal = true;
        context.temporal_constraints = vec!["2023".to_string()];
        let params = compute(tools::NER, &BTreeMap::new(), &context, &complexity(ComplexityLevel::Simple));
        assert_eq!(params["time_filter"], json!("2023"));
        assert_eq!(params["temporal_filtering_enabled"], json!(true));
    }

    #[test]
    fn high_ambiguity_raises_ner_confidence_threshold() {
        let mut context = Context::default();
        context.set_ambiguity(0.8);
        let params = compute(tools::NER, &BTreeMap::new(), &context, &complexity(ComplexityLevel::Simple));
        assert_eq!(params["confidence_threshold"], json!(0.7));
    }

    #[test]
    fn complex_questions_select_smaller_chunk_size() {
        let context = Context::default();
        let params = compute(tools::CHUNKER, &BTreeMap::new(), &context, &complexity(ComplexityLevel::Complex));
        assert_eq!(params["chunk_size"], json!(256));
    }

    #[test]
    fn comparison_and_aggregation_together_boost_pagerank_iterations() {
        let mut context = Context::default();
        context.requires_comparison = true;
        context.requires_aggregation = true;
        let params = compute(tools::PAGERANK, &BTreeMap::new(), &context, &complexity(ComplexityLevel::Moderate));
        assert_eq!(params["iterations"], json!(150));
    }
}
