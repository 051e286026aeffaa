//! The Tool-Chain Generator (spec.md §4.4): turns intent + complexity +
//! context into the minimal topologically-sorted set of tool steps.

use std::collections::{BTreeMap, BTreeSet};

use qa_contracts::{
    well_known as tools, ComplexityLevel, ComplexityResult, Context, ExecutionMode, Intent,
    IntentResult, ToolChain, ToolId, ToolStep,
};

use crate::contract_analyzer;
use crate::dag::build_dag;
use crate::dependency;
use crate::error::PlannerError;
use crate::registry::ToolContractRegistry;

/// Pairs that, once either member is selected, pull the other in — the
/// declarative closure rules of spec.md §4.4 step 4.
const CLOSURE_PAIRS: &[(&str, &str)] = &[
    (tools::EDGE_BUILDER, tools::RELATIONSHIP_EXTRACTOR),
    (tools::PAGERANK, tools::ENTITY_BUILDER),
    (tools::PAGERANK, tools::EDGE_BUILDER),
];

fn seed_tools(intent_result: &IntentResult, context: &Context) -> BTreeSet<ToolId> {
    let mut selected: BTreeSet<ToolId> = intent_result.recommended_tools.clone();

    if !context.mentioned_entities.is_empty() {
        selected.insert(tools::NER.to_string());
        selected.insert(tools::ENTITY_BUILDER.to_string());
    }
    if context.requires_comparison && context.comparison_count >= 2 {
        selected.insert(tools::RELATIONSHIP_EXTRACTOR.to_string());
        selected.insert(tools::MULTI_HOP_QUERY.to_string());
    }
    if context.requires_aggregation {
        selected.insert(tools::CENTRALITY.to_string());
        selected.insert(tools::PAGERANK.to_string());
    }
    if context.has_temporal {
        selected.insert(tools::RELATIONSHIP_EXTRACTOR.to_string());
    }

    selected
}

fn close_under_dependency(selected: &mut BTreeSet<ToolId>) {
    loop {
        let mut changed = false;
        for (present, required) in CLOSURE_PAIRS {
            if selected.contains(*present) && !selected.contains(*required) {
                selected.insert(required.to_string());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn simplify_for_simple_complexity(selected: &BTreeSet<ToolId>) -> BTreeSet<ToolId> {
    let mut reduced: BTreeSet<ToolId> = BTreeSet::new();
    reduced.insert(tools::LOADER.to_string());
    reduced.insert(tools::CHUNKER.to_string());
    if selected.contains(tools::NER) {
        reduced.insert(tools::NER.to_string());
    }
    for (a, b) in CLOSURE_PAIRS {
        if selected.contains(*a) && selected.contains(*b) {
            reduced.insert(a.to_string());
            reduced.insert(b.to_string());
        }
    }
    reduced
}

/// Derives `depends_on` for each selected tool by matching declared input
/// keys against declared output keys of other selected tools — the only
/// source of dependency edges; no tool identifier is special-cased.
fn derive_dependencies(
    selected: &BTreeSet<ToolId>,
    registry: &dyn ToolContractRegistry,
) -> Result<BTreeMap<ToolId, (Vec<ToolId>, BTreeMap<String, (ToolId, String)>)>, PlannerError> {
    let mut contracts = BTreeMap::new();
    for tool_id in selected {
        let contract = registry
            .get(tool_id)
            .ok_or_else(|| PlannerError::UnknownTool(tool_id.clone()))?;
        contracts.insert(tool_id.clone(), contract);
    }

    let mut result = BTreeMap::new();
    for tool_id in selected {
        let contract = &contracts[tool_id];
        let mut depends_on = BTreeSet::new();
        let mut bindings = BTreeMap::new();
        for input_key in &contract.declared_inputs {
            for (other_id, other_contract) in &contracts {
                if other_id == tool_id {
                    continue;
                }
                if other_contract.declared_outputs.contains(input_key) {
                    depends_on.insert(other_id.clone());
                    bindings.insert(input_key.clone(), (other_id.clone(), input_key.clone()));
                }
            }
        }
        let mut ordered_deps: Vec<ToolId> = depends_on.into_iter().collect();
        ordered_deps.sort();
        result.insert(tool_id.clone(), (ordered_deps, bindings));
    }
    Ok(result)
}

/// `generate(intentResult, complexityResult, context) → ToolChain`,
/// spec.md §4.4.
pub fn generate(
    intent_result: &IntentResult,
    complexity_result: &ComplexityResult,
    context: &Context,
    registry: &dyn ToolContractRegistry,
) -> Result<ToolChain, PlannerError> {
    contract_analyzer::validate(registry)?;

    let mut selected = seed_tools(intent_result, context);
    close_under_dependency(&mut selected);

    if matches!(complexity_result.level, ComplexityLevel::Simple) {
        selected = simplify_for_simple_complexity(&selected);
    }

    let deps = derive_dependencies(&selected, registry)?;

    // Topological sort, deterministic tie-break by tool id within a level.
    let mut remaining = deps.clone();
    let mut ordered: Vec<ToolId> = Vec::new();
    while !remaining.is_empty() {
        let mut ready: Vec<ToolId> = remaining
            .iter()
            .filter(|(_, (d, _))| d.iter().all(|dep| ordered.contains(dep)))
            .map(|(id, _)| id.clone())
            .collect();
        if ready.is_empty() {
            let stuck: Vec<ToolId> = remaining.keys().cloned().collect();
            return Err(PlannerError::CyclicDependency(stuck));
        }
        ready.sort();
        for id in &ready {
            ordered.push(id.clone());
            remaining.remove(id);
        }
    }

    let mut steps = Vec::with_capacity(ordered.len());
    for tool_id in &ordered {
        let (depends_on, bindings) = deps[tool_id].clone();
        let mut step = ToolStep::new(tool_id.clone());
        step.depends_on = depends_on;
        step.input_bindings = bindings;
        step.optional = is_optional(tool_id, intent_result);
        steps.push(step);
    }

    let execution_graph = build_dag(&steps);
    let analysis = dependency::analyze(&steps, registry)?;
    for step in &mut steps {
        if analysis
            .parallel_groups
            .iter()
            .any(|g| g.len() > 1 && g.contains(&step.tool_id))
        {
            step.execution_mode = ExecutionMode::Parallel;
        }
    }

    let estimated_time: f64 = ordered
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|c| c.base_duration_estimate)
        .sum();
    let estimated_memory: f64 = ordered
        .iter()
        .filter_map(|id| registry.get(id))
        .map(|c| c.base_memory_estimate)
        .fold(0.0, f64::max);

    Ok(ToolChain {
        steps,
        can_parallelize: analysis.can_parallelize,
        estimated_time,
        estimated_memory,
        execution_graph,
    })
}

/// Downstream analytic tools are optional by default: their absence
/// degrades completeness but never the run itself (spec.md §8 S2/S5
/// scenarios treat relationship/pagerank/multi-hop skips as ordinary).
/// Loader, chunker, and the primary intent's first recommended tool are
/// never optional — the chain cannot produce anything without them.
fn is_optional(tool_id: &str, intent_result: &IntentResult) -> bool {
    if tool_id == tools::LOADER || tool_id == tools::CHUNKER {
        return false;
    }
    if intent_result.primary == Intent::EntityExtraction && tool_id == tools::NER {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_contracts;

    #[test]
    fn simple_entity_question_produces_minimal_ordered_chain() {
        let registry = default_contracts::build();
        let intent_result = qa_nlp_like_intent();
        let complexity = qa_contracts::ComplexityResult {
            level: ComplexityLevel::Simple,
            estimated_tools: 3,
            parallelizable_components: 0,
            estimated_time: 2.0,
            estimated_memory: 128.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        };
        let context = Context::default();
        let chain = generate(&intent_result, &complexity, &context, &registry).unwrap();
        assert!(chain.is_topologically_ordered());
        assert!(chain.steps.iter().any(|s| s.tool_id == tools::NER));
        assert!(chain.steps.iter().any(|s| s.tool_id == tools::LOADER));
    }

    fn qa_nlp_like_intent() -> IntentResult {
        let mut recommended = BTreeSet::new();
        recommended.insert(tools::LOADER.to_string());
        recommended.insert(tools::CHUNKER.to_string());
        recommended.insert(tools::NER.to_string());
        recommended.insert(tools::ENTITY_BUILDER.to_string());
        IntentResult {
            primary: Intent::EntityExtraction,
            secondary: vec![],
            per_intent_score: BTreeMap::new(),
            confidence: 0.9,
            requires_multi_step: false,
            recommended_tools: recommended,
        }
    }

    #[test]
    fn pagerank_pulls_in_entity_and_edge_builders() {
        let registry = default_contracts::build();
        let mut selected = BTreeSet::new();
        selected.insert(tools::PAGERANK.to_string());
        close_under_dependency(&mut selected);
        assert!(selected.contains(tools::ENTITY_BUILDER));
        assert!(selected.contains(tools::EDGE_BUILDER));
        let _ = &registry;
    }
}
