//! The DAG Builder / Execution Planner (spec.md §4.6, component C8):
//! `plan(toolChain, intent, complexity, context, strategy) → ExecutionPlan`.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use qa_contracts::{
    ComplexityLevel, ComplexityResult, Context, ExecutionPlan, IntentResult, OptimizerStrategy,
    PlannedStep, ToolChain, ToolId,
};
use tracing::{debug, info};

use crate::adaptation;
use crate::dependency;
use crate::error::PlannerError;
use crate::optimizer;
use crate::registry::ToolContractRegistry;

/// Builds a `petgraph::DiGraph` from the chain's DAG value object purely to
/// run a toposort cycle check the way the teacher's `ChainExecutor` walks
/// its `petgraph` DAG with a `Topo` visitor — the generator already
/// guarantees acyclicity via its own Kahn-style sort, so this is a
/// structural assertion rather than the primary source of truth.
fn validate_acyclic(chain: &ToolChain) -> Result<(), PlannerError> {
    let mut graph: DiGraph<ToolId, ()> = DiGraph::new();
    let mut index_of: HashMap<ToolId, NodeIndex> = HashMap::new();
    for node in &chain.execution_graph.nodes {
        let idx = graph.add_node(node.clone());
        index_of.insert(node.clone(), idx);
    }
    for (from, to) in &chain.execution_graph.edges {
        if let (Some(&f), Some(&t)) = (index_of.get(from), index_of.get(to)) {
            graph.add_edge(f, t, ());
        }
    }
    toposort(&graph, None)
        .map(|_| ())
        .map_err(|cycle| PlannerError::CyclicDependency(vec![graph[cycle.node_id()].clone()]))
}

fn complexity_scale(level: ComplexityLevel) -> f64 {
    match level {
        ComplexityLevel::Simple => 1.0,
        ComplexityLevel::Moderate => 1.3,
        ComplexityLevel::Complex => 1.8,
    }
}

/// `plan(toolChain, intent, complexity, context, strategy) → ExecutionPlan`,
/// spec.md §4.6. The returned plan has already been rewritten by the
/// Execution Optimizer (spec.md §4.7) under `strategy`; DAG edges are
/// unchanged by that rewrite, only durations/allocations/priorities/
/// adaptive parameters.
pub fn plan(
    chain: &ToolChain,
    _intent: &IntentResult,
    complexity: &ComplexityResult,
    context: &Context,
    strategy: OptimizerStrategy,
    registry: &dyn ToolContractRegistry,
    optimizer_state: &mut optimizer::AdaptiveStrategySelector,
) -> Result<ExecutionPlan, PlannerError> {
    validate_acyclic(chain)?;

    let analysis = dependency::analyze(&chain.steps, registry)?;
    let parallel_members: std::collections::BTreeSet<ToolId> = analysis
        .parallel_groups
        .iter()
        .filter(|g| g.len() > 1)
        .flat_map(|g| g.iter().cloned())
        .collect();

    let scale = complexity_scale(complexity.level);
    let mut finish_times: BTreeMap<ToolId, f64> = BTreeMap::new();
    let mut steps = Vec::with_capacity(chain.steps.len());
    let mut high_uncertainty_count = 0usize;

    for step in &chain.steps {
        let contract = registry
            .get(&step.tool_id)
            .ok_or_else(|| PlannerError::UnknownTool(step.tool_id.clone()))?;

        if contract.reliability_prior < 0.7 {
            high_uncertainty_count += 1;
        }

        let estimated_duration = contract.base_duration_estimate * scale;
        let estimated_start_time = step
            .depends_on
            .iter()
            .filter_map(|dep| finish_times.get(dep))
            .cloned()
            .fold(0.0_f64, f64::max);
        finish_times.insert(step.tool_id.clone(), estimated_start_time + estimated_duration);

        let mut priority: u8 = 5;
        if step.depends_on.is_empty() {
            priority = priority.saturating_add(2);
        }
        if !step.optional {
            priority = priority.saturating_add(1);
        }
        priority = priority.min(10);

        let adaptive_parameters = adaptation::compute(&step.tool_id, &step.parameters, context, complexity);

        steps.push(PlannedStep {
            step_id: format!("step-{}", step.tool_id),
            tool_id: step.tool_id.clone(),
            level: *analysis.levels.get(&step.tool_id).unwrap_or(&0),
            depends_on: step.depends_on.clone(),
            estimated_start_time,
            estimated_duration,
            resource_allocation: contract.base_memory_estimate,
            priority,
            adaptive_parameters,
        });
    }

    let total_estimated_time = finish_times.values().cloned().fold(0.0_f64, f64::max);
    let parallelization_ratio = if steps.is_empty() {
        0.0
    } else {
        parallel_members.len() as f64 / steps.len() as f64
    };
    let resource_efficiency = if steps.is_empty() {
        1.0
    } else {
        let allocated: f64 = steps.iter().map(|s| s.resource_allocation).sum();
        let peak = steps
            .iter()
            .map(|s| s.resource_allocation)
            .fold(0.0_f64, f64::max)
            .max(1.0);
        (peak / allocated.max(peak)).clamp(0.0, 1.0)
    };
    let high_uncertainty_fraction = if steps.is_empty() {
        0.0
    } else {
        high_uncertainty_count as f64 / steps.len() as f64
    };
    let confidence = (1.0 - 0.1 * high_uncertainty_fraction - 0.2 * context.ambiguity).clamp(0.0, 1.0);

    let raw_plan = ExecutionPlan {
        plan_id: uuid::Uuid::new_v4().to_string(),
        steps,
        strategy,
        total_estimated_time,
        parallelization_ratio,
        resource_efficiency,
        confidence,
    };

    info!(
        plan_id = %raw_plan.plan_id,
        steps = raw_plan.steps.len(),
        ?strategy,
        "execution plan built"
    );

    let optimized = optimizer::optimize(raw_plan, strategy, &analysis, optimizer_state);
    debug!(plan_id = %optimized.plan_id, "execution plan optimized");
    Ok(optimized)
}

/// The seam spec.md §9's Open Questions names for a future mid-run
/// adaptive replanning feature: "a `planner.revise(plan, partialOutcome)`
/// hook [...] may leave it a no-op". It is exactly that here — the
/// original plan is returned unchanged. Implementing real replanning is
/// explicitly out of scope for this core.
pub fn revise(plan: &ExecutionPlan, _partial_outcome: &qa_contracts::ExecutionContext) -> ExecutionPlan {
    plan.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::{Intent, IntentResult};
    use std::collections::BTreeSet;

    fn simple_chain(registry: &dyn ToolContractRegistry) -> ToolChain {
        let mut recommended = BTreeSet::new();
        recommended.insert(qa_contracts::well_known::LOADER.to_string());
        recommended.insert(qa_contracts::well_known::CHUNKER.to_string());
        recommended.insert(qa_contracts::well_known::NER.to_string());
        let intent_result = IntentResult {
            primary: Intent::EntityExtraction,
            secondary: vec![],
            per_intent_score: BTreeMap::new(),
            confidence: 0.9,
            requires_multi_step: false,
            recommended_tools: recommended,
        };
        let complexity = ComplexityResult {
            level: ComplexityLevel::Simple,
            estimated_tools: 3,
            parallelizable_components: 0,
            estimated_time: 2.0,
            estimated_memory: 128.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        };
        let context = Context::default();
        crate::generator::generate(&intent_result, &complexity, &context, registry).unwrap()
    }

    #[test]
    fn levels_respect_dependency_order() {
        let registry = crate::default_contracts::build();
        let chain = simple_chain(&registry);
        let intent = IntentResult::default_for_empty();
        let complexity = ComplexityResult {
            level: ComplexityLevel::Simple,
            estimated_tools: 3,
            parallelizable_components: 0,
            estimated_time: 2.0,
            estimated_memory: 128.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        };
        let context = Context::default();
        let mut selector = optimizer::AdaptiveStrategySelector::new();
        let result_plan = plan(
            &chain,
            &intent,
            &complexity,
            &context,
            OptimizerStrategy::Balanced,
            &registry,
            &mut selector,
        )
        .unwrap();

        let levels: BTreeMap<ToolId, usize> = result_plan
            .steps
            .iter()
            .map(|s| (s.tool_id.clone(), s.level))
            .collect();
        for step in &result_plan.steps {
            for dep in &step.depends_on {
                assert!(levels[dep] < levels[&step.tool_id]);
            }
        }
    }

    #[test]
    fn confidence_is_within_unit_interval() {
        let registry = crate::default_contracts::build();
        let chain = simple_chain(&registry);
        let intent = IntentResult::default_for_empty();
        let complexity = ComplexityResult {
            level: ComplexityLevel::Simple,
            estimated_tools: 3,
            parallelizable_components: 0,
            estimated_time: 2.0,
            estimated_memory: 128.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        };
        let mut context = Context::default();
        context.set_ambiguity(0.9);
        let mut selector = optimizer::AdaptiveStrategySelector::new();
        let result_plan = plan(
            &chain,
            &intent,
            &complexity,
            &context,
            OptimizerStrategy::Adaptive,
            &registry,
            &mut selector,
        )
        .unwrap();
        assert!(result_plan.confidence >= 0.0 && result_plan.confidence <= 1.0);
    }
}
