//! The Dynamic Executor (spec.md §4.9, component C11) — the hottest path.
//! Grounded on the teacher's `tool-ecosystem::executor::ChainExecutor`
//! (topological dispatch, per-step timeout, semaphore-bounded concurrency)
//! and `tool-ecosystem::parallel_integration::ParallelToolCoordinator`
//! (level-by-level parallel dispatch), generalized from a fixed DAG replay
//! into the ready-set scheduling loop spec.md §4.9 specifies: readiness is
//! recomputed every iteration from `ExecutionContext`, not read once off a
//! petgraph `Topo` walk, since skip propagation can resolve a dependency
//! out of order relative to a pure topological sort.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use qa_contracts::{
    ComplexityResult, Context, ExecutedGroup, ExecutionContext, ResourceRequest, ResourceType,
    ToolChain, ToolId, ToolOutcome, ToolStep,
};
use qa_planner::ToolContractRegistry;
use qa_resource::ResourceManager;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::adapter::ToolAdapter;
use crate::error::ExecutorError;
use crate::gating;
use crate::outcome::RunOutcome;

/// Drives one `execute(toolChain, question, context) → RunOutcome` run.
/// Cheap to clone (every field is an `Arc`), matching the teacher's
/// `ChainExecutor` convention of a clonable handle shared across spawned
/// tasks.
#[derive(Clone)]
pub struct DynamicExecutor {
    adapter: Arc<dyn ToolAdapter>,
    registry: Arc<dyn ToolContractRegistry>,
    resources: Option<Arc<ResourceManager>>,
    concurrency: Arc<Semaphore>,
}

impl DynamicExecutor {
    pub fn new(
        adapter: Arc<dyn ToolAdapter>,
        registry: Arc<dyn ToolContractRegistry>,
        resources: Option<Arc<ResourceManager>>,
        max_concurrent_tools: usize,
    ) -> Self {
        Self {
            adapter,
            registry,
            resources,
            concurrency: Arc::new(Semaphore::new(max_concurrent_tools.max(1))),
        }
    }

    /// `execute(toolChain, question, context) → RunOutcome`, spec.md §4.9.
    /// `complexity` is threaded through alongside `context` because the
    /// shared `qa_planner::compute_adaptive_parameters` rules need both —
    /// the planner already computes both before building the chain, so
    /// the executor simply receives what the orchestrator already has on
    /// hand.
    pub async fn execute(
        &self,
        chain: &ToolChain,
        complexity: &ComplexityResult,
        context: &Context,
        question: &str,
    ) -> Result<RunOutcome, ExecutorError> {
        let run_start = Instant::now();
        info!(steps = chain.steps.len(), %question, "starting tool chain execution");

        let steps_by_id: BTreeMap<ToolId, ToolStep> = chain
            .steps
            .iter()
            .map(|s| (s.tool_id.clone(), s.clone()))
            .collect();
        let mut pending: BTreeSet<ToolId> = steps_by_id.keys().cloned().collect();
        let mut ctx = ExecutionContext::new();
        let mut executed = Vec::new();
        let mut failed = Vec::new();
        let mut parallel_groups_run = 0usize;

        let full_analysis = qa_planner::dependency::analyze(&chain.steps, self.registry.as_ref())?;
        let complexity = Arc::new(complexity.clone());
        let context = Arc::new(context.clone());

        while !pending.is_empty() {
            propagate_upstream_failures(&mut ctx, &steps_by_id, &mut pending);
            if pending.is_empty() {
                break;
            }

            let ready: BTreeSet<ToolId> = pending
                .iter()
                .cloned()
                .filter(|id| {
                    let step = &steps_by_id[id];
                    step.depends_on
                        .iter()
                        .all(|dep| dependency_is_ready(&ctx, dep, step.optional))
                })
                .collect();

            if ready.is_empty() {
                warn!(remaining = ?pending, "ready set empty with pending steps outstanding");
                return Err(ExecutorError::StalledExecution(pending.into_iter().collect()));
            }

            let groups = self.build_dispatch_groups(chain, &full_analysis, &ready);
            let snapshot = Arc::new(ctx.clone());

            for group in groups {
                let group_tools: Vec<ToolId> = group.iter().cloned().collect();
                let group_start = Instant::now();

                if group.len() > 1 {
                    parallel_groups_run += 1;
                    debug!(?group_tools, "dispatching parallel group");
                    let mut set = JoinSet::new();
                    for tool_id in &group {
                        let step = steps_by_id[tool_id].clone();
                        let executor = self.clone();
                        let snapshot = snapshot.clone();
                        let complexity = complexity.clone();
                        let context = context.clone();
                        set.spawn(async move {
                            executor.dispatch_step(step, snapshot, complexity, context).await
                        });
                    }
                    while let Some(joined) = set.join_next().await {
                        match joined {
                            Ok((tool_id, outcome, duration, adapted)) => {
                                pending.remove(&tool_id);
                                record(&mut ctx, &mut executed, &mut failed, tool_id, outcome, duration, adapted);
                            }
                            Err(join_err) => {
                                error!(%join_err, "tool task panicked during parallel dispatch");
                            }
                        }
                    }
                } else {
                    let tool_id = group.into_iter().next().expect("non-empty group");
                    let step = steps_by_id[&tool_id].clone();
                    let (tool_id, outcome, duration, adapted) = self
                        .dispatch_step(step, snapshot.clone(), complexity.clone(), context.clone())
                        .await;
                    pending.remove(&tool_id);
                    record(&mut ctx, &mut executed, &mut failed, tool_id, outcome, duration, adapted);
                }

                ctx.executed_groups.push(ExecutedGroup {
                    tools: group_tools,
                    wall_time: group_start.elapsed().as_secs_f64(),
                });
            }
        }

        let total_time = run_start.elapsed().as_secs_f64();
        info!(
            total_time,
            executed = executed.len(),
            failed = failed.len(),
            skipped = ctx.skipped.len(),
            parallel_groups_run,
            "tool chain execution complete"
        );

        Ok(RunOutcome {
            per_tool_outcomes: ctx.intermediate_results,
            executed,
            skipped: ctx.skipped.into_iter().collect(),
            failed,
            total_time,
            parallel_groups_run,
            adapted_params: ctx.adapted_params,
            executed_groups: ctx.executed_groups,
        })
    }

    /// Spec.md §4.9 step 2.c: when the chain allows it and more than one
    /// step is ready, ask the Dependency Analyzer for parallel groups
    /// restricted to Ready; anything left over (not independent enough to
    /// join a multi-member group) dispatches as its own singleton group.
    fn build_dispatch_groups(
        &self,
        chain: &ToolChain,
        full_analysis: &qa_contracts::DependencyAnalysis,
        ready: &BTreeSet<ToolId>,
    ) -> Vec<BTreeSet<ToolId>> {
        if !chain.can_parallelize || ready.len() <= 1 {
            return ready.iter().cloned().map(|id| BTreeSet::from([id])).collect();
        }

        let restricted = qa_planner::dependency::restrict_to(full_analysis, ready);
        let mut grouped_members: BTreeSet<ToolId> = BTreeSet::new();
        let mut groups: Vec<BTreeSet<ToolId>> = Vec::new();
        for group in &restricted.parallel_groups {
            grouped_members.extend(group.iter().cloned());
            groups.push(group.clone());
        }
        for leftover in ready.difference(&grouped_members) {
            groups.push(BTreeSet::from([leftover.clone()]));
        }
        groups
    }

    /// Spec.md §4.9 step 3: skip check, parameter adaptation, input
    /// resolution, then invocation. Returns the resolved tool id (so the
    /// caller can match it back against `pending` after a concurrent
    /// dispatch), the outcome, the measured wall-clock duration, and the
    /// adapted parameters actually used (for `ExecutionContext.adaptedParams`).
    async fn dispatch_step(
        &self,
        step: ToolStep,
        snapshot: Arc<ExecutionContext>,
        complexity: Arc<ComplexityResult>,
        context: Arc<Context>,
    ) -> (ToolId, ToolOutcome, f64, BTreeMap<String, serde_json::Value>) {
        let start = Instant::now();

        if let Some(reason) = gating::built_in_skip_reason(&step.tool_id, &snapshot) {
            debug!(tool = %step.tool_id, %reason, "built-in skip policy fired");
            return (step.tool_id, ToolOutcome::Skipped { reason }, start.elapsed().as_secs_f64(), BTreeMap::new());
        }
        if let Some(condition) = &step.condition {
            if let Some(reason) = gating::condition_skip_reason(condition, &snapshot) {
                debug!(tool = %step.tool_id, %reason, "step condition failed");
                return (step.tool_id, ToolOutcome::Skipped { reason }, start.elapsed().as_secs_f64(), BTreeMap::new());
            }
        }

        let mut arguments = BTreeMap::new();
        for (input_name, (predecessor, output_key)) in &step.input_bindings {
            match snapshot.intermediate_results.get(predecessor) {
                Some(ToolOutcome::Success { data, .. }) => {
                    arguments.insert(
                        input_name.clone(),
                        data.get(output_key).cloned().unwrap_or(serde_json::Value::Null),
                    );
                }
                Some(ToolOutcome::Error { reason, .. }) if step.optional => {
                    debug!(tool = %step.tool_id, %predecessor, %reason, "optional input's predecessor failed, substituting default");
                    arguments.insert(input_name.clone(), serde_json::Value::Null);
                }
                Some(ToolOutcome::Skipped { reason }) if step.optional => {
                    debug!(tool = %step.tool_id, %predecessor, %reason, "optional input's predecessor skipped, substituting default");
                    arguments.insert(input_name.clone(), serde_json::Value::Null);
                }
                Some(ToolOutcome::Error { reason, .. }) => {
                    return (
                        step.tool_id,
                        ToolOutcome::Skipped {
                            reason: format!("upstream failure from {predecessor}: {reason}"),
                        },
                        start.elapsed().as_secs_f64(),
                        BTreeMap::new(),
                    );
                }
                Some(ToolOutcome::Skipped { reason }) => {
                    return (
                        step.tool_id,
                        ToolOutcome::Skipped {
                            reason: format!("propagated skip from {predecessor}: {reason}"),
                        },
                        start.elapsed().as_secs_f64(),
                        BTreeMap::new(),
                    );
                }
                None => {
                    return (
                        step.tool_id,
                        ToolOutcome::Skipped {
                            reason: format!("predecessor {predecessor} never resolved"),
                        },
                        start.elapsed().as_secs_f64(),
                        BTreeMap::new(),
                    );
                }
            }
        }

        let adapted_params =
            qa_planner::compute_adaptive_parameters(&step.tool_id, &step.parameters, &context, &complexity);
        for (key, value) in &adapted_params {
            arguments.insert(key.clone(), value.clone());
        }

        let outcome = self.invoke_with_resources(&step, arguments).await;
        (step.tool_id, outcome, start.elapsed().as_secs_f64(), adapted_params)
    }

    /// Acquires a resource grant (if a [`ResourceManager`] is configured)
    /// and the concurrency semaphore permit, invokes the tool adapter, and
    /// releases the grant. Spec.md §5 back-pressure: a denied-without-wait
    /// request fails the step `ResourceDenied`, never aborts the run.
    async fn invoke_with_resources(
        &self,
        step: &ToolStep,
        arguments: BTreeMap<String, serde_json::Value>,
    ) -> ToolOutcome {
        let allocation = match (&self.resources, self.registry.get(&step.tool_id)) {
            (Some(resources), Some(contract)) => {
                let mut request = ResourceRequest::new(
                    step.tool_id.clone(),
                    ResourceType::Memory,
                    contract.base_memory_estimate,
                );
                request.duration_estimate = contract.base_duration_estimate;
                match resources.request(request).await {
                    Ok(allocation) => Some(allocation),
                    Err(err) => {
                        warn!(tool = %step.tool_id, %err, "resource request denied");
                        return ToolOutcome::Error {
                            reason: format!("resource denied: {err}"),
                            duration: 0.0,
                        };
                    }
                }
            }
            _ => None,
        };

        let _permit = self.concurrency.acquire().await.ok();
        let outcome = self.adapter.invoke(&step.tool_id, arguments).await;

        if let (Some(resources), Some(allocation)) = (&self.resources, &allocation) {
            resources.release(&allocation.allocation_id);
        }

        outcome
    }
}

/// True iff `dep` has resolved in a way that lets a step depending on it
/// become ready: outright (`Success`/`Skipped`), or, when the dependent
/// step is `optional`, even a `Error` resolution (spec.md §4.9, §7
/// invariant 4 — a failed optional dependency still lets downstream
/// progress with default inputs instead of blocking forever).
fn dependency_is_ready(ctx: &ExecutionContext, dep: &ToolId, dependent_is_optional: bool) -> bool {
    match ctx.intermediate_results.get(dep) {
        Some(ToolOutcome::Success { .. }) | Some(ToolOutcome::Skipped { .. }) => true,
        Some(ToolOutcome::Error { .. }) => dependent_is_optional,
        None => false,
    }
}

/// Spec.md §4.9 / §7 invariant 4: a failed (or skipped) non-optional
/// dependency skips every step that transitively depends on it, rather
/// than leaving them stuck `Pending` forever with no path to readiness.
/// Runs to a fixpoint so a multi-level chain skips all the way down
/// before the next readiness check — one pass only catches the direct
/// dependents of whatever resolved just before this call.
fn propagate_upstream_failures(
    ctx: &mut ExecutionContext,
    steps_by_id: &BTreeMap<ToolId, ToolStep>,
    pending: &mut BTreeSet<ToolId>,
) {
    loop {
        let mut newly_skipped: Vec<(ToolId, String)> = Vec::new();
        for id in pending.iter() {
            let step = &steps_by_id[id];
            if step.optional {
                continue;
            }
            for dep in &step.depends_on {
                match ctx.intermediate_results.get(dep) {
                    Some(ToolOutcome::Error { reason, .. }) => {
                        newly_skipped.push((id.clone(), format!("upstream failure from {dep}: {reason}")));
                        break;
                    }
                    Some(ToolOutcome::Skipped { reason }) => {
                        newly_skipped.push((id.clone(), format!("propagated skip from {dep}: {reason}")));
                        break;
                    }
                    _ => {}
                }
            }
        }
        if newly_skipped.is_empty() {
            break;
        }
        for (id, reason) in newly_skipped {
            debug!(tool = %id, %reason, "skipping dependent of a failed upstream step");
            pending.remove(&id);
            ctx.skipped.insert(id.clone());
            ctx.intermediate_results.insert(id, ToolOutcome::Skipped { reason });
        }
    }
}

/// Merges a resolved step outcome into the shared [`ExecutionContext`] and
/// the run's executed/failed tallies. Single-writer: called only from the
/// main loop, after a group's tasks have all completed.
fn record(
    ctx: &mut ExecutionContext,
    executed: &mut Vec<ToolId>,
    failed: &mut Vec<ToolId>,
    tool_id: ToolId,
    outcome: ToolOutcome,
    duration: f64,
    adapted: BTreeMap<String, serde_json::Value>,
) {
    ctx.timings.insert(tool_id.clone(), duration);
    if !adapted.is_empty() {
        ctx.adapted_params.insert(tool_id.clone(), adapted);
    }
    match &outcome {
        ToolOutcome::Success { .. } => {
            info!(tool = %tool_id, "step succeeded");
            executed.push(tool_id.clone());
        }
        ToolOutcome::Error { reason, .. } => {
            error!(tool = %tool_id, %reason, "step failed");
            failed.push(tool_id.clone());
        }
        ToolOutcome::Skipped { reason } => {
            debug!(tool = %tool_id, %reason, "step skipped");
            ctx.skipped.insert(tool_id.clone());
        }
    }
    ctx.intermediate_results.insert(tool_id, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qa_contracts::well_known as tools;
    use qa_contracts::Dag;
    use qa_planner::InMemoryToolContractRegistry;
    use std::collections::HashMap;

    struct FakeAdapter {
        outputs: HashMap<ToolId, BTreeMap<String, serde_json::Value>>,
    }

    impl FakeAdapter {
        fn new(outputs: HashMap<ToolId, BTreeMap<String, serde_json::Value>>) -> Self {
            Self { outputs }
        }
    }

    #[async_trait]
    impl ToolAdapter for FakeAdapter {
        async fn invoke(&self, tool_id: &ToolId, _arguments: BTreeMap<String, serde_json::Value>) -> ToolOutcome {
            match self.outputs.get(tool_id) {
                Some(data) => ToolOutcome::Success {
                    data: data.clone(),
                    duration: 0.01,
                    confidence: 0.9,
                    uncertainty: 0.1,
                    data_volume: data.len(),
                },
                None => ToolOutcome::Error {
                    reason: "no canned output configured".to_string(),
                    duration: 0.01,
                },
            }
        }
    }

    fn step(tool_id: &str, deps: &[&str], bindings: &[(&str, &str, &str)]) -> ToolStep {
        let mut s = ToolStep::new(tool_id);
        s.depends_on = deps.iter().map(|d| d.to_string()).collect();
        for (input_name, pred, key) in bindings {
            s.input_bindings
                .insert(input_name.to_string(), (pred.to_string(), key.to_string()));
        }
        s
    }

    fn complexity() -> ComplexityResult {
        ComplexityResult {
            level: qa_contracts::ComplexityLevel::Simple,
            estimated_tools: 2,
            parallelizable_components: 0,
            estimated_time: 1.0,
            estimated_memory: 64.0,
            execution_strategy_hint: "sequential".to_string(),
            factors: BTreeMap::new(),
        }
    }

    fn chain_of(steps: Vec<ToolStep>, can_parallelize: bool) -> ToolChain {
        let mut dag = Dag::default();
        for s in &steps {
            dag.nodes.insert(s.tool_id.clone());
            for d in &s.depends_on {
                dag.edges.insert((d.clone(), s.tool_id.clone()));
            }
        }
        ToolChain {
            steps,
            can_parallelize,
            estimated_time: 1.0,
            estimated_memory: 64.0,
            execution_graph: dag,
        }
    }

    fn executor(outputs: HashMap<ToolId, BTreeMap<String, serde_json::Value>>) -> DynamicExecutor {
        let adapter = Arc::new(FakeAdapter::new(outputs));
        let registry: Arc<dyn ToolContractRegistry> = Arc::new(InMemoryToolContractRegistry::new());
        DynamicExecutor::new(adapter, registry, None, 4)
    }

    fn executor_with_registry(
        outputs: HashMap<ToolId, BTreeMap<String, serde_json::Value>>,
        registry: InMemoryToolContractRegistry,
    ) -> DynamicExecutor {
        let adapter = Arc::new(FakeAdapter::new(outputs));
        let registry: Arc<dyn ToolContractRegistry> = Arc::new(registry);
        DynamicExecutor::new(adapter, registry, None, 4)
    }

    #[tokio::test]
    async fn sequential_chain_runs_to_completion() {
        let mut outputs = HashMap::new();
        outputs.insert(tools::LOADER.to_string(), {
            let mut m = BTreeMap::new();
            m.insert("raw_text".to_string(), serde_json::json!("hello world"));
            m
        });
        outputs.insert(tools::CHUNKER.to_string(), {
            let mut m = BTreeMap::new();
            m.insert("chunks".to_string(), serde_json::json!(["hello", "world"]));
            m
        });

        let steps = vec![
            step(tools::LOADER, &[], &[]),
            step(tools::CHUNKER, &[tools::LOADER], &[("raw_text", tools::LOADER, "raw_text")]),
        ];
        let chain = chain_of(steps, false);
        let exec = executor(outputs);
        let outcome = exec
            .execute(&chain, &complexity(), &Context::default(), "what happened?")
            .await
            .unwrap();

        assert_eq!(outcome.executed.len(), 2);
        assert!(outcome.failed.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[tokio::test]
    async fn relationship_extraction_is_skipped_below_entity_threshold() {
        let mut outputs = HashMap::new();
        outputs.insert(tools::NER.to_string(), {
            let mut m = BTreeMap::new();
            m.insert("entities".to_string(), serde_json::json!(["only-one"]));
            m
        });

        let steps = vec![
            step(tools::NER, &[], &[]),
            step(
                tools::RELATIONSHIP_EXTRACTOR,
                &[tools::NER],
                &[("entities", tools::NER, "entities")],
            ),
        ];
        let chain = chain_of(steps, false);
        let exec = executor(outputs);
        let outcome = exec
            .execute(&chain, &complexity(), &Context::default(), "how are they related?")
            .await
            .unwrap();

        assert_eq!(outcome.executed, vec![tools::NER.to_string()]);
        assert_eq!(outcome.skipped, vec![tools::RELATIONSHIP_EXTRACTOR.to_string()]);
    }

    #[tokio::test]
    async fn failure_of_a_non_optional_dependency_skips_its_dependents() {
        let outputs = HashMap::new(); // LOADER has no canned output -> Error
        let steps = vec![
            step(tools::LOADER, &[], &[]),
            step(tools::CHUNKER, &[tools::LOADER], &[("raw_text", tools::LOADER, "raw_text")]),
        ];
        let chain = chain_of(steps, false);
        let exec = executor(outputs);
        let outcome = exec
            .execute(&chain, &complexity(), &Context::default(), "q")
            .await
            .unwrap();

        assert_eq!(outcome.failed, vec![tools::LOADER.to_string()]);
        assert_eq!(outcome.skipped, vec![tools::CHUNKER.to_string()]);
    }

    #[tokio::test]
    async fn stalled_execution_is_reported_as_an_error() {
        // CHUNKER depends on a tool that is never part of the chain, so it
        // can never become ready.
        let steps = vec![step(tools::CHUNKER, &["phantom_tool"], &[])];
        let chain = chain_of(steps, false);
        let exec = executor(HashMap::new());
        let result = exec
            .execute(&chain, &complexity(), &Context::default(), "q")
            .await;

        assert!(matches!(result, Err(ExecutorError::StalledExecution(_))));
    }

    #[tokio::test]
    async fn parallel_group_members_both_execute() {
        let mut outputs = HashMap::new();
        for tool in [tools::PAGERANK, tools::CENTRALITY] {
            outputs.insert(tool.to_string(), BTreeMap::new());
        }
        let steps = vec![
            step(tools::PAGERANK, &[], &[]),
            step(tools::CENTRALITY, &[], &[]),
        ];
        let chain = chain_of(steps, true);
        let exec = executor_with_registry(outputs, qa_planner::default_contracts::build());
        let outcome = exec
            .execute(&chain, &complexity(), &Context::default(), "q")
            .await
            .unwrap();

        assert_eq!(outcome.executed.len(), 2);
        assert!(outcome.parallel_groups_run >= 1);
    }
}
