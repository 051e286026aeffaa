//! The `Orchestrator`: wires the Intent Classifier, Complexity Analyzer,
//! Context Extractor (`qa-nlp`), the Tool-Chain Generator / Dependency
//! Analyzer / DAG Builder / Execution Optimizer (`qa-planner`), the Dynamic
//! Executor (`qa-executor`), the Confidence Aggregator (`qa-confidence`),
//! and the Response Synthesizer (`qa-synthesis`) into the single
//! `answer(question) -> AnswerOutcome` entry point spec.md §1 describes as
//! the system's reason for existing. Grounded on the teacher's top-level
//! `ChainExecutor`/`ToolExecutionSystem` pattern of a long-lived handle that
//! owns shared state (registry, resource manager, reliability/optimizer
//! history) across many short-lived runs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use qa_confidence::{AggregationConfig, ConfidenceAggregator};
use qa_contracts::{
    ComplexityResult, ConfidenceInput, ConfidenceMetrics, ConfidenceSource, Context,
    ExecutionContext, ExecutionPlan, IntentResult, OptimizerStrategy, ResourceType, ToolChain,
    ToolOutcome,
};
use qa_executor::{DynamicExecutor, RunOutcome, ToolAdapter};
use qa_planner::{default_contracts, AdaptiveStrategySelector, ToolContractRegistry};
use qa_resource::{AllocationStrategy, ResourceLimits, ResourceManager};
use qa_synthesis::synthesize;
use tracing::info;

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::structured_logging::{new_run_id, run_span};

/// Everything produced in the course of one run, independent of the final
/// synthesized text — spec.md §9's design note that "tests read structured
/// fields, not free-form strings" is the reason this exists as its own
/// type rather than folding its contents into `AnswerOutcome` as private
/// fields.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub run_id: String,
    pub intent: IntentResult,
    pub complexity: ComplexityResult,
    pub context: Context,
    pub chain: ToolChain,
    pub plan: ExecutionPlan,
    pub run_outcome: RunOutcome,
    pub confidence: ConfidenceMetrics,
}

/// The full result of one `answer()` call.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub synthesis: qa_contracts::SynthesisResult,
    pub report: ExecutionReport,
}

/// Maps a tool's declared output keys to the [`ConfidenceSource`] spec.md
/// §4.10 assigns it, so the aggregator sees the same tool-output once per
/// the category it actually reports, not every tool lumped under one
/// generic source type.
fn source_type_for(tool_id: &str) -> ConfidenceSource {
    use qa_contracts::well_known as tools;
    match tool_id {
        t if t == tools::NER || t == tools::ENTITY_BUILDER || t == tools::RELATIONSHIP_EXTRACTOR => {
            ConfidenceSource::ToolOutput
        }
        t if t == tools::STATISTICAL_ANALYZER || t == tools::ANOMALY_DETECTOR => {
            ConfidenceSource::Statistical
        }
        t if t == tools::PAGERANK || t == tools::CENTRALITY || t == tools::MULTI_HOP_QUERY => {
            ConfidenceSource::CrossValidation
        }
        _ => ConfidenceSource::ToolOutput,
    }
}

/// Converts the executor's flat [`RunOutcome`] back into the
/// [`ExecutionContext`] shape the Response Synthesizer consumes — the two
/// types carry the same facts (per-tool outcomes, skip set, adapted
/// parameters, executed groups) but the executor reports them denormalized
/// for easy introspection in `ExecutionReport`, while the synthesizer wants
/// the structured form it shares with `qa-executor` internally.
fn execution_context_of(outcome: &RunOutcome) -> ExecutionContext {
    let mut timings = BTreeMap::new();
    for (tool_id, result) in &outcome.per_tool_outcomes {
        if let ToolOutcome::Success { duration, .. } | ToolOutcome::Error { duration, .. } = result {
            timings.insert(tool_id.clone(), *duration);
        }
    }
    ExecutionContext {
        intermediate_results: outcome.per_tool_outcomes.clone(),
        timings,
        skipped: outcome.skipped.iter().cloned().collect::<BTreeSet<_>>(),
        adapted_params: outcome.adapted_params.clone(),
        executed_groups: outcome.executed_groups.clone(),
    }
}

fn confidence_inputs_of(outcome: &RunOutcome) -> Vec<ConfidenceInput> {
    outcome
        .per_tool_outcomes
        .iter()
        .filter_map(|(tool_id, result)| match result {
            ToolOutcome::Success {
                confidence,
                uncertainty,
                duration,
                data_volume,
                ..
            } => {
                let mut input = ConfidenceInput::new(tool_id.clone(), source_type_for(tool_id), *confidence);
                input.uncertainty = *uncertainty;
                input.execution_time = *duration;
                input.data_volume = *data_volume;
                Some(input)
            }
            ToolOutcome::Error { .. } | ToolOutcome::Skipped { .. } => None,
        })
        .collect()
}

/// Default per-[`ResourceType`] budget for a from-scratch deployment,
/// generalized from the teacher's fixed worker-pool sizing into the
/// per-resource-type table spec.md §4.8 requires. Real deployments are
/// expected to replace this with limits sized to their own hardware.
fn default_resource_limits() -> HashMap<ResourceType, ResourceLimits> {
    let mut limits = HashMap::new();
    limits.insert(ResourceType::Cpu, ResourceLimits::new(800.0, 600.0, 800.0, 750.0));
    limits.insert(ResourceType::Memory, ResourceLimits::new(8192.0, 6144.0, 8192.0, 7680.0));
    limits.insert(ResourceType::DiskIo, ResourceLimits::new(500.0, 350.0, 500.0, 450.0));
    limits.insert(ResourceType::NetIo, ResourceLimits::new(500.0, 350.0, 500.0, 450.0));
    limits.insert(ResourceType::DbConnections, ResourceLimits::new(20.0, 15.0, 20.0, 18.0));
    limits.insert(ResourceType::ThreadPool, ResourceLimits::new(32.0, 24.0, 32.0, 30.0));
    limits.insert(ResourceType::ProcessPool, ResourceLimits::new(8.0, 6.0, 8.0, 7.0));
    limits
}

/// Long-lived handle: one `Orchestrator` is built once per process and
/// reused across many `answer()` calls, the way the teacher's
/// `ToolExecutionSystem` is constructed once and shared behind an `Arc`.
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: Arc<dyn ToolContractRegistry>,
    executor: DynamicExecutor,
    confidence: ConfidenceAggregator,
    optimizer_state: Mutex<AdaptiveStrategySelector>,
}

impl Orchestrator {
    /// Builds an orchestrator over the canonical tool catalog
    /// ([`default_contracts::build`]) and a from-scratch resource budget.
    /// Pass a `adapter` wired to whatever tool runtime answers the actual
    /// `invoke()` calls (spec.md §6's sole FFI seam).
    pub fn new(adapter: Arc<dyn ToolAdapter>, config: OrchestratorConfig) -> Self {
        let registry: Arc<dyn ToolContractRegistry> = Arc::new(default_contracts::build());
        let resources = if config.executor.resource_monitoring_enabled {
            Some(Arc::new(ResourceManager::new(
                default_resource_limits(),
                AllocationStrategy::Adaptive,
            )))
        } else {
            None
        };
        let executor = DynamicExecutor::new(
            adapter,
            registry.clone(),
            resources,
            config.executor.max_concurrent_tools,
        );
        let confidence = ConfidenceAggregator::new(AggregationConfig {
            outlier_z: config.confidence.outlier_z,
            consensus_threshold: config.confidence.consensus_threshold,
            ..AggregationConfig::default()
        });
        Self {
            config,
            registry,
            executor,
            confidence,
            optimizer_state: Mutex::new(AdaptiveStrategySelector::new()),
        }
    }

    /// Runs the full pipeline end to end (spec.md §1's single documented
    /// entry point): classify intent, assess complexity, extract context,
    /// generate and plan a tool chain, execute it, aggregate confidence,
    /// then synthesize a structured answer.
    pub async fn answer(&self, question: &str) -> Result<AnswerOutcome, OrchestratorError> {
        let run_id = new_run_id();
        let span = run_span(&run_id, question);
        let _entered = span.enter();
        info!("beginning run");

        let intent = qa_nlp::classify_intent(question);
        let complexity = qa_nlp::analyze_complexity(question, Some(&intent));
        let context = qa_nlp::extract_context(question, Some(&intent));

        let chain = qa_planner::generate(&intent, &complexity, &context, self.registry.as_ref())?;

        let strategy = self.resolve_strategy();
        let plan = {
            let mut optimizer_state = self.optimizer_state.lock();
            qa_planner::plan(
                &chain,
                &intent,
                &complexity,
                &context,
                strategy,
                self.registry.as_ref(),
                &mut optimizer_state,
            )?
        };

        let run_outcome = self
            .executor
            .execute(&chain, &complexity, &context, question)
            .await?;

        self.record_observations(&run_outcome);
        self.record_plan_improvement(&plan, &run_outcome);

        let confidence = self.confidence.aggregate(
            confidence_inputs_of(&run_outcome),
            self.config.confidence.default_aggregation_method,
            None,
        );

        let execution_context = execution_context_of(&run_outcome);
        let synthesis = synthesize(
            &execution_context,
            question,
            &context,
            self.config.synthesis.default_strategy,
            self.config.synthesis.default_conflict_policy,
        );

        info!(
            overall_confidence = confidence.overall,
            fragments = synthesis.fragments.len(),
            "run complete"
        );

        Ok(AnswerOutcome {
            synthesis,
            report: ExecutionReport {
                run_id,
                intent,
                complexity,
                context,
                chain,
                plan,
                run_outcome,
                confidence,
            },
        })
    }

    fn resolve_strategy(&self) -> OptimizerStrategy {
        self.config.optimizer.strategy
    }

    /// Feeds each tool's observed success/failure back into the reliability
    /// table (spec.md §4.10 "reliability[tool] updated after every run") so
    /// future runs' aggregation reflects it.
    fn record_observations(&self, outcome: &RunOutcome) {
        for (tool_id, result) in &outcome.per_tool_outcomes {
            let score = match result {
                ToolOutcome::Success { confidence, .. } => *confidence,
                ToolOutcome::Error { .. } => 0.0,
                ToolOutcome::Skipped { .. } => continue,
            };
            self.confidence.observe(tool_id, score);
        }
    }

    /// Compares the plan's estimated total time against the run's actual
    /// wall time and feeds the relative improvement to the optimizer's
    /// adaptive strategy selector (spec.md §4.7 "Adaptive strategy ... picks
    /// whichever has performed best recently").
    fn record_plan_improvement(&self, plan: &ExecutionPlan, outcome: &RunOutcome) {
        if plan.total_estimated_time <= 0.0 {
            return;
        }
        let improvement = (plan.total_estimated_time - outcome.total_time) / plan.total_estimated_time;
        self.optimizer_state
            .lock()
            .record_improvement(plan.strategy, improvement);
    }
}
