//! The Execution Optimizer (spec.md §4.7, component C9): rewrites a plan's
//! durations, allocations, priorities, and adaptive parameters under one of
//! five strategies. DAG edges are never touched here — every function in
//! this module takes an [`ExecutionPlan`] by value and hands back one with
//! the same `steps` dependency shape, only the per-step numbers changed.

use std::collections::BTreeMap;

use qa_contracts::{DependencyAnalysis, ExecutionPlan, OptimizerStrategy, PlannedStep};
use tracing::debug;

/// Tracks a rolling exponential moving average of measured improvement per
/// strategy, the knob spec.md §4.7's `Adaptive` bullet names and
/// SPEC_FULL.md §4 supplements with a concrete decay constant (0.2) taken
/// from the Python original's `execution_optimizer.py`.
#[derive(Debug, Clone)]
pub struct AdaptiveStrategySelector {
    ema: BTreeMap<StrategyKey, f64>,
    decay: f64,
}

/// `OptimizerStrategy` isn't `Ord`/`Hash`-derived upstream (it's a plain
/// `Copy` enum matching spec.md's fixed five-member set), so this module
/// keeps its own orderable key for the EMA table rather than widening the
/// shared value type just for this lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum StrategyKey {
    Throughput,
    Latency,
    ResourceEfficient,
    Balanced,
}

fn key_of(strategy: OptimizerStrategy) -> Option<StrategyKey> {
    match strategy {
        OptimizerStrategy::ThroughputMaximization => Some(StrategyKey::Throughput),
        OptimizerStrategy::LatencyMinimization => Some(StrategyKey::Latency),
        OptimizerStrategy::ResourceEfficiency => Some(StrategyKey::ResourceEfficient),
        OptimizerStrategy::Balanced => Some(StrategyKey::Balanced),
        OptimizerStrategy::Adaptive => None,
    }
}

fn strategy_of(key: StrategyKey) -> OptimizerStrategy {
    match key {
        StrategyKey::Throughput => OptimizerStrategy::ThroughputMaximization,
        StrategyKey::Latency => OptimizerStrategy::LatencyMinimization,
        StrategyKey::ResourceEfficient => OptimizerStrategy::ResourceEfficiency,
        StrategyKey::Balanced => OptimizerStrategy::Balanced,
    }
}

impl AdaptiveStrategySelector {
    pub fn new() -> Self {
        Self {
            ema: BTreeMap::new(),
            decay: 0.2,
        }
    }

    /// Records an observed improvement (positive = better than plan
    /// estimate) for `strategy` after a run completes, updating its EMA.
    /// Called by `qa-orchestrator` once actual timings are known; a no-op
    /// for `Adaptive` itself, which never measures its own improvement
    /// directly.
    pub fn record_improvement(&mut self, strategy: OptimizerStrategy, measured_improvement: f64) {
        let Some(key) = key_of(strategy) else { return };
        let entry = self.ema.entry(key).or_insert(0.0);
        *entry = self.decay * measured_improvement + (1.0 - self.decay) * *entry;
    }

    /// The strategy with the best EMA so far; ties broken by the fixed
    /// preference order Balanced > Latency > Throughput > ResourceEfficient,
    /// matching the original's default ordering when no history exists yet.
    fn best(&self) -> OptimizerStrategy {
        let preference = [
            StrategyKey::Balanced,
            StrategyKey::Latency,
            StrategyKey::Throughput,
            StrategyKey::ResourceEfficient,
        ];
        preference
            .iter()
            .max_by(|a, b| {
                let va = self.ema.get(a).copied().unwrap_or(0.0);
                let vb = self.ema.get(b).copied().unwrap_or(0.0);
                va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|k| strategy_of(*k))
            .unwrap_or(OptimizerStrategy::Balanced)
    }
}

impl Default for AdaptiveStrategySelector {
    fn default() -> Self {
        Self::new()
    }
}

fn critical_path(steps: &[PlannedStep]) -> std::collections::BTreeSet<String> {
    steps
        .iter()
        .max_by(|a, b| {
            (a.estimated_start_time + a.estimated_duration)
                .partial_cmp(&(b.estimated_start_time + b.estimated_duration))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|finishing_last| {
            // Walk dependency chains backward from the latest-finishing step.
            let by_id: BTreeMap<&str, &PlannedStep> =
                steps.iter().map(|s| (s.tool_id.as_str(), s)).collect();
            let mut path = std::collections::BTreeSet::new();
            let mut frontier = vec![finishing_last.tool_id.as_str()];
            while let Some(id) = frontier.pop() {
                if !path.insert(id.to_string()) {
                    continue;
                }
                if let Some(step) = by_id.get(id) {
                    if let Some(slowest_dep) = step
                        .depends_on
                        .iter()
                        .filter_map(|d| by_id.get(d.as_str()))
                        .max_by(|a, b| {
                            (a.estimated_start_time + a.estimated_duration)
                                .partial_cmp(&(b.estimated_start_time + b.estimated_duration))
                                .unwrap_or(std::cmp::Ordering::Equal)
                        })
                    {
                        frontier.push(&slowest_dep.tool_id);
                    }
                }
            }
            path
        })
        .unwrap_or_default()
}

fn throughput_maximization(mut plan: ExecutionPlan, analysis: &DependencyAnalysis) -> ExecutionPlan {
    let parallel_members: std::collections::BTreeSet<String> = analysis
        .parallel_groups
        .iter()
        .filter(|g| g.len() > 1)
        .flat_map(|g| g.iter().cloned())
        .collect();
    for step in &mut plan.steps {
        if parallel_members.contains(&step.tool_id) {
            step.priority = step.priority.saturating_add(2).min(10);
            step.resource_allocation *= 1.1;
        }
    }
    plan
}

fn latency_minimization(mut plan: ExecutionPlan) -> ExecutionPlan {
    let critical = critical_path(&plan.steps);
    for step in &mut plan.steps {
        if critical.contains(&step.tool_id) {
            step.estimated_duration *= 0.85;
            step.priority = 9;
        }
    }
    plan
}

fn resource_efficiency(mut plan: ExecutionPlan) -> ExecutionPlan {
    for step in &mut plan.steps {
        step.resource_allocation *= 0.8;
        step.estimated_duration *= 1.05;
    }
    plan
}

fn balanced(mut plan: ExecutionPlan) -> ExecutionPlan {
    let critical = critical_path(&plan.steps);
    for step in &mut plan.steps {
        step.resource_allocation *= 0.9;
        if critical.contains(&step.tool_id) {
            step.estimated_duration *= 0.93;
        }
    }
    plan
}

/// `optimize(plan) → OptimizedPlan`, spec.md §4.7. `Adaptive` delegates to
/// whichever of the other four strategies currently has the best EMA in
/// `selector`.
pub fn optimize(
    mut plan: ExecutionPlan,
    strategy: OptimizerStrategy,
    analysis: &DependencyAnalysis,
    selector: &mut AdaptiveStrategySelector,
) -> ExecutionPlan {
    let resolved = match strategy {
        OptimizerStrategy::Adaptive => selector.best(),
        other => other,
    };

    plan = match resolved {
        OptimizerStrategy::ThroughputMaximization => throughput_maximization(plan, analysis),
        OptimizerStrategy::LatencyMinimization => latency_minimization(plan),
        OptimizerStrategy::ResourceEfficiency => resource_efficiency(plan),
        OptimizerStrategy::Balanced => balanced(plan),
        OptimizerStrategy::Adaptive => unreachable!("resolved is never Adaptive"),
    };

    plan.strategy = strategy;
    plan.total_estimated_time = plan
        .steps
        .iter()
        .map(|s| s.estimated_start_time + s.estimated_duration)
        .fold(0.0_f64, f64::max);

    debug!(resolved = ?resolved, requested = ?strategy, "optimizer strategy resolved");
    plan
}
