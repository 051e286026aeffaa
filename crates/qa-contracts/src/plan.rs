use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::ToolId;

/// Strategy applied by the Execution Optimizer (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerStrategy {
    ThroughputMaximization,
    LatencyMinimization,
    ResourceEfficiency,
    Balanced,
    Adaptive,
}

impl Default for OptimizerStrategy {
    fn default() -> Self {
        OptimizerStrategy::Adaptive
    }
}

/// One step as scheduled by the DAG Builder / Execution Planner (spec.md
/// §3 `ExecutionPlan.steps`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    pub step_id: String,
    pub tool_id: ToolId,
    pub level: usize,
    pub depends_on: Vec<ToolId>,
    pub estimated_start_time: f64,
    pub estimated_duration: f64,
    /// Memory estimate in MB granted for this step's run, derived from the
    /// contract's `base_memory_estimate` and resource tags.
    pub resource_allocation: f64,
    pub priority: u8,
    pub adaptive_parameters: BTreeMap<String, Value>,
}

/// Output of the DAG Builder / Execution Planner, optionally rewritten by
/// the Execution Optimizer (spec.md §3, §4.6, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub plan_id: String,
    pub steps: Vec<PlannedStep>,
    pub strategy: OptimizerStrategy,
    pub total_estimated_time: f64,
    pub parallelization_ratio: f64,
    pub resource_efficiency: f64,
    pub confidence: f64,
}
