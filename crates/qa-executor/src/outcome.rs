use std::collections::BTreeMap;

use qa_contracts::{ExecutedGroup, ToolId, ToolOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Final product of one executor run (spec.md §4.9 step 5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub per_tool_outcomes: BTreeMap<ToolId, ToolOutcome>,
    pub executed: Vec<ToolId>,
    pub skipped: Vec<ToolId>,
    pub failed: Vec<ToolId>,
    pub total_time: f64,
    pub parallel_groups_run: usize,
    pub adapted_params: BTreeMap<ToolId, BTreeMap<String, Value>>,
    pub executed_groups: Vec<ExecutedGroup>,
}
