use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dag::Dag;
use crate::tool::ToolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Sequential,
    Parallel,
    Conditional,
}

/// One planned tool invocation inside a [`ToolChain`] (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStep {
    pub tool_id: ToolId,
    /// Maps a local input name to the producing predecessor's `(tool_id,
    /// output_key)` reference.
    pub input_bindings: BTreeMap<String, (ToolId, String)>,
    pub parameters: BTreeMap<String, Value>,
    pub depends_on: Vec<ToolId>,
    pub execution_mode: ExecutionMode,
    pub optional: bool,
    /// Opaque predicate name evaluated against accumulated results before
    /// dispatch; `None` means "always ready once dependencies resolve".
    pub condition: Option<String>,
}

impl ToolStep {
    pub fn new(tool_id: impl Into<ToolId>) -> Self {
        Self {
            tool_id: tool_id.into(),
            input_bindings: BTreeMap::new(),
            parameters: BTreeMap::new(),
            depends_on: Vec::new(),
            execution_mode: ExecutionMode::Sequential,
            optional: false,
            condition: None,
        }
    }
}

/// Output of the Tool-Chain Generator (spec.md §4.4): an ordered sequence of
/// steps, each dependency appearing earlier than its dependents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolChain {
    pub steps: Vec<ToolStep>,
    pub can_parallelize: bool,
    pub estimated_time: f64,
    pub estimated_memory: f64,
    pub execution_graph: Dag,
}

impl ToolChain {
    /// True iff every dependency of every step appears earlier in `steps`.
    pub fn is_topologically_ordered(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !step.depends_on.iter().all(|d| seen.contains(d)) {
                return false;
            }
            seen.insert(step.tool_id.clone());
        }
        true
    }
}
