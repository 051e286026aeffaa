use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tool::ToolId;

/// A tool invocation's result, as reported by the external
/// [`ToolAdapter`](../qa_executor/trait.ToolAdapter.html) (spec.md §3,
/// §6). `status` is tagged rather than encoded in `data`/`error` alone so
/// downstream matching stays exhaustive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success {
        data: BTreeMap<String, Value>,
        duration: f64,
        confidence: f64,
        uncertainty: f64,
        data_volume: usize,
    },
    Error {
        reason: String,
        duration: f64,
    },
    /// Not dispatched at all: either a built-in skip policy fired, an
    /// upstream dependency failed, or a predecessor was itself skipped and
    /// this step is not optional.
    Skipped {
        reason: String,
    },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ToolOutcome::Skipped { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolOutcome::Error { .. })
    }
}

/// One batch of steps dispatched together as a parallel group, recorded for
/// the run's timeline (spec.md §3 `ExecutionContext.executedGroups`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutedGroup {
    pub tools: Vec<ToolId>,
    pub wall_time: f64,
}

/// Mutable state owned exclusively by the Dynamic Executor for the
/// duration of one run (spec.md §3). Created at run start, discarded when
/// the run concludes; never shared across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub intermediate_results: BTreeMap<ToolId, ToolOutcome>,
    pub timings: BTreeMap<ToolId, f64>,
    pub skipped: BTreeSet<ToolId>,
    pub adapted_params: BTreeMap<ToolId, BTreeMap<String, Value>>,
    pub executed_groups: Vec<ExecutedGroup>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `tool_id` has a terminal outcome recorded (success, error,
    /// or skip) — i.e. it is no longer `Pending`/`Running`.
    pub fn is_resolved(&self, tool_id: &ToolId) -> bool {
        self.intermediate_results.contains_key(tool_id)
    }

    /// True iff `tool_id` resolved to `Succeeded` or `Skipped` — the gate
    /// the executor uses to decide readiness of dependents (spec.md §3
    /// global invariant 2).
    pub fn satisfies_dependency(&self, tool_id: &ToolId) -> bool {
        match self.intermediate_results.get(tool_id) {
            Some(ToolOutcome::Success { .. }) | Some(ToolOutcome::Skipped { .. }) => true,
            Some(ToolOutcome::Error { .. }) | None => false,
        }
    }
}
