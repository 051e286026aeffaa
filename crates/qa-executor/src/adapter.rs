use std::collections::BTreeMap;

use async_trait::async_trait;
use qa_contracts::{ToolId, ToolOutcome};
use serde_json::Value;

/// The sole FFI seam (spec.md §6): the core makes no assumptions about the
/// adapter's implementation language or transport, only that it can invoke
/// a tool by id with an argument map and report back a [`ToolOutcome`].
/// Mirrors the teacher's `ToolExecutor`/`tool_execution::ToolExecutor`
/// async-trait boundary.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    async fn invoke(&self, tool_id: &ToolId, arguments: BTreeMap<String, Value>) -> ToolOutcome;
}
