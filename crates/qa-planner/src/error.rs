use qa_contracts::ToolId;

/// Errors raised while generating a chain, analyzing dependencies, or
/// building a plan (spec.md §4.6 "Failure", §7).
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlannerError {
    #[error("no contract registered for tool {0}")]
    UnknownTool(ToolId),
    #[error("dependency cycle detected among tools: {0:?}")]
    CyclicDependency(Vec<ToolId>),
    #[error("contract conflict: {0}")]
    ContractConflict(String),
    #[error("resource requirement for {tool_id} cannot be satisfied: {reason}")]
    UnsatisfiableResource { tool_id: ToolId, reason: String },
}
