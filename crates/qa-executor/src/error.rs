use qa_contracts::ToolId;

/// Executor-level failures (spec.md §7): raised only for conditions that
/// stop the *whole run*. Per-step failures (`ToolFailure`, `TimeoutError`,
/// `ResourceDenied`, `UpstreamFailure`) are never raised as `Err` here —
/// they are recorded as [`qa_contracts::ToolOutcome`] entries in the
/// [`crate::RunOutcome`] and the run always completes (spec.md §4.9 "the
/// run always returns a RunOutcome; there is no raised exception from the
/// executor itself").
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExecutorError {
    /// Ready set is empty but pending is non-empty: a missing dependency
    /// or a skip-propagation bug (spec.md §7 `StalledExecution`).
    #[error("execution stalled with {0:?} still pending and nothing ready")]
    StalledExecution(Vec<ToolId>),
    #[error(transparent)]
    Planner(#[from] qa_planner::PlannerError),
}
