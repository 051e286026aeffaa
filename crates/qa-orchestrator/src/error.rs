use qa_executor::ExecutorError;
use qa_planner::PlannerError;
use qa_resource::ResourceError;

/// Umbrella error for an `answer()` run (spec.md §7): wraps the per-component
/// error types rather than inventing a new taxonomy, matching the teacher's
/// convention of one `#[error(transparent)]` arm per dependency at a crate's
/// outermost boundary.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Planner(#[from] PlannerError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
