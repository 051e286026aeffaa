use std::fmt;

use crate::tool::ToolId;

/// The error taxonomy of spec.md §7, named by kind rather than by the
/// component that happens to raise it — the same kind can originate in the
/// planner, the executor, or the resource manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorKind {
    UnknownTool,
    CyclicDependency,
    StalledExecution,
    ResourceDenied,
    ToolFailure,
    TimeoutError,
    UpstreamFailure,
    ContractConflict,
}

impl fmt::Display for CoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CoreErrorKind::UnknownTool => "unknown-tool",
            CoreErrorKind::CyclicDependency => "cyclic-dependency",
            CoreErrorKind::StalledExecution => "stalled-execution",
            CoreErrorKind::ResourceDenied => "resource-denied",
            CoreErrorKind::ToolFailure => "tool-failure",
            CoreErrorKind::TimeoutError => "timeout-error",
            CoreErrorKind::UpstreamFailure => "upstream-failure",
            CoreErrorKind::ContractConflict => "contract-conflict",
        };
        write!(f, "{}", label)
    }
}

impl CoreErrorKind {
    /// Fatal kinds abort the current run entirely (spec.md §7 propagation
    /// policy); the rest are recovered locally by skipping/failing the
    /// affected step while the run continues.
    pub fn is_fatal(self) -> bool {
        matches!(
            self,
            CoreErrorKind::UnknownTool
                | CoreErrorKind::CyclicDependency
                | CoreErrorKind::ContractConflict
        )
    }
}

/// A single error raised anywhere in the core, carrying the offending tool
/// (when applicable) and a human-readable detail message.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} ({tool_id:?}): {message}")]
pub struct CoreError {
    pub kind: CoreErrorKind,
    pub tool_id: Option<ToolId>,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            tool_id: None,
            message: message.into(),
        }
    }

    pub fn for_tool(kind: CoreErrorKind, tool_id: impl Into<ToolId>, message: impl Into<String>) -> Self {
        Self {
            kind,
            tool_id: Some(tool_id.into()),
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}
