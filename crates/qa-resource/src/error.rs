use qa_contracts::ResourceType;

/// Errors raised by the Resource Manager (spec.md §4.8, §7 `ResourceDenied`).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResourceError {
    #[error("resource request for {resource_type:?} denied: {reason}")]
    Denied {
        resource_type: ResourceType,
        reason: String,
    },
    #[error("resource request for {resource_type:?} timed out waiting for a grant")]
    TimedOut { resource_type: ResourceType },
    #[error("no limits configured for resource type {0:?}")]
    UnconfiguredResourceType(ResourceType),
    #[error("no such allocation: {0}")]
    UnknownAllocation(String),
}
