//! Resource Manager (spec.md §4.8, component C10): the single authority
//! over CPU/memory/DB-connection/rate-limit budgets for an in-flight run.

mod error;
mod limits;
mod manager;

pub use error::ResourceError;
pub use limits::{AllocationStrategy, ResourceLimits};
pub use manager::{ResourceManager, ResourceManagerSnapshot, ResourceTypeSnapshot};
