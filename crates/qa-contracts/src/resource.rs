use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Cpu,
    Memory,
    DiskIo,
    NetIo,
    DbConnections,
    ThreadPool,
    ProcessPool,
}

/// A requester's ask for some quantity of a [`ResourceType`] (spec.md §3,
/// §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub requester_id: String,
    pub resource_type: ResourceType,
    pub amount: f64,
    /// `1` (lowest) to `10` (highest).
    pub priority: u8,
    pub duration_estimate: f64,
    pub can_wait: bool,
    pub timeout: f64,
}

impl ResourceRequest {
    pub fn new(requester_id: impl Into<String>, resource_type: ResourceType, amount: f64) -> Self {
        Self {
            requester_id: requester_id.into(),
            resource_type,
            amount,
            priority: 5,
            duration_estimate: 0.0,
            can_wait: true,
            timeout: 30.0,
        }
    }
}

/// A granted [`ResourceRequest`] (spec.md §3). `expires_at` and
/// `actual_usage` are mutable for the lifetime of the allocation; the
/// allocation is released explicitly or auto-released past `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub allocation_id: String,
    pub requester_id: String,
    pub resource_type: ResourceType,
    pub amount: f64,
    pub start: f64,
    pub expires_at: Option<f64>,
    pub actual_usage: f64,
    pub active: bool,
}
