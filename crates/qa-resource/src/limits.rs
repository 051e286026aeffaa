//! Per-[`ResourceType`] thresholds, normalized to one unit per type (spec.md
//! §9 Open Question: "implementers must not mix [percentage and absolute
//! counts]"). Every field here is in the same native unit as `amount` on a
//! [`qa_contracts::ResourceRequest`] for that resource type — e.g. MB for
//! `Memory`, a connection count for `DbConnections`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Total amount available to grant, at process start.
    pub initial_pool: f64,
    /// Usage above this logs a warning but is still granted.
    pub soft_limit: f64,
    /// Usage may never exceed this; requests that would cross it are
    /// denied or queued.
    pub hard_limit: f64,
    /// Usage above this triggers the background monitor's emergency
    /// warning (spec.md §4.8 "emit emergency warnings").
    pub emergency_limit: f64,
}

impl ResourceLimits {
    pub fn new(initial_pool: f64, soft_limit: f64, hard_limit: f64, emergency_limit: f64) -> Self {
        Self {
            initial_pool,
            soft_limit,
            hard_limit,
            emergency_limit,
        }
    }
}

/// How the priority queue's wait-score is computed (spec.md §4.8's
/// priority formula, generalized per SPEC_FULL.md §4's supplemented
/// `AllocationStrategy` knob from the Python original's
/// `resource_manager_enhanced.py`). The request/grant contract itself
/// (spec.md §4.8) is identical under every strategy; only the relative
/// weighting of requester priority, urgency, scarcity, and requested
/// amount changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationStrategy {
    /// Requester priority is ignored; only urgency and scarcity matter.
    FairShare,
    /// Requester priority dominates the score.
    PriorityBased,
    /// Pool scarcity dominates the score.
    DemandBased,
    /// The balanced formula spec.md §4.8 specifies directly.
    Adaptive,
    /// Larger requests are served first, to maximize immediate throughput
    /// at the cost of fairness.
    Greedy,
}

impl Default for AllocationStrategy {
    fn default() -> Self {
        AllocationStrategy::Adaptive
    }
}
