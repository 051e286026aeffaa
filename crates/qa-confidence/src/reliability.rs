use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::weights::seed_tool_reliability;

/// Exponential-moving-average decay applied on each observed-performance
/// update (spec.md §6 "Persisted state": "updated via exponential moving
/// average with decay 0.1").
const DECAY: f64 = 0.1;

/// The Confidence Aggregator's one piece of long-lived state across runs
/// (spec.md §6): per-tool reliability, seeded from historical defaults and
/// refined via EMA as the caller reports observed performance.
pub struct ToolReliabilityTable {
    weights: RwLock<BTreeMap<String, f64>>,
}

impl ToolReliabilityTable {
    pub fn new() -> Self {
        Self {
            weights: RwLock::new(seed_tool_reliability()),
        }
    }

    pub fn reliability_of(&self, tool_id: &str) -> f64 {
        self.weights.read().get(tool_id).copied().unwrap_or(1.0)
    }

    /// `performance_score` is the caller's observed outcome quality for
    /// `tool_id`, in `[0, 1]`. Clamped to `[0.1, 1.0]` so a single bad run
    /// never drives a tool's weight to zero.
    pub fn update(&self, tool_id: &str, performance_score: f64) {
        let mut weights = self.weights.write();
        let current = weights.get(tool_id).copied().unwrap_or(1.0);
        let updated = (1.0 - DECAY) * current + DECAY * performance_score.clamp(0.0, 1.0);
        weights.insert(tool_id.to_string(), updated.clamp(0.1, 1.0));
    }

    pub fn snapshot(&self) -> BTreeMap<String, f64> {
        self.weights.read().clone()
    }
}

impl Default for ToolReliabilityTable {
    fn default() -> Self {
        Self::new()
    }
}
