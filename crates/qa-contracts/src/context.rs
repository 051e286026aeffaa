use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonType {
    Versus,
    Ranking,
    Similarity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationType {
    Count,
    Sum,
    Average,
    Group,
    Rank,
}

/// Output of the Context Extractor (spec.md §4.3).
///
/// Invariant: `ambiguity > 0.3` implies `missing_context` is non-empty. This
/// is enforced by [`Context::set_ambiguity`] rather than left to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub has_temporal: bool,
    pub temporal_constraints: Vec<String>,
    pub mentioned_entities: Vec<String>,
    pub entity_constraints: BTreeMap<String, String>,
    pub requires_comparison: bool,
    pub comparison_type: Option<ComparisonType>,
    pub comparison_count: usize,
    pub comparison_entities: Vec<String>,
    pub requires_aggregation: bool,
    pub aggregation_type: Option<AggregationType>,
    pub aggregation_scope: Option<String>,
    pub has_filters: bool,
    pub filter_conditions: Vec<String>,
    pub output_hints: Vec<String>,
    pub scope_modifiers: Vec<String>,
    pub has_negation: bool,
    pub ambiguity: f64,
    pub missing_context: Vec<String>,
}

impl Context {
    /// Sets `ambiguity`, clamped to `[0, 1]`, and backfills `missing_context`
    /// with a generic placeholder if the caller raised ambiguity above the
    /// 0.3 threshold without recording any specific missing-context reason.
    pub fn set_ambiguity(&mut self, ambiguity: f64) {
        self.ambiguity = ambiguity.clamp(0.0, 1.0);
        if self.ambiguity > 0.3 && self.missing_context.is_empty() {
            self.missing_context.push("unresolved-reference".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguity_above_threshold_backfills_missing_context() {
        let mut ctx = Context::default();
        ctx.set_ambiguity(0.6);
        assert!(!ctx.missing_context.is_empty());
    }

    #[test]
    fn ambiguity_at_or_below_threshold_leaves_missing_context_untouched() {
        let mut ctx = Context::default();
        ctx.set_ambiguity(0.3);
        assert!(ctx.missing_context.is_empty());
    }

    #[test]
    fn ambiguity_clamps_to_unit_interval() {
        let mut ctx = Context::default();
        ctx.set_ambiguity(1.5);
        assert_eq!(ctx.ambiguity, 1.0);
    }
}
