//! Built-in skip policies (spec.md §4.9 step 3.i) — the exhaustive set of
//! result-driven gates the executor evaluates before dispatching a step, on
//! top of whatever `step.condition` predicate the generator attached.

use qa_contracts::{well_known as tools, ExecutionContext, ToolOutcome};
use serde_json::Value;

/// Counts items produced under `output_key` by any already-resolved step —
/// arrays count their length, objects their key count, anything else
/// (including absence) counts as zero. The built-in gates only care about
/// "how many of X have we seen so far", not which upstream tool produced
/// them, matching spec.md §4.9's phrasing ("upstream NER yielded", "entity
/// count", "edge count") without hardcoding which tool_id holds the data.
fn count_of(ctx: &ExecutionContext, output_key: &str) -> usize {
    ctx.intermediate_results
        .values()
        .filter_map(|outcome| match outcome {
            ToolOutcome::Success { data, .. } => data.get(output_key),
            _ => None,
        })
        .map(|value| match value {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Null => 0,
            _ => 1,
        })
        .max()
        .unwrap_or(0)
}

/// Returns `Some(reason)` if a built-in gate fires for `tool_id`, `None` if
/// the step should proceed to dispatch.
pub fn built_in_skip_reason(tool_id: &str, ctx: &ExecutionContext) -> Option<String> {
    if tool_id == tools::RELATIONSHIP_EXTRACTOR {
        let entities = count_of(ctx, "entities");
        if entities < 2 {
            return Some(format!(
                "relationship extraction skipped: only {entities} entit{} upstream",
                if entities == 1 { "y" } else { "ies" }
            ));
        }
    }

    if tool_id == tools::PAGERANK {
        let entities = count_of(ctx, "entities");
        if entities < 3 {
            return Some(format!(
                "pagerank skipped: only {entities} entities upstream, need at least 3"
            ));
        }
    }

    if tool_id == tools::MULTI_HOP_QUERY {
        let edges = count_of(ctx, "edges");
        if edges < 2 {
            return Some(format!(
                "multi-hop query skipped: only {edges} edges upstream, need at least 2"
            ));
        }
    }

    None
}

/// Evaluates an opaque `step.condition` predicate name. The generator never
/// emits one today (see `qa_planner::generator`), so this is a forward
/// seam: an unrecognized name defaults to "pass" rather than blocking a
/// step the generator didn't intend to gate.
pub fn condition_skip_reason(condition: &str, ctx: &ExecutionContext) -> Option<String> {
    match condition {
        "has_entities" if count_of(ctx, "entities") == 0 => {
            Some("condition has_entities failed: no entities upstream".to_string())
        }
        "has_relationships" if count_of(ctx, "relationships") == 0 => {
            Some("condition has_relationships failed: no relationships upstream".to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx_with(key: &str, count: usize) -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        let mut data = BTreeMap::new();
        data.insert(
            key.to_string(),
            Value::Array(vec![Value::Null; count]),
        );
        ctx.intermediate_results.insert(
            "upstream".to_string(),
            ToolOutcome::Success {
                data,
                duration: 1.0,
                confidence: 0.9,
                uncertainty: 0.1,
                data_volume: count,
            },
        );
        ctx
    }

    #[test]
    fn relationship_extraction_skips_below_two_entities() {
        let ctx = ctx_with("entities", 1);
        assert!(built_in_skip_reason(tools::RELATIONSHIP_EXTRACTOR, &ctx).is_some());
    }

    #[test]
    fn relationship_extraction_proceeds_with_two_entities() {
        let ctx = ctx_with("entities", 2);
        assert!(built_in_skip_reason(tools::RELATIONSHIP_EXTRACTOR, &ctx).is_none());
    }

    #[test]
    fn pagerank_skips_below_three_entities() {
        let ctx = ctx_with("entities", 2);
        assert!(built_in_skip_reason(tools::PAGERANK, &ctx).is_some());
    }

    #[test]
    fn multi_hop_skips_below_two_edges() {
        let ctx = ctx_with("edges", 1);
        assert!(built_in_skip_reason(tools::MULTI_HOP_QUERY, &ctx).is_some());
    }

    #[test]
    fn unrelated_tool_is_never_gated() {
        let ctx = ExecutionContext::new();
        assert!(built_in_skip_reason(tools::LOADER, &ctx).is_none());
    }
}
