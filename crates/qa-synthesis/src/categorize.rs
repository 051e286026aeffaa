//! Bucketing step (spec.md §4.11 bullet 1): "Categorize each tool's outputs
//! into content buckets (entities, relationships, themes, metrics,
//! summaries, other)". Buckets map 1:1 onto [`FragmentType`] except
//! `other`, which is further split by output-key shape so a "comparison"
//! key doesn't end up indistinguishable from a "paths" key once it reaches
//! `other`.
//!
//! Grounded on the declared output keys of `qa_planner::default_contracts`
//! (spec.md §4.6's canonical catalog) — this module owns the one place
//! that maps an output key name to a [`FragmentType`], so nothing
//! downstream re-derives it.

use qa_contracts::FragmentType;

/// A single tool's contribution to one bucket: the raw value rendered to
/// text, the tool's own reported confidence for that invocation, and the
/// tool id for attribution.
#[derive(Debug, Clone)]
pub struct BucketEntry {
    pub tool_id: String,
    pub content: String,
    pub confidence: f64,
}

/// Renders a `serde_json::Value` to a short human-readable string — arrays
/// join their elements, objects list `key: value` pairs, scalars print
/// directly. Fragments carry prose, not JSON blobs.
pub fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_value).collect();
            rendered.join(", ")
        }
        serde_json::Value::Object(map) => {
            let rendered: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{k}: {}", render_value(v)))
                .collect();
            rendered.join("; ")
        }
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Maps a declared output key to the [`FragmentType`] bucket it belongs to,
/// or `None` for structural/internal outputs (`chunks`, `raw_text`,
/// `entity_graph_nodes`) that never surface as their own fragment — they
/// exist only to feed a downstream tool.
pub fn bucket_of(output_key: &str) -> Option<FragmentType> {
    match output_key {
        "entities" => Some(FragmentType::Entity),
        "relationships" | "edges" | "causal_links" => Some(FragmentType::Relationship),
        "themes" => Some(FragmentType::Theme),
        "pagerank_scores" | "centrality_scores" | "stats" | "sentiment" | "anomalies"
        | "predictions" => Some(FragmentType::Metric),
        "summary" => Some(FragmentType::Summary),
        "comparison" => Some(FragmentType::Comparison),
        "paths" | "patterns" | "hierarchy" => Some(FragmentType::Finding),
        "search_results" => Some(FragmentType::Evidence),
        "raw_text" | "chunks" | "entity_graph_nodes" => None,
        _ => Some(FragmentType::Evidence),
    }
}

/// True for buckets the spec calls out as counting toward the non-other
/// "entities, relationships, themes, metrics, summaries" enumeration; the
/// remaining fragment types (`Finding`, `Evidence`, `Comparison`, `Answer`)
/// are the "other" bucket, split further for readability.
pub fn is_named_bucket(bucket: FragmentType) -> bool {
    matches!(
        bucket,
        FragmentType::Entity
            | FragmentType::Relationship
            | FragmentType::Theme
            | FragmentType::Metric
            | FragmentType::Summary
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_key_buckets_as_entity() {
        assert_eq!(bucket_of("entities"), Some(FragmentType::Entity));
    }

    #[test]
    fn structural_keys_have_no_bucket() {
        assert_eq!(bucket_of("raw_text"), None);
        assert_eq!(bucket_of("chunks"), None);
        assert_eq!(bucket_of("entity_graph_nodes"), None);
    }

    #[test]
    fn unknown_key_falls_back_to_evidence() {
        assert_eq!(bucket_of("something_new"), Some(FragmentType::Evidence));
    }

    #[test]
    fn render_value_joins_arrays_with_commas() {
        let v = serde_json::json!(["Acme", "Globex"]);
        assert_eq!(render_value(&v), "Acme, Globex");
    }
}
