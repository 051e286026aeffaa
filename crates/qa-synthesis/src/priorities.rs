use qa_contracts::well_known as tools;

/// Static per-tool priority used by [`qa_contracts::ConflictPolicy::SourcePriority`]
/// (spec.md §4.11). Tools that produce structural/query results are
/// trusted over ones that merely load or chunk raw text.
pub fn priority_of(tool_id: &str) -> f64 {
    match tool_id {
        id if id == tools::PAGERANK => 0.9,
        id if id == tools::MULTI_HOP_QUERY => 0.9,
        id if id == tools::NER => 0.8,
        id if id == tools::RELATIONSHIP_EXTRACTOR => 0.8,
        id if id == tools::CENTRALITY => 0.8,
        id if id == tools::COMPARATIVE_ANALYZER => 0.8,
        id if id == tools::ENTITY_BUILDER => 0.7,
        id if id == tools::EDGE_BUILDER => 0.7,
        id if id == tools::CHUNKER => 0.6,
        id if id == tools::LOADER => 0.5,
        _ => 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagerank_outranks_the_loader() {
        assert!(priority_of(tools::PAGERANK) > priority_of(tools::LOADER));
    }

    #[test]
    fn unknown_tool_gets_the_neutral_default() {
        assert_eq!(priority_of("T99_UNSEEDED"), 0.5);
    }
}
