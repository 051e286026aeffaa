use std::collections::BTreeMap;

use qa_contracts::{well_known as tools, ConfidenceSource};

/// Default per-[`ConfidenceSource`] multiplier applied during
/// preprocessing, before any per-tool reliability weight. Cross-validated
/// agreement between independent tools is trusted more than a single
/// tool's self-reported confidence; temporal consistency least of all.
pub struct SourceTypeWeights {
    weights: BTreeMap<ConfidenceSource, f64>,
}

impl SourceTypeWeights {
    pub fn weight_for(&self, source: ConfidenceSource) -> f64 {
        self.weights.get(&source).copied().unwrap_or(1.0)
    }
}

impl Default for SourceTypeWeights {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(ConfidenceSource::ToolOutput, 1.0);
        weights.insert(ConfidenceSource::ExecutionSuccess, 0.8);
        weights.insert(ConfidenceSource::DataQuality, 0.9);
        weights.insert(ConfidenceSource::TemporalConsistency, 0.7);
        weights.insert(ConfidenceSource::CrossValidation, 1.2);
        weights.insert(ConfidenceSource::Statistical, 1.1);
        weights.insert(ConfidenceSource::Domain, 0.9);
        weights.insert(ConfidenceSource::UserFeedback, 1.0);
        Self { weights }
    }
}

/// Seed reliability weights for the tools in
/// [`qa_contracts::well_known`], used until
/// [`crate::reliability::ToolReliabilityTable`] learns better ones from
/// observed performance.
pub fn seed_tool_reliability() -> BTreeMap<String, f64> {
    let mut weights = BTreeMap::new();
    weights.insert(tools::LOADER.to_string(), 0.95);
    weights.insert(tools::CHUNKER.to_string(), 0.98);
    weights.insert(tools::NER.to_string(), 0.90);
    weights.insert(tools::RELATIONSHIP_EXTRACTOR.to_string(), 0.85);
    weights.insert(tools::ENTITY_BUILDER.to_string(), 0.88);
    weights.insert(tools::EDGE_BUILDER.to_string(), 0.87);
    weights.insert(tools::MULTI_HOP_QUERY.to_string(), 0.82);
    weights.insert(tools::PAGERANK.to_string(), 0.93);
    weights.insert(tools::CENTRALITY.to_string(), 0.90);
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_validation_outweighs_temporal_consistency() {
        let weights = SourceTypeWeights::default();
        assert!(
            weights.weight_for(ConfidenceSource::CrossValidation)
                > weights.weight_for(ConfidenceSource::TemporalConsistency)
        );
    }

    #[test]
    fn unknown_source_defaults_to_neutral_weight() {
        let weights = SourceTypeWeights::default();
        assert_eq!(weights.weight_for(ConfidenceSource::Domain), 0.9);
    }

    #[test]
    fn seed_weights_cover_the_well_known_pipeline_tools() {
        let seeds = seed_tool_reliability();
        assert!(seeds.contains_key(tools::NER));
        assert!(seeds.get(tools::CHUNKER).copied().unwrap() > seeds.get(tools::MULTI_HOP_QUERY).copied().unwrap());
    }
}
