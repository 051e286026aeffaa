//! A concrete, in-memory tool-contract catalog for the canonical tool set
//! named in `qa_contracts::well_known`. This is the catalog a from-scratch
//! deployment of this core ships with; real deployments swap in their own
//! [`ToolContractRegistry`](crate::ToolContractRegistry) implementation
//! backed by whatever store the adapter side owns.

use qa_contracts::{well_known as tools, ResourceTag, ToolContract};

use crate::registry::InMemoryToolContractRegistry;

pub fn build() -> InMemoryToolContractRegistry {
    let mut registry = InMemoryToolContractRegistry::new();

    registry
        .insert(
            ToolContract::new(tools::LOADER)
                .with_outputs(["raw_text"])
                .with_estimates(0.5, 32.0),
        )
        .insert(
            ToolContract::new(tools::CHUNKER)
                .with_inputs(["raw_text"])
                .with_outputs(["chunks"])
                .with_estimates(0.5, 32.0),
        )
        .insert(
            ToolContract::new(tools::NER)
                .with_inputs(["chunks"])
                .with_outputs(["entities"])
                .with_estimates(1.5, 256.0),
        )
        .insert(
            ToolContract::new(tools::ENTITY_BUILDER)
                .with_inputs(["entities"])
                .with_outputs(["entity_graph_nodes"])
                .with_resource_tags([ResourceTag::Writes("graph".to_string())])
                .with_estimates(1.0, 128.0),
        )
        .insert(
            ToolContract::new(tools::RELATIONSHIP_EXTRACTOR)
                .with_inputs(["chunks", "entities"])
                .with_outputs(["relationships"])
                .with_estimates(2.0, 256.0),
        )
        .insert(
            ToolContract::new(tools::EDGE_BUILDER)
                .with_inputs(["relationships", "entity_graph_nodes"])
                .with_outputs(["edges"])
                .with_resource_tags([ResourceTag::Writes("graph".to_string())])
                .with_estimates(1.0, 128.0),
        )
        .insert(
            ToolContract::new(tools::PAGERANK)
                .with_inputs(["entity_graph_nodes", "edges"])
                .with_outputs(["pagerank_scores"])
                .with_resource_tags([ResourceTag::Reads("graph".to_string())])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::CENTRALITY)
                .with_inputs(["entity_graph_nodes", "edges"])
                .with_outputs(["centrality_scores"])
                .with_resource_tags([ResourceTag::Reads("graph".to_string())])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::MULTI_HOP_QUERY)
                .with_inputs(["edges"])
                .with_outputs(["paths"])
                .with_resource_tags([ResourceTag::Reads("graph".to_string())])
                .with_estimates(1.0, 64.0),
        )
        .insert(
            ToolContract::new(tools::THEME_EXTRACTOR)
                .with_inputs(["chunks"])
                .with_outputs(["themes"])
                .with_estimates(1.0, 96.0),
        )
        .insert(
            ToolContract::new(tools::SUMMARIZER)
                .with_inputs(["chunks"])
                .with_outputs(["summary"])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::SENTIMENT_ANALYZER)
                .with_inputs(["chunks"])
                .with_outputs(["sentiment"])
                .with_estimates(0.8, 64.0),
        )
        .insert(
            ToolContract::new(tools::STATISTICAL_ANALYZER)
                .with_inputs(["entities"])
                .with_outputs(["stats"])
                .with_estimates(1.0, 96.0),
        )
        .insert(
            ToolContract::new(tools::ANOMALY_DETECTOR)
                .with_inputs(["stats"])
                .with_outputs(["anomalies"])
                .with_estimates(1.0, 96.0),
        )
        .insert(
            ToolContract::new(tools::PATTERN_MINER)
                .with_inputs(["chunks"])
                .with_outputs(["patterns"])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::CAUSAL_ANALYZER)
                .with_inputs(["relationships"])
                .with_outputs(["causal_links"])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::PREDICTIVE_MODEL)
                .with_inputs(["stats"])
                .with_outputs(["predictions"])
                .with_estimates(2.0, 192.0),
        )
        .insert(
            ToolContract::new(tools::HIERARCHY_BUILDER)
                .with_inputs(["entity_graph_nodes", "edges"])
                .with_outputs(["hierarchy"])
                .with_resource_tags([ResourceTag::Reads("graph".to_string())])
                .with_estimates(1.5, 128.0),
        )
        .insert(
            ToolContract::new(tools::COMPARATIVE_ANALYZER)
                .with_inputs(["entities"])
                .with_outputs(["comparison"])
                .with_estimates(1.0, 96.0),
        )
        .insert(
            ToolContract::new(tools::SEARCH_INDEX)
                .with_inputs(["chunks"])
                .with_outputs(["search_results"])
                .with_estimates(0.8, 64.0),
        );

    registry
}
