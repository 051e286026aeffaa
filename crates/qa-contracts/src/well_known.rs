//! Canonical tool identifiers shared by the Intent Classifier's
//! recommended-tool tables and the Tool-Chain Generator's seeding/closure
//! rules (spec.md §4.1, §4.4). These are the only tool identifiers named
//! anywhere in core logic; everything else about a tool comes from its
//! [`ToolContract`](crate::ToolContract).

pub const LOADER: &str = "T01_DOCUMENT_LOADER";
pub const CHUNKER: &str = "T02_TEXT_CHUNKER";
pub const NER: &str = "T23A_SPACY_NER";
pub const ENTITY_BUILDER: &str = "T31_ENTITY_BUILDER";
pub const RELATIONSHIP_EXTRACTOR: &str = "T27_RELATIONSHIP_EXTRACTOR";
pub const EDGE_BUILDER: &str = "T34_EDGE_BUILDER";
pub const PAGERANK: &str = "T68_PAGERANK";
pub const CENTRALITY: &str = "T50_CENTRALITY_ANALYSIS";
pub const MULTI_HOP_QUERY: &str = "T49_MULTI_HOP_QUERY";
pub const THEME_EXTRACTOR: &str = "T41_THEME_EXTRACTOR";
pub const SUMMARIZER: &str = "T15_SUMMARIZER";
pub const SENTIMENT_ANALYZER: &str = "T60_SENTIMENT_ANALYZER";
pub const STATISTICAL_ANALYZER: &str = "T70_STATISTICAL_ANALYZER";
pub const ANOMALY_DETECTOR: &str = "T71_ANOMALY_DETECTOR";
pub const PATTERN_MINER: &str = "T72_PATTERN_MINER";
pub const CAUSAL_ANALYZER: &str = "T73_CAUSAL_ANALYZER";
pub const PREDICTIVE_MODEL: &str = "T74_PREDICTIVE_MODEL";
pub const HIERARCHY_BUILDER: &str = "T75_HIERARCHY_BUILDER";
pub const COMPARATIVE_ANALYZER: &str = "T76_COMPARATIVE_ANALYZER";
pub const SEARCH_INDEX: &str = "T80_SEARCH_INDEX";
