//! Confidence Aggregator (spec.md §4.10, component C12): combines per-tool
//! and per-source-type trust, the configured [`AggregationMethod`], and an
//! uncertainty decomposition into one [`qa_contracts::ConfidenceMetrics`].

mod aggregation;
mod aggregator;
mod reliability;
mod stats;
mod uncertainty;
mod weights;

pub use aggregation::{AggregationConfig, AggregationMethod, DynamicWeightingContext};
pub use aggregator::ConfidenceAggregator;
pub use reliability::ToolReliabilityTable;
pub use uncertainty::UncertaintyBreakdown;
pub use weights::SourceTypeWeights;
