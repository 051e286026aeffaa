use qa_contracts::{ConfidenceInput, ConfidenceMetrics};
use tracing::info;

use crate::aggregation::{
    self, AggregationConfig, AggregationMethod, DynamicWeightingContext,
};
use crate::reliability::ToolReliabilityTable;
use crate::uncertainty::{self, UncertaintyBreakdown};
use crate::weights::SourceTypeWeights;

/// Aggregates confidence across a run's tool outcomes and the Dynamic
/// Executor's own success/failure signal, combining per-source-type trust,
/// per-tool learned reliability, and the chosen [`AggregationMethod`] into
/// a single [`ConfidenceMetrics`] (spec.md §4.10).
///
/// Pure and synchronous except for [`ConfidenceAggregator::observe`],
/// which mutates the long-lived reliability table (spec.md §6 "Persisted
/// state").
pub struct ConfidenceAggregator {
    reliability: ToolReliabilityTable,
    source_weights: SourceTypeWeights,
    config: AggregationConfig,
}

impl ConfidenceAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self {
            reliability: ToolReliabilityTable::new(),
            source_weights: SourceTypeWeights::default(),
            config,
        }
    }

    /// Applies tool-reliability and source-type weighting, drops any input
    /// whose confidence falls outside `[0, 1]`, and clamps an
    /// out-of-range uncertainty to `0.0` rather than dropping the input —
    /// the original's rationale was that a malformed uncertainty is less
    /// trustworthy information than the confidence score itself.
    fn preprocess(&self, inputs: Vec<ConfidenceInput>) -> Vec<ConfidenceInput> {
        inputs
            .into_iter()
            .filter(|input| (0.0..=1.0).contains(&input.confidence))
            .map(|mut input| {
                if !(0.0..=1.0).contains(&input.uncertainty) {
                    input.uncertainty = 0.0;
                }
                let tool_weight = self.reliability.reliability_of(&input.source_id);
                let source_weight = self.source_weights.weight_for(input.source_type);
                input.weight *= tool_weight * source_weight;
                input
            })
            .collect()
    }

    /// Aggregates `inputs` via `method`, returning neutral-but-valid
    /// [`ConfidenceMetrics`] (spec.md §8 invariant 5) when nothing survives
    /// preprocessing rather than failing the run.
    pub fn aggregate(
        &self,
        inputs: Vec<ConfidenceInput>,
        method: AggregationMethod,
        context: Option<&DynamicWeightingContext>,
    ) -> ConfidenceMetrics {
        let total = inputs.len();
        let valid = self.preprocess(inputs);
        let failed = total - valid.len();

        info!(
            inputs = valid.len(),
            failed, method = ?method, "aggregating confidence"
        );

        if valid.is_empty() {
            return ConfidenceMetrics {
                overall: 0.5,
                variance: 0.0,
                uncertainty_level: 0.8,
                reliability: 0.3,
                consensus_strength: 0.0,
                per_tool: Default::default(),
                per_source: Default::default(),
                outliers: Vec::new(),
                distribution: Default::default(),
            };
        }

        let reliability_of = |tool_id: &str| self.reliability.reliability_of(tool_id);

        let metrics = match method {
            AggregationMethod::WeightedAverage => aggregation::weighted_average(&valid, &self.config, reliability_of),
            AggregationMethod::BayesianFusion => aggregation::bayesian_fusion(&valid, reliability_of),
            AggregationMethod::MinimumConsensus => aggregation::minimum_consensus(&valid, &self.config, reliability_of),
            AggregationMethod::UncertaintyWeighted => aggregation::uncertainty_weighted(&valid, reliability_of),
            AggregationMethod::DynamicWeighting => aggregation::dynamic_weighting(
                &valid,
                &self.config,
                context.unwrap_or(&DynamicWeightingContext::default()),
                reliability_of,
            ),
        };

        let breakdown = self.quantify_uncertainty(&valid);
        let mut metrics = aggregation::finish(metrics, &valid, &self.config);
        metrics.uncertainty_level = breakdown.total;
        metrics
    }

    /// Per-source uncertainty decomposition alongside the aggregated
    /// metrics (spec.md §4.10).
    pub fn quantify_uncertainty(&self, inputs: &[ConfidenceInput]) -> UncertaintyBreakdown {
        uncertainty::quantify(inputs, &self.reliability)
    }

    /// Reports observed tool performance so future aggregations weight
    /// that tool accordingly (spec.md §6 EMA decay 0.1).
    pub fn observe(&self, tool_id: &str, performance_score: f64) {
        self.reliability.update(tool_id, performance_score);
    }

    pub fn reliability_snapshot(&self) -> std::collections::BTreeMap<String, f64> {
        self.reliability.snapshot()
    }
}

impl Default for ConfidenceAggregator {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::ConfidenceSource;

    fn input(id: &str, confidence: f64) -> ConfidenceInput {
        ConfidenceInput::new(id, ConfidenceSource::ToolOutput, confidence)
    }

    #[test]
    fn aggregating_no_inputs_returns_neutral_metrics_not_an_error() {
        let aggregator = ConfidenceAggregator::default();
        let metrics = aggregator.aggregate(Vec::new(), AggregationMethod::WeightedAverage, None);
        assert_eq!(metrics.overall, 0.5);
        assert_eq!(metrics.uncertainty_level, 0.8);
    }

    #[test]
    fn overall_confidence_always_stays_in_unit_interval() {
        let aggregator = ConfidenceAggregator::default();
        for method in [
            AggregationMethod::WeightedAverage,
            AggregationMethod::BayesianFusion,
            AggregationMethod::MinimumConsensus,
            AggregationMethod::UncertaintyWeighted,
            AggregationMethod::DynamicWeighting,
        ] {
            let inputs = vec![input("a", 0.95), input("b", 0.4), input("c", 0.6)];
            let metrics = aggregator.aggregate(inputs, method, None);
            assert!(metrics.overall >= 0.0 && metrics.overall <= 1.0, "{method:?} produced {}", metrics.overall);
        }
    }

    #[test]
    fn observed_performance_shifts_subsequent_reliability() {
        let aggregator = ConfidenceAggregator::default();
        let before = aggregator.reliability_snapshot().get(qa_contracts::well_known::NER).copied().unwrap();
        aggregator.observe(qa_contracts::well_known::NER, 1.0);
        let after = aggregator.reliability_snapshot().get(qa_contracts::well_known::NER).copied().unwrap();
        assert!(after >= before);
    }

    #[test]
    fn invalid_confidence_scores_are_dropped_during_preprocessing() {
        let aggregator = ConfidenceAggregator::default();
        let mut bad = input("bad", 0.5);
        bad.confidence = 1.5;
        let metrics = aggregator.aggregate(vec![input("a", 0.8), bad], AggregationMethod::WeightedAverage, None);
        assert!(metrics.per_tool.contains_key("a"));
        assert!(!metrics.per_tool.contains_key("bad"));
    }
}
