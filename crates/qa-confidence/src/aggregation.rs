use std::collections::BTreeMap;

use qa_contracts::{ConfidenceInput, ConfidenceMetrics, ConfidenceSource};
use serde::{Deserialize, Serialize};

use crate::stats;

/// The five aggregation methods (spec.md §4.10). `MaximumLikelihood` and
/// `EnsembleVoting` appear in the original source's enum but have no
/// caller in this pipeline and are left out rather than carried as dead
/// variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationMethod {
    WeightedAverage,
    BayesianFusion,
    MinimumConsensus,
    UncertaintyWeighted,
    DynamicWeighting,
}

impl Default for AggregationMethod {
    fn default() -> Self {
        AggregationMethod::WeightedAverage
    }
}

/// Context available to [`AggregationMethod::DynamicWeighting`] for
/// adjusting per-input weights (spec.md §4.10 "weights adjusted by
/// execution-time ratio, data-volume ratio, and question-complexity
/// preference for reliable tools").
#[derive(Debug, Clone, Copy, Default)]
pub struct DynamicWeightingContext {
    pub average_execution_time: Option<f64>,
    pub average_data_volume: Option<usize>,
    pub question_is_complex: bool,
}

/// Tunables from the Confidence configuration surface (spec.md §6).
#[derive(Debug, Clone, Copy)]
pub struct AggregationConfig {
    pub outlier_z: f64,
    pub consensus_threshold: f64,
    pub uncertainty_penalty: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            outlier_z: 2.0,
            consensus_threshold: 0.7,
            uncertainty_penalty: 0.1,
        }
    }
}

fn source_key(source: ConfidenceSource) -> &'static str {
    match source {
        ConfidenceSource::ToolOutput => "tool_output",
        ConfidenceSource::ExecutionSuccess => "execution_success",
        ConfidenceSource::DataQuality => "data_quality",
        ConfidenceSource::TemporalConsistency => "temporal_consistency",
        ConfidenceSource::CrossValidation => "cross_validation",
        ConfidenceSource::Statistical => "statistical_significance",
        ConfidenceSource::Domain => "domain_expertise",
        ConfidenceSource::UserFeedback => "user_feedback",
    }
}

fn per_tool(inputs: &[ConfidenceInput]) -> BTreeMap<String, f64> {
    inputs
        .iter()
        .map(|i| (i.source_id.clone(), i.confidence))
        .collect()
}

fn per_source(inputs: &[ConfidenceInput]) -> BTreeMap<String, f64> {
    let mut by_type: BTreeMap<&'static str, Vec<f64>> = BTreeMap::new();
    for input in inputs {
        by_type.entry(source_key(input.source_type)).or_default().push(input.confidence);
    }
    by_type
        .into_iter()
        .map(|(key, confidences)| (key.to_string(), stats::mean(&confidences)))
        .collect()
}

/// Pairwise-agreement consensus strength: `1.0` for a single input (nothing
/// to disagree with), otherwise the mean of `1 - |c_i - c_j|` over all
/// pairs.
fn consensus_strength(inputs: &[ConfidenceInput]) -> f64 {
    if inputs.len() < 2 {
        return 1.0;
    }
    let mut agreements = Vec::new();
    for i in 0..inputs.len() {
        for j in (i + 1)..inputs.len() {
            agreements.push(1.0 - (inputs[i].confidence - inputs[j].confidence).abs());
        }
    }
    stats::mean(&agreements)
}

fn weighted_uncertainty(inputs: &[ConfidenceInput]) -> f64 {
    let total_weight: f64 = inputs.iter().map(|i| i.weight).sum();
    if total_weight <= 0.0 {
        return 0.5;
    }
    inputs.iter().map(|i| i.uncertainty * i.weight).sum::<f64>() / total_weight
}

fn reliability_score(inputs: &[ConfidenceInput], reliability_of: impl Fn(&str) -> f64) -> f64 {
    if inputs.is_empty() {
        return 0.0;
    }
    let scores: Vec<f64> = inputs
        .iter()
        .map(|i| {
            let tool_reliability = reliability_of(&i.source_id);
            let execution_reliability = if i.confidence > 0.0 { 1.0 } else { 0.0 };
            let uncertainty_penalty = 1.0 - i.uncertainty;
            tool_reliability * execution_reliability * uncertainty_penalty
        })
        .collect();
    stats::mean(&scores)
}

/// Z-score outlier detection on the confidence distribution (spec.md
/// §4.10 "Z-score > 2.0"). Needs at least 3 points, matching the
/// original's reasoning that a z-score over 2 inputs is meaningless.
fn identify_outliers(inputs: &[ConfidenceInput], outlier_z: f64) -> Vec<String> {
    if inputs.len() < 3 {
        return Vec::new();
    }
    let confidences: Vec<f64> = inputs.iter().map(|i| i.confidence).collect();
    let mean = stats::mean(&confidences);
    let std = stats::stdev(&confidences);
    inputs
        .iter()
        .filter(|i| {
            if std <= 0.0 {
                false
            } else {
                ((i.confidence - mean) / std).abs() > outlier_z
            }
        })
        .map(|i| i.source_id.clone())
        .collect()
}

fn distribution(inputs: &[ConfidenceInput]) -> BTreeMap<String, f64> {
    let confidences: Vec<f64> = inputs.iter().map(|i| i.confidence).collect();
    let mut distribution = BTreeMap::new();
    if confidences.is_empty() {
        return distribution;
    }
    distribution.insert("mean".to_string(), stats::mean(&confidences));
    distribution.insert("median".to_string(), stats::median(&confidences));
    distribution.insert("std".to_string(), stats::stdev(&confidences));
    distribution.insert(
        "min".to_string(),
        confidences.iter().cloned().fold(f64::INFINITY, f64::min),
    );
    distribution.insert(
        "max".to_string(),
        confidences.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    );
    distribution
}

fn neutral_metrics() -> ConfidenceMetrics {
    ConfidenceMetrics {
        overall: 0.5,
        variance: 0.0,
        uncertainty_level: 0.8,
        reliability: 0.3,
        consensus_strength: 0.0,
        per_tool: BTreeMap::new(),
        per_source: BTreeMap::new(),
        outliers: Vec::new(),
        distribution: BTreeMap::new(),
    }
}

pub(crate) fn weighted_average(
    inputs: &[ConfidenceInput],
    config: &AggregationConfig,
    reliability_of: impl Fn(&str) -> f64,
) -> ConfidenceMetrics {
    if inputs.is_empty() {
        return neutral_metrics();
    }

    let mut total_weighted = 0.0;
    let mut total_weight = 0.0;
    for input in inputs {
        let effective_weight = input.weight * (1.0 - input.uncertainty * config.uncertainty_penalty);
        total_weighted += input.confidence * effective_weight;
        total_weight += effective_weight;
    }
    let overall = if total_weight > 0.0 { total_weighted / total_weight } else { 0.0 };

    ConfidenceMetrics {
        overall,
        variance: stats::variance(&inputs.iter().map(|i| i.confidence).collect::<Vec<_>>()),
        uncertainty_level: weighted_uncertainty(inputs),
        reliability: reliability_score(inputs, reliability_of),
        consensus_strength: consensus_strength(inputs),
        per_tool: per_tool(inputs),
        per_source: per_source(inputs),
        outliers: Vec::new(),
        distribution: BTreeMap::new(),
    }
}

pub(crate) fn bayesian_fusion(
    inputs: &[ConfidenceInput],
    reliability_of: impl Fn(&str) -> f64,
) -> ConfidenceMetrics {
    if inputs.is_empty() {
        return neutral_metrics();
    }

    let mut log_odds_sum = 0.0;
    let mut total_weight = 0.0;
    for input in inputs {
        let prob = input.confidence.clamp(0.001, 0.999);
        let log_odds = (prob / (1.0 - prob)).ln();
        let weight = input.weight * (1.0 - input.uncertainty);
        log_odds_sum += log_odds * weight;
        total_weight += weight;
    }
    let overall = if total_weight > 0.0 {
        let avg_log_odds = log_odds_sum / total_weight;
        1.0 / (1.0 + (-avg_log_odds).exp())
    } else {
        0.5
    };

    let max_disagreement = inputs
        .iter()
        .enumerate()
        .flat_map(|(i, a)| inputs[(i + 1)..].iter().map(move |b| (a.confidence - b.confidence).abs()))
        .fold(0.0, f64::max);

    ConfidenceMetrics {
        overall,
        variance: stats::variance(&inputs.iter().map(|i| i.confidence).collect::<Vec<_>>()),
        uncertainty_level: max_disagreement * 0.5,
        reliability: reliability_score(inputs, reliability_of),
        consensus_strength: consensus_strength(inputs),
        per_tool: per_tool(inputs),
        per_source: BTreeMap::new(),
        outliers: Vec::new(),
        distribution: BTreeMap::new(),
    }
}

/// Proximity clustering for consensus detection: each input joins the
/// first existing group whose representative agrees within
/// `1 - consensus_threshold`, else starts a new group of one.
fn consensus_groups<'a>(inputs: &'a [ConfidenceInput], consensus_threshold: f64) -> Vec<Vec<&'a ConfidenceInput>> {
    let mut groups: Vec<Vec<&ConfidenceInput>> = Vec::new();
    for input in inputs {
        let placed = groups.iter_mut().find(|group| {
            (group[0].confidence - input.confidence).abs() <= (1.0 - consensus_threshold)
        });
        match placed {
            Some(group) => group.push(input),
            None => groups.push(vec![input]),
        }
    }
    groups.into_iter().filter(|g| g.len() >= 2).collect()
}

pub(crate) fn minimum_consensus(
    inputs: &[ConfidenceInput],
    config: &AggregationConfig,
    reliability_of: impl Fn(&str) -> f64,
) -> ConfidenceMetrics {
    if inputs.is_empty() {
        return neutral_metrics();
    }

    let confidences: Vec<f64> = inputs.iter().map(|i| i.confidence).collect();
    let groups = consensus_groups(inputs, config.consensus_threshold);

    let (overall, consensus_strength) = if groups.is_empty() {
        let min_confidence = confidences.iter().cloned().fold(f64::INFINITY, f64::min);
        (min_confidence * 0.8, 0.0)
    } else {
        let largest = groups.iter().max_by_key(|g| g.len()).unwrap();
        let group_confidences: Vec<f64> = largest.iter().map(|i| i.confidence).collect();
        (stats::mean(&group_confidences), largest.len() as f64 / inputs.len() as f64)
    };

    ConfidenceMetrics {
        overall,
        variance: stats::variance(&confidences),
        uncertainty_level: 1.0 - consensus_strength,
        reliability: reliability_score(inputs, reliability_of),
        consensus_strength,
        per_tool: per_tool(inputs),
        per_source: BTreeMap::new(),
        outliers: Vec::new(),
        distribution: BTreeMap::new(),
    }
}

pub(crate) fn uncertainty_weighted(
    inputs: &[ConfidenceInput],
    reliability_of: impl Fn(&str) -> f64,
) -> ConfidenceMetrics {
    if inputs.is_empty() {
        return neutral_metrics();
    }

    let mut total_weighted = 0.0;
    let mut total_weight = 0.0;
    for input in inputs {
        let certainty = 1.0 - input.uncertainty;
        let weight = input.weight * certainty * certainty;
        total_weighted += input.confidence * weight;
        total_weight += weight;
    }
    let overall = if total_weight > 0.0 { total_weighted / total_weight } else { 0.0 };

    ConfidenceMetrics {
        overall,
        variance: stats::variance(&inputs.iter().map(|i| i.confidence).collect::<Vec<_>>()),
        uncertainty_level: weighted_uncertainty(inputs),
        reliability: reliability_score(inputs, reliability_of),
        consensus_strength: consensus_strength(inputs),
        per_tool: per_tool(inputs),
        per_source: BTreeMap::new(),
        outliers: Vec::new(),
        distribution: BTreeMap::new(),
    }
}

fn dynamic_weight(input: &ConfidenceInput, context: &DynamicWeightingContext, reliability_of: &impl Fn(&str) -> f64) -> f64 {
    let mut weight = input.weight;

    if input.execution_time > 0.0 {
        let avg_time = context.average_execution_time.unwrap_or(input.execution_time);
        let time_factor = (avg_time / input.execution_time).min(2.0);
        weight *= 1.0 + 0.1 * (time_factor - 1.0);
    }

    if input.data_volume > 0 {
        let avg_volume = context.average_data_volume.unwrap_or(input.data_volume).max(1);
        let volume_factor = (input.data_volume as f64 / avg_volume as f64).min(2.0);
        weight *= 1.0 + 0.2 * (volume_factor - 1.0);
    }

    if context.question_is_complex {
        weight *= reliability_of(&input.source_id);
    }

    weight
}

pub(crate) fn dynamic_weighting(
    inputs: &[ConfidenceInput],
    config: &AggregationConfig,
    context: &DynamicWeightingContext,
    reliability_of: impl Fn(&str) -> f64 + Copy,
) -> ConfidenceMetrics {
    let adjusted: Vec<ConfidenceInput> = inputs
        .iter()
        .map(|input| {
            let mut adjusted = input.clone();
            adjusted.weight = dynamic_weight(input, context, &reliability_of);
            adjusted
        })
        .collect();
    weighted_average(&adjusted, config, reliability_of)
}

pub(crate) fn finish(mut metrics: ConfidenceMetrics, inputs: &[ConfidenceInput], config: &AggregationConfig) -> ConfidenceMetrics {
    if metrics.distribution.is_empty() {
        metrics.distribution = distribution(inputs);
    }
    metrics.outliers = identify_outliers(inputs, config.outlier_z);
    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::ConfidenceSource;

    fn input(id: &str, confidence: f64) -> ConfidenceInput {
        ConfidenceInput::new(id, ConfidenceSource::ToolOutput, confidence)
    }

    #[test]
    fn weighted_average_of_agreeing_inputs_is_close_to_their_mean() {
        let inputs = vec![input("a", 0.8), input("b", 0.82)];
        let metrics = weighted_average(&inputs, &AggregationConfig::default(), |_| 1.0);
        assert!((metrics.overall - 0.81).abs() < 0.02);
    }

    #[test]
    fn bayesian_fusion_stays_in_unit_interval() {
        let inputs = vec![input("a", 0.99), input("b", 0.01)];
        let metrics = bayesian_fusion(&inputs, |_| 1.0);
        assert!(metrics.overall >= 0.0 && metrics.overall <= 1.0);
    }

    #[test]
    fn minimum_consensus_falls_back_to_conservative_estimate_without_agreement() {
        let inputs = vec![input("a", 0.1), input("b", 0.9)];
        let metrics = minimum_consensus(&inputs, &AggregationConfig::default(), |_| 1.0);
        assert_eq!(metrics.consensus_strength, 0.0);
        assert!((metrics.overall - 0.08).abs() < 1e-9);
    }

    #[test]
    fn minimum_consensus_uses_largest_agreeing_group() {
        let inputs = vec![input("a", 0.8), input("b", 0.81), input("c", 0.1)];
        let metrics = minimum_consensus(&inputs, &AggregationConfig::default(), |_| 1.0);
        assert!((metrics.consensus_strength - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn uncertainty_weighted_favors_the_more_certain_input() {
        let mut a = input("a", 0.5);
        a.uncertainty = 0.0;
        let mut b = input("b", 0.9);
        b.uncertainty = 0.8;
        let metrics = uncertainty_weighted(&[a, b], |_| 1.0);
        assert!(metrics.overall < 0.7);
    }

    #[test]
    fn identify_outliers_flags_a_far_off_score() {
        let inputs = vec![input("a", 0.9), input("b", 0.91), input("c", 0.89), input("d", 0.1)];
        let outliers = identify_outliers(&inputs, 2.0);
        assert_eq!(outliers, vec!["d".to_string()]);
    }

    #[test]
    fn identify_outliers_needs_at_least_three_points() {
        let inputs = vec![input("a", 0.9), input("b", 0.1)];
        assert!(identify_outliers(&inputs, 2.0).is_empty());
    }
}
