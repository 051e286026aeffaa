//! The Response Synthesizer (spec.md §4.11, component C13):
//! `synthesize(executionResults, question, strategy, conflictPolicy) →
//! SynthesisResult`.
//!
//! Takes the [`qa_contracts::ExecutionContext`] the Dynamic Executor
//! produced for one run (rather than `qa-executor`'s `RunOutcome`
//! directly, so this crate has no dependency on the executor crate — it
//! only needs the per-tool outcomes, which `ExecutionContext` already
//! carries) and turns it into fragments, a composed response, quality
//! metrics, and caveats.

use std::collections::BTreeMap;

use qa_contracts::{
    ConflictPolicy, Context, ExecutionContext, FragmentType, QualityMetrics, SynthesisFragment,
    SynthesisResult, SynthesisStrategy, ToolOutcome,
};
use tracing::info;

use crate::categorize::{self, BucketEntry};
use crate::conflict;
use crate::strategy;

/// `synthesize(executionResults, question, strategy, conflictPolicy) →
/// SynthesisResult`, spec.md §4.11.
pub fn synthesize(
    execution: &ExecutionContext,
    question: &str,
    context: &Context,
    strategy_choice: SynthesisStrategy,
    conflict_policy: ConflictPolicy,
) -> SynthesisResult {
    let buckets = collect_buckets(execution);
    let mut fragments = Vec::new();
    let mut all_alternatives: Vec<String> = Vec::new();
    let mut bucket_spreads: Vec<f64> = Vec::new();

    for (bucket, entries) in &buckets {
        if entries.is_empty() {
            continue;
        }
        let spread = entries
            .iter()
            .map(|e| e.confidence)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c), hi.max(c))
            });
        if entries.len() > 1 {
            bucket_spreads.push(spread.1 - spread.0);
        }

        for resolved in conflict::resolve(entries, conflict_policy) {
            all_alternatives.extend(resolved.alternatives.iter().cloned());
            fragments.push(SynthesisFragment {
                content: resolved.content,
                source_tools: resolved.source_tools,
                confidence: resolved.confidence,
                fragment_type: *bucket,
                supporting_evidence: resolved.alternatives,
            });
        }
    }

    fragments.push(build_answer_fragment(&fragments, question, context));

    let quality_metrics = compute_quality_metrics(execution, &fragments);
    let tool_coverage = compute_tool_coverage(&buckets);
    let primary_response = strategy::compose(strategy_choice, &fragments);
    let caveats = build_caveats(execution, &fragments, quality_metrics.overall_confidence, &bucket_spreads);

    all_alternatives.sort();
    all_alternatives.dedup();

    info!(
        fragments = fragments.len(),
        overall_confidence = quality_metrics.overall_confidence,
        caveats = caveats.len(),
        "synthesized response"
    );

    SynthesisResult {
        primary_response,
        fragments,
        overall_confidence: quality_metrics.overall_confidence,
        strategy: strategy_choice,
        tool_coverage,
        quality_metrics,
        alternatives: all_alternatives,
        caveats,
    }
}

/// spec.md §7: "Internal failures surface as [...] a synthesis result with
/// no fragments and a fatal caveat" for `UnknownTool`/`CyclicDependency`/
/// `ContractConflict` — failures that never reach the executor at all.
pub fn fatal(reason: impl Into<String>) -> SynthesisResult {
    SynthesisResult {
        primary_response: "Insufficient information to answer this question.".to_string(),
        fragments: Vec::new(),
        overall_confidence: 0.0,
        strategy: SynthesisStrategy::default(),
        tool_coverage: BTreeMap::new(),
        quality_metrics: QualityMetrics {
            overall_confidence: 0.0,
            coverage: 0.0,
            coherence: 0.0,
        },
        alternatives: Vec::new(),
        caveats: vec![format!("fatal: {}", reason.into())],
    }
}

fn collect_buckets(execution: &ExecutionContext) -> BTreeMap<FragmentType, Vec<BucketEntry>> {
    let mut buckets: BTreeMap<FragmentType, Vec<BucketEntry>> = BTreeMap::new();
    for (tool_id, outcome) in &execution.intermediate_results {
        let ToolOutcome::Success { data, confidence, .. } = outcome else {
            continue;
        };
        for (output_key, value) in data {
            let Some(bucket) = categorize::bucket_of(output_key) else {
                continue;
            };
            let rendered = categorize::render_value(value);
            if rendered.is_empty() {
                continue;
            }
            buckets.entry(bucket).or_default().push(BucketEntry {
                tool_id: tool_id.clone(),
                content: rendered,
                confidence: *confidence,
            });
        }
    }
    buckets
}

/// Synthesizes the terminal `Answer` fragment (spec.md §3
/// `FragmentType::Answer`): prefers an existing `Summary` fragment's
/// content, otherwise concatenates the highest-confidence handful of
/// fragments so there is always something to show, and finally falls back
/// to an explicit "insufficient information" admission matching the
/// ambiguity the Context Extractor already flagged.
fn build_answer_fragment(fragments: &[SynthesisFragment], question: &str, context: &Context) -> SynthesisFragment {
    if let Some(summary) = fragments.iter().find(|f| f.fragment_type == FragmentType::Summary) {
        return SynthesisFragment {
            content: summary.content.clone(),
            source_tools: summary.source_tools.clone(),
            confidence: summary.confidence,
            fragment_type: FragmentType::Answer,
            supporting_evidence: vec![],
        };
    }

    let mut ranked: Vec<&SynthesisFragment> = fragments.iter().collect();
    ranked.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());
    let top: Vec<&SynthesisFragment> = ranked.into_iter().take(3).collect();

    if top.is_empty() {
        let mut content = format!("No analysis could be completed for: \"{question}\".");
        if context.ambiguity > 0.5 {
            content.push_str(" The question is ambiguous and may need more specific terms.");
        }
        return SynthesisFragment {
            content,
            source_tools: vec![],
            confidence: 0.0,
            fragment_type: FragmentType::Answer,
            supporting_evidence: vec![],
        };
    }

    let content = top.iter().map(|f| f.content.as_str()).collect::<Vec<_>>().join("; ");
    let confidence = top.iter().map(|f| f.confidence).sum::<f64>() / top.len() as f64;
    let source_tools: Vec<String> = top.iter().flat_map(|f| f.source_tools.clone()).collect();
    SynthesisFragment {
        content,
        source_tools,
        confidence,
        fragment_type: FragmentType::Answer,
        supporting_evidence: vec![],
    }
}

/// spec.md §4.11 "Quality metrics": overallConfidence is a source-weighted
/// mean (fragments backed by more corroborating tools count more),
/// coverage is the fraction of successful tools represented in at least
/// one fragment, coherence is fragment-type diversity relative to the
/// nine possible types.
fn compute_quality_metrics(execution: &ExecutionContext, fragments: &[SynthesisFragment]) -> QualityMetrics {
    let contentful: Vec<&SynthesisFragment> =
        fragments.iter().filter(|f| f.fragment_type != FragmentType::Answer).collect();

    let overall_confidence = if contentful.is_empty() {
        fragments.first().map(|f| f.confidence).unwrap_or(0.0)
    } else {
        let weight_sum: f64 = contentful.iter().map(|f| f.source_tools.len().max(1) as f64).sum();
        contentful
            .iter()
            .map(|f| f.confidence * f.source_tools.len().max(1) as f64)
            .sum::<f64>()
            / weight_sum
    };

    let successful_tools: std::collections::BTreeSet<&String> = execution
        .intermediate_results
        .iter()
        .filter(|(_, outcome)| outcome.is_success())
        .map(|(tool_id, _)| tool_id)
        .collect();
    let represented: std::collections::BTreeSet<&String> = fragments
        .iter()
        .flat_map(|f| f.source_tools.iter())
        .collect();
    let coverage = if successful_tools.is_empty() {
        0.0
    } else {
        successful_tools.intersection(&represented).count() as f64 / successful_tools.len() as f64
    };

    let distinct_types: std::collections::BTreeSet<u8> =
        fragments.iter().map(|f| f.fragment_type as u8).collect();
    let coherence = (distinct_types.len() as f64 / 9.0).clamp(0.0, 1.0);

    QualityMetrics {
        overall_confidence: overall_confidence.clamp(0.0, 1.0),
        coverage: coverage.clamp(0.0, 1.0),
        coherence,
    }
}

fn compute_tool_coverage(buckets: &BTreeMap<FragmentType, Vec<BucketEntry>>) -> BTreeMap<String, f64> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for entries in buckets.values() {
        for entry in entries {
            *counts.entry(entry.tool_id.clone()).or_insert(0) += 1;
            total += 1;
        }
    }
    if total == 0 {
        return BTreeMap::new();
    }
    counts
        .into_iter()
        .map(|(tool_id, count)| (tool_id, count as f64 / total as f64))
        .collect()
}

/// spec.md §4.11 caveat triggers, plus spec.md §7's requirement that a
/// partial/degraded run's caveats enumerate the failure kinds and affected
/// tools.
fn build_caveats(
    execution: &ExecutionContext,
    fragments: &[SynthesisFragment],
    overall_confidence: f64,
    bucket_spreads: &[f64],
) -> Vec<String> {
    let mut caveats = Vec::new();

    if overall_confidence < 0.6 {
        caveats.push(format!("overall confidence is low ({overall_confidence:.2})"));
    }

    let contentful: Vec<&SynthesisFragment> =
        fragments.iter().filter(|f| f.fragment_type != FragmentType::Answer).collect();
    if !contentful.is_empty() {
        let single_source = contentful.iter().filter(|f| f.source_tools.len() <= 1).count();
        if single_source as f64 / contentful.len() as f64 > 0.5 {
            caveats.push("more than half the findings come from a single source each".to_string());
        }
    }

    if bucket_spreads.iter().any(|&spread| spread > 0.2) {
        caveats.push("sources disagreed noticeably on confidence within at least one category".to_string());
    }

    let failed: Vec<&str> = execution
        .intermediate_results
        .iter()
        .filter_map(|(tool_id, outcome)| match outcome {
            ToolOutcome::Error { .. } => Some(tool_id.as_str()),
            _ => None,
        })
        .collect();
    if !failed.is_empty() {
        caveats.push(format!("tool failures: {}", failed.join(", ")));
    }

    if !execution.skipped.is_empty() {
        let skipped: Vec<&str> = execution.skipped.iter().map(|s| s.as_str()).collect();
        caveats.push(format!("skipped due to insufficient upstream data or failure: {}", skipped.join(", ")));
    }

    caveats
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::well_known as tools;
    use std::collections::BTreeMap as Map;

    fn success(data: Map<String, serde_json::Value>) -> ToolOutcome {
        ToolOutcome::Success {
            data,
            duration: 0.1,
            confidence: 0.85,
            uncertainty: 0.1,
            data_volume: 1,
        }
    }

    #[test]
    fn entity_extraction_produces_entity_fragments_with_healthy_confidence() {
        let mut execution = ExecutionContext::new();
        let mut data = Map::new();
        data.insert("entities".to_string(), serde_json::json!(["Acme", "Globex"]));
        execution.intermediate_results.insert(tools::NER.to_string(), success(data));

        let result = synthesize(
            &execution,
            "What companies are mentioned in this document?",
            &Context::default(),
            SynthesisStrategy::Comprehensive,
            ConflictPolicy::ConfidenceWeighted,
        );

        assert!(result.fragments.iter().any(|f| f.fragment_type == FragmentType::Entity));
        assert!(result.overall_confidence >= 0.7);
    }

    #[test]
    fn skip_caveats_mention_the_skipped_tool() {
        let mut execution = ExecutionContext::new();
        execution.skipped.insert(tools::RELATIONSHIP_EXTRACTOR.to_string());
        let result = synthesize(
            &execution,
            "How do the companies relate?",
            &Context::default(),
            SynthesisStrategy::Comprehensive,
            ConflictPolicy::ConfidenceWeighted,
        );
        assert!(result.caveats.iter().any(|c| c.contains(tools::RELATIONSHIP_EXTRACTOR)));
        assert!(!result.fragments.iter().any(|f| f.fragment_type == FragmentType::Relationship));
    }

    #[test]
    fn fatal_result_has_no_fragments_and_a_fatal_caveat() {
        let result = fatal("cyclic dependency detected");
        assert!(result.fragments.is_empty());
        assert!(result.caveats[0].starts_with("fatal:"));
    }

    #[test]
    fn upstream_failure_is_reflected_in_caveats_and_confidence() {
        let mut execution = ExecutionContext::new();
        execution.intermediate_results.insert(
            tools::NER.to_string(),
            ToolOutcome::Error { reason: "adapter timed out".to_string(), duration: 0.1 },
        );
        execution.skipped.insert(tools::RELATIONSHIP_EXTRACTOR.to_string());
        execution.skipped.insert(tools::ENTITY_BUILDER.to_string());

        let result = synthesize(
            &execution,
            "How do the companies relate?",
            &Context::default(),
            SynthesisStrategy::Comprehensive,
            ConflictPolicy::ConfidenceWeighted,
        );

        assert!(result.overall_confidence <= 0.4);
        assert!(result.caveats.iter().any(|c| c.contains("tool failures")));
    }
}
