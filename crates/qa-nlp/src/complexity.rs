use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use qa_contracts::{ComplexityLevel, ComplexityResult, IntentResult};
use regex::Regex;

const COMPARISON_MARKERS: [&str; 5] = ["compare", "versus", "vs", "better", "than"];
const AGGREGATION_VERBS: [&str; 6] = ["count", "sum", "total", "average", "group", "rank"];
const TEMPORAL_MARKERS: [&str; 4] = ["when", "year", "date", "history"];
const INFERENCE_MARKERS: [&str; 5] = ["why", "because", "therefore", "if", "cause"];
const ANALYSIS_VERBS: [&str; 7] = [
    "compare", "find", "analyze", "extract", "summarize", "rank", "predict",
];

static CAPITALIZED_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z]+\b").unwrap());
static CLAUSE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r",|\bwhich\b|\bthat\b|\bwho\b").unwrap());

fn factor(weight_hits: usize, cap: usize) -> f64 {
    if cap == 0 {
        return 0.0;
    }
    (weight_hits as f64 / cap as f64).clamp(0.0, 1.0)
}

/// `analyze(question, intentResult?) → ComplexityResult`, spec.md §4.2.
pub fn analyze(question: &str, intent_result: Option<&IntentResult>) -> ComplexityResult {
    let lower = question.to_lowercase();
    let word_count = question.split_whitespace().count();

    let mut factors = BTreeMap::new();
    factors.insert("word_count".to_string(), factor(word_count, 25));

    let entity_hits = CAPITALIZED_WORD.find_iter(question).count();
    factors.insert("entity_mentions".to_string(), factor(entity_hits, 5));

    let multi_part_hits = lower.matches(" and ").count() + lower.matches(',').count();
    factors.insert("multi_part".to_string(), factor(multi_part_hits, 3));

    let comparison_hits = COMPARISON_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    factors.insert("comparison".to_string(), factor(comparison_hits, 2));

    let aggregation_hits = AGGREGATION_VERBS.iter().filter(|m| lower.contains(*m)).count();
    factors.insert("aggregation".to_string(), factor(aggregation_hits, 2));

    let temporal_hits = TEMPORAL_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    factors.insert("temporal".to_string(), factor(temporal_hits, 2));

    let inference_hits = INFERENCE_MARKERS.iter().filter(|m| lower.contains(*m)).count();
    factors.insert("inference".to_string(), factor(inference_hits, 2));

    let nested_clauses = CLAUSE_SPLIT.find_iter(question).count();
    factors.insert("nested_clauses".to_string(), factor(nested_clauses, 3));

    let score: f64 = factors.values().sum::<f64>() / factors.len() as f64;
    let level = if score < 0.3 {
        ComplexityLevel::Simple
    } else if score < 0.7 {
        ComplexityLevel::Moderate
    } else {
        ComplexityLevel::Complex
    };

    let mut estimated_tools = 3;
    if entity_hits > 0 {
        estimated_tools += 1;
    }
    if comparison_hits > 0 {
        estimated_tools += 1;
    }
    if aggregation_hits > 0 {
        estimated_tools += 1;
    }
    if inference_hits > 0 {
        estimated_tools += 1;
    }
    if temporal_hits > 0 {
        estimated_tools += 1;
    }
    if multi_part_hits > 0 {
        estimated_tools += 1;
    }
    if let Some(intent_result) = intent_result {
        estimated_tools = estimated_tools.max(intent_result.recommended_tools.len());
    }

    let independent_clauses = lower.matches(" and ").count() + 1;
    let distinct_analysis_verbs = ANALYSIS_VERBS.iter().filter(|v| lower.contains(*v)).count();
    let parallelizable_components = independent_clauses.saturating_sub(1) + distinct_analysis_verbs;

    let (estimated_time, estimated_memory, strategy_hint) = match level {
        ComplexityLevel::Simple => (2.0, 128.0, "sequential"),
        ComplexityLevel::Moderate => (5.0, 256.0, "balanced"),
        ComplexityLevel::Complex => (12.0, 512.0, "parallel-heavy"),
    };

    ComplexityResult {
        level,
        estimated_tools,
        parallelizable_components,
        estimated_time,
        estimated_memory,
        execution_strategy_hint: strategy_hint.to_string(),
        factors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_plain_question_is_simple() {
        let result = analyze("What companies are mentioned?", None);
        assert!(matches!(result.level, ComplexityLevel::Simple | ComplexityLevel::Moderate));
    }

    #[test]
    fn intent_recommended_tools_can_raise_estimated_tools() {
        let intent_result = qa_contracts::IntentResult {
            primary: qa_contracts::Intent::Network,
            secondary: vec![],
            per_intent_score: BTreeMap::new(),
            confidence: 0.9,
            requires_multi_step: false,
            recommended_tools: (0..10).map(|i| format!("T{i}")).collect(),
        };
        let result = analyze("Who is central in this network?", Some(&intent_result));
        assert_eq!(result.estimated_tools, 10);
    }

    #[test]
    fn comparison_and_aggregation_push_toward_higher_complexity() {
        let result = analyze(
            "Compare the total revenue of Acme versus Globex, and rank them by growth.",
            None,
        );
        assert!(result.factors["comparison"] > 0.0);
        assert!(result.factors["aggregation"] > 0.0);
    }
}
