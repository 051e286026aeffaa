use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use qa_contracts::{well_known as tools, Intent, IntentResult};
use regex::Regex;

/// Keyword hits score 0.4 each (spec.md §4.1).
const KEYWORD_WEIGHT: f64 = 0.4;
/// Regex-pattern hits score 0.6 each.
const PATTERN_WEIGHT: f64 = 0.6;

struct IntentProfile {
    keywords: &'static [&'static str],
    patterns: &'static [&'static str],
    weight: f64,
    canonical_tools: &'static [&'static str],
}

static PROFILES: Lazy<BTreeMap<Intent, IntentProfile>> = Lazy::new(|| {
    let mut m = BTreeMap::new();
    m.insert(
        Intent::DocumentSummary,
        IntentProfile {
            keywords: &["summary", "summarize", "overview", "gist", "about"],
            patterns: &[r"(?i)what is this (document|text) about"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::SUMMARIZER],
        },
    );
    m.insert(
        Intent::EntityExtraction,
        IntentProfile {
            keywords: &["who", "what", "companies", "people", "organizations", "entities", "mentioned"],
            patterns: &[r"(?i)what (companies|people|organizations) are"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::ENTITY_BUILDER],
        },
    );
    m.insert(
        Intent::RelationshipAnalysis,
        IntentProfile {
            keywords: &["relate", "relationship", "connected", "associated", "linked"],
            patterns: &[r"(?i)how (do|does) .* relate"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::RELATIONSHIP_EXTRACTOR, tools::EDGE_BUILDER],
        },
    );
    m.insert(
        Intent::Theme,
        IntentProfile {
            keywords: &["theme", "topic", "subject", "focus"],
            patterns: &[r"(?i)main (theme|topic)"],
            weight: 1.0,
            canonical_tools: &[tools::THEME_EXTRACTOR],
        },
    );
    m.insert(
        Intent::SpecificSearch,
        IntentProfile {
            keywords: &["find", "search", "locate", "where"],
            patterns: &[r"(?i)find (the|all|any)"],
            weight: 0.9,
            canonical_tools: &[tools::SEARCH_INDEX],
        },
    );
    m.insert(
        Intent::Comparative,
        IntentProfile {
            keywords: &["compare", "versus", "vs", "difference", "better", "rank"],
            patterns: &[r"(?i)\bvs\.?\b", r"(?i)compared to"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::RELATIONSHIP_EXTRACTOR, tools::COMPARATIVE_ANALYZER],
        },
    );
    m.insert(
        Intent::PatternDiscovery,
        IntentProfile {
            keywords: &["pattern", "trend", "recurring", "common"],
            patterns: &[r"(?i)what patterns"],
            weight: 0.9,
            canonical_tools: &[tools::PATTERN_MINER],
        },
    );
    m.insert(
        Intent::Predictive,
        IntentProfile {
            keywords: &["predict", "forecast", "will", "future", "expect"],
            patterns: &[r"(?i)what (will|might) happen"],
            weight: 0.9,
            canonical_tools: &[tools::PREDICTIVE_MODEL],
        },
    );
    m.insert(
        Intent::Causal,
        IntentProfile {
            keywords: &["why", "cause", "because", "reason", "led to"],
            patterns: &[r"(?i)why (did|does|is)"],
            weight: 1.0,
            canonical_tools: &[tools::RELATIONSHIP_EXTRACTOR, tools::CAUSAL_ANALYZER],
        },
    );
    m.insert(
        Intent::Temporal,
        IntentProfile {
            keywords: &["when", "date", "year", "timeline", "history"],
            patterns: &[r"(?i)\b(19|20)\d{2}\b", r"(?i)what happened (in|on)"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::RELATIONSHIP_EXTRACTOR],
        },
    );
    m.insert(
        Intent::Statistical,
        IntentProfile {
            keywords: &["how many", "count", "average", "total", "percentage", "statistics"],
            patterns: &[r"(?i)how many"],
            weight: 1.0,
            canonical_tools: &[tools::STATISTICAL_ANALYZER],
        },
    );
    m.insert(
        Intent::Anomaly,
        IntentProfile {
            keywords: &["unusual", "anomaly", "outlier", "strange", "irregular"],
            patterns: &[r"(?i)anything (unusual|strange)"],
            weight: 0.9,
            canonical_tools: &[tools::ANOMALY_DETECTOR],
        },
    );
    m.insert(
        Intent::Sentiment,
        IntentProfile {
            keywords: &["sentiment", "tone", "feel", "opinion", "positive", "negative"],
            patterns: &[r"(?i)how does .* feel"],
            weight: 0.9,
            canonical_tools: &[tools::SENTIMENT_ANALYZER],
        },
    );
    m.insert(
        Intent::Hierarchical,
        IntentProfile {
            keywords: &["hierarchy", "structure", "organize", "level", "parent", "child"],
            patterns: &[r"(?i)organizational structure"],
            weight: 0.9,
            canonical_tools: &[tools::HIERARCHY_BUILDER],
        },
    );
    m.insert(
        Intent::Network,
        IntentProfile {
            keywords: &["network", "graph", "central", "influential", "hub"],
            patterns: &[r"(?i)most (central|influential|connected)"],
            weight: 1.0,
            canonical_tools: &[tools::NER, tools::ENTITY_BUILDER, tools::EDGE_BUILDER, tools::CENTRALITY, tools::PAGERANK],
        },
    );
    m
});

static COMPILED_PATTERNS: Lazy<BTreeMap<Intent, Vec<Regex>>> = Lazy::new(|| {
    PROFILES
        .iter()
        .map(|(intent, profile)| {
            let compiled = profile
                .patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect();
            (*intent, compiled)
        })
        .collect()
});

const MULTI_PART_MARKERS: [&str; 2] = ["and", ","];

/// `classify(question) → IntentResult`, spec.md §4.1.
pub fn classify(question: &str) -> IntentResult {
    if question.trim().is_empty() {
        return IntentResult::default_for_empty();
    }

    let lower = question.to_lowercase();
    let mut per_intent_score = BTreeMap::new();

    for (intent, profile) in PROFILES.iter() {
        let keyword_hits = profile
            .keywords
            .iter()
            .filter(|kw| lower.contains(*kw))
            .count() as f64;
        let pattern_hits = COMPILED_PATTERNS
            .get(intent)
            .map(|patterns| patterns.iter().filter(|re| re.is_match(question)).count())
            .unwrap_or(0) as f64;
        let raw = keyword_hits * KEYWORD_WEIGHT + pattern_hits * PATTERN_WEIGHT;
        per_intent_score.insert(*intent, raw * profile.weight);
    }

    let total_score: f64 = per_intent_score.values().sum();
    let (primary, primary_score) = per_intent_score
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(intent, score)| (*intent, *score))
        .unwrap_or((Intent::DocumentSummary, 0.0));

    let secondary: Vec<Intent> = per_intent_score
        .iter()
        .filter(|(intent, score)| {
            **intent != primary && **score >= 0.3 && **score >= 0.5 * primary_score
        })
        .map(|(intent, _)| *intent)
        .collect();

    let mut confidence = primary_score.clamp(0.0, 1.0);
    if total_score > 0.0 {
        let share = primary_score / total_score;
        if share >= 0.5 {
            confidence *= 1.2;
        } else if share <= 0.3 {
            confidence *= 0.8;
        }
    }
    let confidence = confidence.clamp(0.0, 1.0);

    let mut recommended_tools: BTreeSet<String> = BTreeSet::new();
    recommended_tools.insert(tools::LOADER.to_string());
    recommended_tools.insert(tools::CHUNKER.to_string());
    if let Some(profile) = PROFILES.get(&primary) {
        recommended_tools.extend(profile.canonical_tools.iter().map(|t| t.to_string()));
    }
    for intent in &secondary {
        if let Some(profile) = PROFILES.get(intent) {
            recommended_tools.extend(profile.canonical_tools.iter().map(|t| t.to_string()));
        }
    }

    let requires_multi_step =
        !secondary.is_empty() || MULTI_PART_MARKERS.iter().any(|m| lower.contains(m));

    IntentResult {
        primary,
        secondary,
        per_intent_score,
        confidence,
        requires_multi_step,
        recommended_tools,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_question_yields_default_intent_and_zero_confidence() {
        let result = classify("");
        assert_eq!(result.primary, Intent::DocumentSummary);
        assert_eq!(result.confidence, 0.0);
        assert!(result.secondary.is_empty());
    }

    #[test]
    fn entity_question_classifies_as_entity_extraction() {
        let result = classify("What companies are mentioned in this document?");
        assert_eq!(result.primary, Intent::EntityExtraction);
        assert!(result.recommended_tools.contains(tools::NER));
        assert!(result.recommended_tools.contains(tools::LOADER));
    }

    #[test]
    fn comparative_question_sets_requires_multi_step_when_secondaries_present() {
        let result = classify("Compare Acme and Globex, and how do they relate?");
        assert!(result.recommended_tools.contains(tools::RELATIONSHIP_EXTRACTOR));
    }

    #[test]
    fn confidence_is_always_within_unit_interval() {
        for q in [
            "What happened in 2023?",
            "Tell me about the stuff in here.",
            "Why did the merger fail and what caused the delay?",
        ] {
            let result = classify(q);
            assert!((0.0..=1.0).contains(&result.confidence));
        }
    }
}
