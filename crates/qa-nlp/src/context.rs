use once_cell::sync::Lazy;
use qa_contracts::{AggregationType, ComparisonType, Context, Intent, IntentResult};
use regex::Regex;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").unwrap());
static MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(january|february|march|april|may|june|july|august|september|october|november|december)\b").unwrap()
});
static DATE_RANGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\s*(-|to|through)\s*(19|20)\d{2}\b").unwrap());
static RELATIVE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(today|yesterday|recently|lately|last (week|month|year)|this (week|month|year))\b").unwrap());
static QUOTED_SPAN: Lazy<Regex> = Lazy::new(|| Regex::new("\"([^\"]+)\"|'([^']+)'").unwrap());
static CAPITALIZED_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z][a-zA-Z]*(?:\s+[A-Z][a-zA-Z]*)*)\b").unwrap());
/// Vague referring expressions without a clear antecedent. Checked one at a
/// time rather than as a single alternation so a question stacking several
/// of them (e.g. "the stuff in here") accumulates a penalty per distinct
/// term, mirroring the original's per-pronoun loop.
const VAGUE_REFERENCE_TERMS: [&str; 11] =
    ["it", "this", "that", "these", "those", "they", "them", "stuff", "thing", "things", "here"];
static VAGUE_REFERENCE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    VAGUE_REFERENCE_TERMS
        .iter()
        .map(|term| Regex::new(&format!(r"(?i)\b{term}\b")).unwrap())
        .collect()
});

const QUESTION_WORDS: [&str; 8] = ["What", "Who", "When", "Where", "Why", "How", "Which", "Whose"];
const COMPARISON_MARKERS: [&str; 4] = ["versus", " vs", "compare", "compared to"];
const RANKING_MARKERS: [&str; 3] = ["rank", "top", "best"];
const SIMILARITY_MARKERS: [&str; 2] = ["similar", "alike"];
const AGGREGATION_VERBS: [(&str, AggregationType); 5] = [
    ("count", AggregationType::Count),
    ("total", AggregationType::Sum),
    ("sum", AggregationType::Sum),
    ("average", AggregationType::Average),
    ("rank", AggregationType::Rank),
];
const SCOPE_MODIFIERS: [&str; 5] = ["overall", "in general", "specifically", "only", "across"];
const NEGATION_MARKERS: [&str; 5] = ["not", "no ", "never", "without", "excluding"];
const FILTER_MARKERS: [&str; 4] = ["only", "excluding", "where", "with"];

fn has_entity_demanding_intent(intent: Option<&IntentResult>) -> bool {
    matches!(
        intent.map(|r| r.primary),
        Some(Intent::EntityExtraction) | Some(Intent::RelationshipAnalysis) | Some(Intent::Network)
    )
}

fn is_temporal_intent(intent: Option<&IntentResult>) -> bool {
    matches!(intent.map(|r| r.primary), Some(Intent::Temporal))
}

/// `extract(question) → Context`, spec.md §4.3. `intent_result`, when
/// available from an earlier classifier pass, sharpens the
/// entity-demanding/temporal-intent ambiguity penalties the algorithm
/// describes; passing `None` still produces a fully-formed `Context`.
pub fn extract(question: &str, intent_result: Option<&IntentResult>) -> Context {
    let mut ctx = Context::default();
    let lower = question.to_lowercase();

    let has_year = YEAR.is_match(question);
    let has_month = MONTH.is_match(question);
    let has_range = DATE_RANGE.is_match(question);
    let has_relative = RELATIVE_DATE.is_match(question);
    ctx.has_temporal = has_year || has_month || has_range || has_relative;
    if has_range {
        if let Some(m) = DATE_RANGE.find(question) {
            ctx.temporal_constraints.push(m.as_str().to_string());
        }
    }
    if has_year {
        for m in YEAR.find_iter(question) {
            ctx.temporal_constraints.push(m.as_str().to_string());
        }
    }
    if has_month {
        for m in MONTH.find_iter(question) {
            ctx.temporal_constraints.push(m.as_str().to_string());
        }
    }
    if has_relative {
        for m in RELATIVE_DATE.find_iter(question) {
            ctx.temporal_constraints.push(m.as_str().to_string());
        }
    }

    let mut entities: Vec<String> = Vec::new();
    for cap in CAPITALIZED_SPAN.captures_iter(question) {
        let m = cap.get(1).unwrap();
        let span = m.as_str();
        let first_word = span.split_whitespace().next().unwrap_or("");
        if QUESTION_WORDS.contains(&first_word) {
            continue;
        }
        if span.ends_with("'s") || span.ends_with("\u{2019}s") {
            continue;
        }
        // A single capitalized word at the very start of the question is
        // sentence-initial capitalization, not evidence of a proper noun
        // ("Tell me about..." vs "Acme announced...").
        if m.start() == 0 && !span.contains(' ') {
            continue;
        }
        entities.push(span.to_string());
    }
    for cap in QUOTED_SPAN.captures_iter(question) {
        let span = cap
            .get(1)
            .or_else(|| cap.get(2))
            .map(|m| m.as_str().to_string());
        if let Some(span) = span {
            entities.push(span);
        }
    }
    entities.sort();
    entities.dedup();
    ctx.mentioned_entities = entities;

    ctx.requires_comparison = COMPARISON_MARKERS.iter().any(|m| lower.contains(m));
    if ctx.requires_comparison {
        ctx.comparison_type = if RANKING_MARKERS.iter().any(|m| lower.contains(m)) {
            Some(ComparisonType::Ranking)
        } else if SIMILARITY_MARKERS.iter().any(|m| lower.contains(m)) {
            Some(ComparisonType::Similarity)
        } else {
            Some(ComparisonType::Versus)
        };
        ctx.comparison_entities = ctx.mentioned_entities.clone();
        ctx.comparison_count = ctx.comparison_entities.len();
    }

    for (verb, kind) in AGGREGATION_VERBS {
        if lower.contains(verb) {
            ctx.requires_aggregation = true;
            ctx.aggregation_type = Some(kind);
            break;
        }
    }
    if ctx.requires_aggregation {
        ctx.aggregation_scope = ctx.mentioned_entities.first().cloned();
    }

    ctx.scope_modifiers = SCOPE_MODIFIERS
        .iter()
        .filter(|m| lower.contains(*m))
        .map(|m| m.to_string())
        .collect();

    ctx.filter_conditions = FILTER_MARKERS
        .iter()
        .filter(|m| lower.contains(*m))
        .map(|m| m.to_string())
        .collect();
    ctx.has_filters = !ctx.filter_conditions.is_empty();

    ctx.has_negation = NEGATION_MARKERS.iter().any(|m| lower.contains(m));

    let mut ambiguity = 0.0;
    if ctx.mentioned_entities.is_empty() {
        let vague_hits = VAGUE_REFERENCE_PATTERNS
            .iter()
            .filter(|re| re.is_match(question))
            .count();
        if vague_hits > 0 {
            ambiguity += 0.2 * vague_hits as f64;
            ctx.missing_context.push("vague-pronoun-without-antecedent".to_string());
        }
        if !lower.contains("document") {
            ambiguity += 0.3;
            ctx.missing_context.push("no-specific-entities-mentioned".to_string());
        }
    }
    if has_entity_demanding_intent(intent_result) && ctx.mentioned_entities.is_empty() {
        ambiguity += 0.3;
        ctx.missing_context.push("no-entities-for-entity-demanding-intent".to_string());
    }
    if is_temporal_intent(intent_result) && !ctx.has_temporal {
        ambiguity += 0.2;
        ctx.missing_context.push("temporal-intent-without-concrete-date".to_string());
    }
    if ctx.requires_comparison && ctx.comparison_count < 2 {
        ambiguity += 0.2;
        ctx.missing_context.push("comparison-with-fewer-than-two-targets".to_string());
    }
    ctx.set_ambiguity(ambiguity);

    ctx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temporal_question_sets_has_temporal_and_constraint() {
        let ctx = extract("What happened in 2023?", None);
        assert!(ctx.has_temporal);
        assert!(ctx.temporal_constraints.iter().any(|c| c == "2023"));
    }

    #[test]
    fn quoted_spans_become_entities() {
        let ctx = extract("What does \"Project Chimera\" refer to?", None);
        assert!(ctx.mentioned_entities.iter().any(|e| e == "Project Chimera"));
    }

    #[test]
    fn vague_question_accumulates_ambiguity_and_missing_context() {
        let ctx = extract("Tell me about the stuff in here.", None);
        assert!(ctx.ambiguity > 0.5);
        assert!(!ctx.missing_context.is_empty());
    }

    #[test]
    fn sentence_initial_capitalization_is_not_treated_as_an_entity() {
        let ctx = extract("Tell me about the stuff in here.", None);
        assert!(ctx.mentioned_entities.is_empty());
    }

    #[test]
    fn comparison_with_one_target_is_penalized() {
        let ctx = extract("How does Acme compare?", None);
        assert!(ctx.requires_comparison);
        assert!(ctx.ambiguity > 0.0);
    }
}
