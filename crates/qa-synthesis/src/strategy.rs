//! Strategy-driven composition (spec.md §4.11 bullet 4): "Compose a
//! structured primaryResponse selected by strategy [...], each specifying
//! which sections to include and in what order."
//!
//! Rendering fragment content to flowing prose is the presentation
//! concern spec.md §1 excludes ("response-text templates"); `compose`
//! produces a structured, labeled concatenation of the sections a
//! strategy selects — not a templated narrative.

use qa_contracts::{FragmentType, SynthesisFragment, SynthesisStrategy};

/// The ordered sections a strategy includes. A fragment type absent from
/// the list is omitted from `primaryResponse` entirely (it still appears
/// in `SynthesisResult::fragments`, which always carries everything that
/// survived conflict resolution).
pub fn section_order(strategy: SynthesisStrategy) -> &'static [FragmentType] {
    use FragmentType::*;
    match strategy {
        SynthesisStrategy::Comprehensive => &[
            Summary, Entity, Relationship, Theme, Metric, Finding, Comparison, Evidence, Answer,
        ],
        SynthesisStrategy::Focused => &[Answer, Summary],
        SynthesisStrategy::Comparative => &[Comparison, Entity, Metric, Answer],
        SynthesisStrategy::Narrative => &[Summary, Theme, Entity, Relationship, Answer],
        SynthesisStrategy::Analytical => &[Metric, Finding, Relationship, Answer],
        SynthesisStrategy::Summary => &[Summary, Answer],
    }
}

fn label(kind: FragmentType) -> &'static str {
    match kind {
        FragmentType::Entity => "Entities",
        FragmentType::Relationship => "Relationships",
        FragmentType::Theme => "Themes",
        FragmentType::Metric => "Metrics",
        FragmentType::Summary => "Summary",
        FragmentType::Finding => "Findings",
        FragmentType::Evidence => "Evidence",
        FragmentType::Comparison => "Comparison",
        FragmentType::Answer => "Answer",
    }
}

/// Concatenates the fragments belonging to each section a strategy selects,
/// in strategy order, skipping sections with nothing to show.
pub fn compose(strategy: SynthesisStrategy, fragments: &[SynthesisFragment]) -> String {
    let mut sections = Vec::new();
    for &kind in section_order(strategy) {
        let matching: Vec<&str> = fragments
            .iter()
            .filter(|f| f.fragment_type == kind)
            .map(|f| f.content.as_str())
            .collect();
        if matching.is_empty() {
            continue;
        }
        sections.push(format!("{}: {}", label(kind), matching.join(" | ")));
    }
    if sections.is_empty() {
        "Insufficient information to answer this question.".to_string()
    } else {
        sections.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(kind: FragmentType, content: &str) -> SynthesisFragment {
        SynthesisFragment {
            content: content.to_string(),
            source_tools: vec!["tool".to_string()],
            confidence: 0.8,
            fragment_type: kind,
            supporting_evidence: vec![],
        }
    }

    #[test]
    fn empty_fragments_yield_the_insufficient_information_placeholder() {
        assert_eq!(
            compose(SynthesisStrategy::Comprehensive, &[]),
            "Insufficient information to answer this question."
        );
    }

    #[test]
    fn focused_strategy_omits_sections_outside_its_order() {
        let fragments = vec![
            fragment(FragmentType::Entity, "Acme"),
            fragment(FragmentType::Answer, "Acme is mentioned."),
        ];
        let composed = compose(SynthesisStrategy::Focused, &fragments);
        assert!(composed.contains("Answer"));
        assert!(!composed.contains("Entities"));
    }

    #[test]
    fn comprehensive_strategy_includes_every_populated_section_in_order() {
        let fragments = vec![
            fragment(FragmentType::Answer, "done"),
            fragment(FragmentType::Entity, "Acme"),
        ];
        let composed = compose(SynthesisStrategy::Comprehensive, &fragments);
        let entity_pos = composed.find("Entities").unwrap();
        let answer_pos = composed.find("Answer").unwrap();
        assert!(entity_pos < answer_pos);
    }
}
