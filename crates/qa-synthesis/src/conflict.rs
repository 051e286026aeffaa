//! Conflict resolution (spec.md §4.11 bullet 2): "Resolve conflicts per
//! bucket using conflictPolicy ∈ {ConfidenceWeighted, Majority,
//! SourcePriority, ConsensusOnly, AllPerspectives}."
//!
//! Each policy reduces a bucket's [`BucketEntry`] list to one or more
//! [`Resolved`] values. Every policy except `AllPerspectives` produces
//! exactly one `Resolved` per bucket; `AllPerspectives` keeps every
//! distinct contribution as its own `Resolved` so the caller can emit one
//! fragment per perspective.

use std::collections::BTreeMap;

use qa_contracts::ConflictPolicy;

use crate::categorize::BucketEntry;
use crate::priorities;

/// One bucket's conflict-resolved content, ready to become (or seed) a
/// [`qa_contracts::SynthesisFragment`].
#[derive(Debug, Clone)]
pub struct Resolved {
    pub content: String,
    pub confidence: f64,
    pub source_tools: Vec<String>,
    /// Contributions that lost the resolution, kept for
    /// [`qa_contracts::SynthesisResult::alternatives`].
    pub alternatives: Vec<String>,
}

fn group_by_content(entries: &[BucketEntry]) -> Vec<(String, Vec<&BucketEntry>)> {
    let mut groups: BTreeMap<String, Vec<&BucketEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.content.clone()).or_default().push(entry);
    }
    groups.into_iter().collect()
}

fn mean_confidence(members: &[&BucketEntry]) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|e| e.confidence).sum::<f64>() / members.len() as f64
}

/// `confidence = Σ(c·w)/Σ(w)` with `w = c` itself, so entries that are
/// already more confident pull the merged confidence further toward them
/// — the "weighted" half of ConfidenceWeighted, distinct from a plain
/// arithmetic mean.
fn confidence_weighted(entries: &[BucketEntry]) -> Resolved {
    let best = entries
        .iter()
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
        .expect("non-empty bucket");
    let weight_sum: f64 = entries.iter().map(|e| e.confidence).sum();
    let confidence = if weight_sum > 0.0 {
        entries.iter().map(|e| e.confidence * e.confidence).sum::<f64>() / weight_sum
    } else {
        0.0
    };
    Resolved {
        content: best.content.clone(),
        confidence: confidence.clamp(0.0, 1.0),
        source_tools: entries.iter().map(|e| e.tool_id.clone()).collect(),
        alternatives: entries
            .iter()
            .filter(|e| e.content != best.content)
            .map(|e| e.content.clone())
            .collect(),
    }
}

fn majority(entries: &[BucketEntry]) -> Resolved {
    let groups = group_by_content(entries);
    let winner = groups
        .iter()
        .max_by(|a, b| {
            a.1.len()
                .cmp(&b.1.len())
                .then(mean_confidence(&a.1).partial_cmp(&mean_confidence(&b.1)).unwrap())
        })
        .expect("non-empty bucket");
    Resolved {
        content: winner.0.clone(),
        confidence: mean_confidence(&winner.1),
        source_tools: winner.1.iter().map(|e| e.tool_id.clone()).collect(),
        alternatives: groups
            .iter()
            .filter(|(content, _)| content != &winner.0)
            .map(|(content, _)| content.clone())
            .collect(),
    }
}

fn source_priority(entries: &[BucketEntry]) -> Resolved {
    let best = entries
        .iter()
        .max_by(|a, b| {
            priorities::priority_of(&a.tool_id)
                .partial_cmp(&priorities::priority_of(&b.tool_id))
                .unwrap()
        })
        .expect("non-empty bucket");
    Resolved {
        content: best.content.clone(),
        confidence: best.confidence,
        source_tools: vec![best.tool_id.clone()],
        alternatives: entries
            .iter()
            .filter(|e| e.tool_id != best.tool_id)
            .map(|e| e.content.clone())
            .collect(),
    }
}

/// spec.md §4.10 `MinimumConsensus` describes the same shape reused here:
/// cluster by exact-content agreement, pick the largest cluster; if every
/// cluster has size one (no agreement), fall back to the single lowest
/// confidence entry scaled by 0.8 — a conservative answer is safer than a
/// confident-looking one with no corroboration.
fn consensus_only(entries: &[BucketEntry]) -> Resolved {
    let groups = group_by_content(entries);
    if let Some(agreed) = groups.iter().find(|(_, members)| members.len() >= 2) {
        return Resolved {
            content: agreed.0.clone(),
            confidence: mean_confidence(&agreed.1),
            source_tools: agreed.1.iter().map(|e| e.tool_id.clone()).collect(),
            alternatives: groups
                .iter()
                .filter(|(content, _)| content != &agreed.0)
                .map(|(content, _)| content.clone())
                .collect(),
        };
    }
    let weakest = entries
        .iter()
        .min_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
        .expect("non-empty bucket");
    Resolved {
        content: weakest.content.clone(),
        confidence: (weakest.confidence * 0.8).clamp(0.0, 1.0),
        source_tools: vec![weakest.tool_id.clone()],
        alternatives: entries
            .iter()
            .filter(|e| e.tool_id != weakest.tool_id)
            .map(|e| e.content.clone())
            .collect(),
    }
}

fn all_perspectives(entries: &[BucketEntry]) -> Vec<Resolved> {
    entries
        .iter()
        .map(|e| Resolved {
            content: e.content.clone(),
            confidence: e.confidence,
            source_tools: vec![e.tool_id.clone()],
            alternatives: Vec::new(),
        })
        .collect()
}

/// Resolves one bucket's contributions under `policy`. Every policy but
/// `AllPerspectives` returns a single-element vector.
pub fn resolve(entries: &[BucketEntry], policy: ConflictPolicy) -> Vec<Resolved> {
    if entries.is_empty() {
        return Vec::new();
    }
    match policy {
        ConflictPolicy::ConfidenceWeighted => vec![confidence_weighted(entries)],
        ConflictPolicy::Majority => vec![majority(entries)],
        ConflictPolicy::SourcePriority => vec![source_priority(entries)],
        ConflictPolicy::ConsensusOnly => vec![consensus_only(entries)],
        ConflictPolicy::AllPerspectives => all_perspectives(entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tool: &str, content: &str, confidence: f64) -> BucketEntry {
        BucketEntry {
            tool_id: tool.to_string(),
            content: content.to_string(),
            confidence,
        }
    }

    #[test]
    fn confidence_weighted_keeps_the_most_confident_content() {
        let entries = vec![entry("a", "low", 0.3), entry("b", "high", 0.9)];
        let resolved = resolve(&entries, ConflictPolicy::ConfidenceWeighted);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].content, "high");
        assert_eq!(resolved[0].alternatives, vec!["low".to_string()]);
    }

    #[test]
    fn majority_prefers_the_larger_group() {
        let entries = vec![
            entry("a", "x", 0.5),
            entry("b", "x", 0.6),
            entry("c", "y", 0.99),
        ];
        let resolved = resolve(&entries, ConflictPolicy::Majority);
        assert_eq!(resolved[0].content, "x");
        assert_eq!(resolved[0].source_tools.len(), 2);
    }

    #[test]
    fn consensus_only_falls_back_when_nobody_agrees() {
        let entries = vec![entry("a", "x", 0.9), entry("b", "y", 0.2)];
        let resolved = resolve(&entries, ConflictPolicy::ConsensusOnly);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].content, "y");
        assert!((resolved[0].confidence - 0.16).abs() < 1e-9);
    }

    #[test]
    fn all_perspectives_keeps_every_distinct_contribution() {
        let entries = vec![entry("a", "x", 0.5), entry("b", "y", 0.6)];
        let resolved = resolve(&entries, ConflictPolicy::AllPerspectives);
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn source_priority_picks_the_higher_trust_tool() {
        let entries = vec![
            entry(qa_contracts::well_known::LOADER, "chunked text", 0.95),
            entry(qa_contracts::well_known::PAGERANK, "ranked entities", 0.4),
        ];
        let resolved = resolve(&entries, ConflictPolicy::SourcePriority);
        assert_eq!(resolved[0].content, "ranked entities");
    }
}
