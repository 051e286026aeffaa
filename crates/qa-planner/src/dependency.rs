//! The Dependency Analyzer (spec.md §4.5): computes topological levels,
//! independent pairs, and maximal parallel groups directly from tool
//! contracts. No tool-identifier ever appears in a conditional here — every
//! decision is driven by `depends_on` edges and `ToolContract.resource_tags`
//! read through the registry. A unit test below asserts exactly that.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use qa_contracts::{DependencyAnalysis, ToolContract, ToolId, ToolStep};
use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::registry::ToolContractRegistry;

/// True iff contracts `a` and `b` declare a resource conflict: both write
/// (or one exclusively holds) the same logical key. Read/read overlap on
/// the same key is never a conflict.
fn resource_conflict(a: &ToolContract, b: &ToolContract) -> bool {
    let keys: HashSet<&str> = a
        .resource_tags
        .iter()
        .chain(b.resource_tags.iter())
        .map(|tag| match tag {
            qa_contracts::ResourceTag::Reads(k)
            | qa_contracts::ResourceTag::Writes(k)
            | qa_contracts::ResourceTag::Exclusive(k) => k.as_str(),
        })
        .collect();

    for key in keys {
        let a_writes = a.writes(key) || a.exclusive(key);
        let b_writes = b.writes(key) || b.exclusive(key);
        if a_writes && b_writes {
            return true;
        }
        if a.exclusive(key) && (b.reads(key) || b_writes) {
            return true;
        }
        if b.exclusive(key) && (a.reads(key) || a_writes) {
            return true;
        }
    }
    false
}

fn transitive_dependencies(
    tool_id: &ToolId,
    depends_on: &HashMap<ToolId, BTreeSet<ToolId>>,
) -> BTreeSet<ToolId> {
    let mut visited = BTreeSet::new();
    let mut stack: Vec<ToolId> = depends_on
        .get(tool_id)
        .map(|s| s.iter().cloned().collect())
        .unwrap_or_default();
    while let Some(next) = stack.pop() {
        if visited.insert(next.clone()) {
            if let Some(deps) = depends_on.get(&next) {
                stack.extend(deps.iter().cloned());
            }
        }
    }
    visited
}

/// `analyze(steps) → DependencyAnalysis`, spec.md §4.5.
pub fn analyze(
    steps: &[ToolStep],
    registry: &dyn ToolContractRegistry,
) -> Result<DependencyAnalysis, PlannerError> {
    let tool_ids: BTreeSet<ToolId> = steps.iter().map(|s| s.tool_id.clone()).collect();
    let mut depends_on: HashMap<ToolId, BTreeSet<ToolId>> = HashMap::new();
    for step in steps {
        let deps: BTreeSet<ToolId> = step
            .depends_on
            .iter()
            .filter(|d| tool_ids.contains(*d))
            .cloned()
            .collect();
        depends_on.insert(step.tool_id.clone(), deps);
    }

    // Kahn-style leveling.
    let mut remaining = depends_on.clone();
    let mut levels: BTreeMap<ToolId, usize> = BTreeMap::new();
    let mut level = 0usize;
    while !remaining.is_empty() {
        let ready: Vec<ToolId> = remaining
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        if ready.is_empty() {
            let stuck: Vec<ToolId> = remaining.keys().cloned().collect();
            warn!(?stuck, "dependency cycle detected while leveling tool chain");
            return Err(PlannerError::CyclicDependency(stuck));
        }
        for id in &ready {
            levels.insert(id.clone(), level);
            remaining.remove(id);
        }
        for deps in remaining.values_mut() {
            for id in &ready {
                deps.remove(id);
            }
        }
        level += 1;
    }

    // Pairwise independence.
    let ordered: Vec<ToolId> = tool_ids.iter().cloned().collect();
    let mut independent_pairs: BTreeSet<(ToolId, ToolId)> = BTreeSet::new();
    let mut adjacency: HashMap<ToolId, BTreeSet<ToolId>> = HashMap::new();
    for id in &ordered {
        adjacency.insert(id.clone(), BTreeSet::new());
    }

    for i in 0..ordered.len() {
        for j in (i + 1)..ordered.len() {
            let a = &ordered[i];
            let b = &ordered[j];

            if levels.get(a) != levels.get(b) {
                continue;
            }
            let trans_a = transitive_dependencies(a, &depends_on);
            let trans_b = transitive_dependencies(b, &depends_on);
            if trans_a.contains(b) || trans_b.contains(a) {
                continue;
            }
            let contract_a = registry
                .get(a)
                .ok_or_else(|| PlannerError::UnknownTool(a.clone()))?;
            let contract_b = registry
                .get(b)
                .ok_or_else(|| PlannerError::UnknownTool(b.clone()))?;
            if resource_conflict(&contract_a, &contract_b) {
                continue;
            }

            let pair = if a < b {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            independent_pairs.insert(pair);
            adjacency.get_mut(a).unwrap().insert(b.clone());
            adjacency.get_mut(b).unwrap().insert(a.clone());
        }
    }

    // Greedy maximal-clique parallel groups, per level, preferring
    // highest-degree seeds for determinism.
    let mut parallel_groups: Vec<BTreeSet<ToolId>> = Vec::new();
    let mut levels_seen: BTreeSet<usize> = levels.values().cloned().collect();
    for lvl in levels_seen.drain(..) {
        let members: BTreeSet<ToolId> = levels
            .iter()
            .filter(|(_, l)| **l == lvl)
            .map(|(id, _)| id.clone())
            .collect();
        if members.len() < 2 {
            continue;
        }
        let mut unassigned = members.clone();
        while unassigned.len() > 1 {
            let seed = unassigned
                .iter()
                .max_by_key(|id| {
                    adjacency
                        .get(*id)
                        .map(|n| n.intersection(&unassigned).count())
                        .unwrap_or(0)
                })
                .cloned();
            let Some(seed) = seed else { break };
            let mut group = BTreeSet::new();
            group.insert(seed.clone());
            unassigned.remove(&seed);

            let mut candidates: Vec<ToolId> = unassigned
                .iter()
                .filter(|c| adjacency.get(&seed).map_or(false, |n| n.contains(*c)))
                .cloned()
                .collect();
            candidates.sort();
            for candidate in candidates {
                let compatible = group
                    .iter()
                    .all(|m| adjacency.get(m).map_or(false, |n| n.contains(&candidate)));
                if compatible {
                    group.insert(candidate.clone());
                    unassigned.remove(&candidate);
                }
            }

            if group.len() > 1 {
                debug!(?group, level = lvl, "parallel group identified");
                parallel_groups.push(group);
            }
        }
    }

    let can_parallelize = parallel_groups.iter().any(|g| g.len() >= 2);

    Ok(DependencyAnalysis {
        levels,
        independent_pairs,
        parallel_groups,
        can_parallelize,
    })
}

/// Restricts a full-chain [`DependencyAnalysis`] to the subset of tools
/// named in `ready`, for the executor's per-iteration parallel-group query
/// (spec.md §4.9 step 2.c).
pub fn restrict_to(analysis: &DependencyAnalysis, ready: &BTreeSet<ToolId>) -> DependencyAnalysis {
    let parallel_groups: Vec<BTreeSet<ToolId>> = analysis
        .parallel_groups
        .iter()
        .map(|g| g.intersection(ready).cloned().collect::<BTreeSet<_>>())
        .filter(|g: &BTreeSet<ToolId>| g.len() > 1)
        .collect();
    let can_parallelize = parallel_groups.iter().any(|g| g.len() >= 2);
    DependencyAnalysis {
        levels: analysis
            .levels
            .iter()
            .filter(|(id, _)| ready.contains(*id))
            .map(|(id, l)| (id.clone(), *l))
            .collect(),
        independent_pairs: analysis
            .independent_pairs
            .iter()
            .filter(|(a, b)| ready.contains(a) && ready.contains(b))
            .cloned()
            .collect(),
        parallel_groups,
        can_parallelize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_contracts;
    use qa_contracts::well_known as tools;

    fn step(tool_id: &str, deps: &[&str]) -> ToolStep {
        let mut s = ToolStep::new(tool_id);
        s.depends_on = deps.iter().map(|d| d.to_string()).collect();
        s
    }

    #[test]
    fn no_tool_identifier_literal_outside_test_code() {
        // Regression guard for spec.md §9: the analysis logic above must
        // never special-case a specific tool pair by id. The production
        // code (everything before `#[cfg(test)]`) must contain no literal
        // tool-id string such as "T31_ENTITY_BUILDER" or
        // "T34_EDGE_BUILDER" — only `depends_on` edges and resource tags
        // read through the registry may influence parallel-safety.
        let src = include_str!("dependency.rs");
        let production_code = src.split("#[cfg(test)]").next().unwrap_or(src);
        for marker in ["T31_ENTITY_BUILDER", "T34_EDGE_BUILDER", "\"T2", "\"T3", "\"T6"] {
            assert!(
                !production_code.contains(marker),
                "dependency analyzer must not hardcode tool identifier literal {marker}"
            );
        }
    }

    #[test]
    fn independent_reads_of_same_graph_are_parallel() {
        let registry = default_contracts::build();
        let steps = vec![
            step(tools::LOADER, &[]),
            step(tools::CHUNKER, &[tools::LOADER]),
            step(tools::NER, &[tools::CHUNKER]),
            step(tools::ENTITY_BUILDER, &[tools::NER]),
            step(tools::RELATIONSHIP_EXTRACTOR, &[tools::CHUNKER, tools::NER]),
            step(tools::EDGE_BUILDER, &[tools::RELATIONSHIP_EXTRACTOR, tools::ENTITY_BUILDER]),
            step(tools::PAGERANK, &[tools::ENTITY_BUILDER, tools::EDGE_BUILDER]),
            step(tools::CENTRALITY, &[tools::ENTITY_BUILDER, tools::EDGE_BUILDER]),
        ];
        let analysis = analyze(&steps, &registry).unwrap();
        assert!(analysis.can_parallelize);
        assert!(analysis
            .parallel_groups
            .iter()
            .any(|g| g.contains(tools::PAGERANK) && g.contains(tools::CENTRALITY)));
    }

    #[test]
    fn writers_of_same_exclusive_resource_are_not_independent() {
        let registry = default_contracts::build();
        let steps = vec![
            step(tools::LOADER, &[]),
            step(tools::CHUNKER, &[tools::LOADER]),
            step(tools::NER, &[tools::CHUNKER]),
            step(tools::ENTITY_BUILDER, &[tools::NER]),
        ];
        let analysis = analyze(&steps, &registry).unwrap();
        // entity_builder depends transitively on everything above it, so
        // it never appears in a same-level independence pair here; this
        // test exists primarily to document the guard and keep the
        // scenario compiling as the contract catalog evolves.
        assert_eq!(analysis.levels[tools::ENTITY_BUILDER], 3);
    }

    #[test]
    fn cyclic_dependencies_are_rejected() {
        let registry = default_contracts::build();
        let steps = vec![
            step(tools::NER, &[tools::ENTITY_BUILDER]),
            step(tools::ENTITY_BUILDER, &[tools::NER]),
        ];
        let result = analyze(&steps, &registry);
        assert!(matches!(result, Err(PlannerError::CyclicDependency(_))));
    }
}
