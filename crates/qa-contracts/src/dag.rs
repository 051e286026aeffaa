use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::tool::ToolId;

/// The acyclic dependency graph of tool steps for one run (spec.md §3).
///
/// This is the serializable, value-object view of the graph; `qa-planner`
/// builds and manipulates a `petgraph::DiGraph` internally and projects it
/// into this shape at component boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag {
    pub nodes: BTreeSet<ToolId>,
    pub edges: BTreeSet<(ToolId, ToolId)>,
}

impl Dag {
    pub fn entry_points(&self) -> BTreeSet<ToolId> {
        let has_incoming: BTreeSet<&ToolId> = self.edges.iter().map(|(_, to)| to).collect();
        self.nodes
            .iter()
            .filter(|n| !has_incoming.contains(n))
            .cloned()
            .collect()
    }

    pub fn exit_points(&self) -> BTreeSet<ToolId> {
        let has_outgoing: BTreeSet<&ToolId> = self.edges.iter().map(|(from, _)| from).collect();
        self.nodes
            .iter()
            .filter(|n| !has_outgoing.contains(n))
            .cloned()
            .collect()
    }
}

/// Output of the Dependency Analyzer (spec.md §4.5): per-tool topological
/// level, the independence graph, and the derived parallel groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub levels: BTreeMap<ToolId, usize>,
    pub independent_pairs: BTreeSet<(ToolId, ToolId)>,
    pub parallel_groups: Vec<BTreeSet<ToolId>>,
    pub can_parallelize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_and_exit_points_ignore_internal_nodes() {
        let mut dag = Dag::default();
        dag.nodes.extend(["a".to_string(), "b".to_string(), "c".to_string()]);
        dag.edges.insert(("a".to_string(), "b".to_string()));
        dag.edges.insert(("b".to_string(), "c".to_string()));
        assert_eq!(dag.entry_points(), BTreeSet::from(["a".to_string()]));
        assert_eq!(dag.exit_points(), BTreeSet::from(["c".to_string()]));
    }
}
