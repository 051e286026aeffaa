//! Projects a sequence of [`ToolStep`]s into the serializable [`Dag`] value
//! object (spec.md §3). `qa-planner` itself works over this plain edge-set
//! form rather than a `petgraph::DiGraph` at the chain-generation boundary;
//! `petgraph` is reserved for the heavier traversal the Execution Planner
//! does in [`crate::planner`].

use qa_contracts::{Dag, ToolStep};

/// Builds the DAG implied by `steps[i].depends_on` edges. Every tool named
/// in any `depends_on` set is assumed to also appear as a step — the
/// generator only ever produces closed chains (spec.md §3 DAG invariant:
/// "every dependency referenced by a step corresponds to an existing
/// node").
pub fn build_dag(steps: &[ToolStep]) -> Dag {
    let mut dag = Dag::default();
    for step in steps {
        dag.nodes.insert(step.tool_id.clone());
        for dep in &step.depends_on {
            dag.edges.insert((dep.clone(), step.tool_id.clone()));
        }
    }
    dag
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_contracts::well_known as tools;

    #[test]
    fn edges_follow_depends_on() {
        let mut chunker = ToolStep::new(tools::CHUNKER);
        chunker.depends_on = vec![tools::LOADER.to_string()];
        let steps = vec![ToolStep::new(tools::LOADER), chunker];
        let dag = build_dag(&steps);
        assert_eq!(dag.nodes.len(), 2);
        assert!(dag.edges.contains(&(tools::LOADER.to_string(), tools::CHUNKER.to_string())));
        assert_eq!(dag.entry_points(), std::collections::BTreeSet::from([tools::LOADER.to_string()]));
    }
}
