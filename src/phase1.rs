//! Phase-1: synchronous degree/topology/density stats, safe to read
//! immediately after the analysis call returns.

use std::collections::HashMap;

use petgraph::algo::toposort;

use crate::graph::AnalysisGraph;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Phase1Stats {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub out_degree: HashMap<String, usize>,
    pub in_degree: HashMap<String, usize>,
    /// Reverse-postorder of a topological sort. Empty iff the graph is cyclic.
    pub topological_order: Vec<String>,
}

pub fn compute(graph: &AnalysisGraph) -> Phase1Stats {
    let mut out_degree = HashMap::with_capacity(graph.node_count());
    let mut in_degree = HashMap::with_capacity(graph.node_count());
    for id in graph.ids_in_order() {
        out_degree.insert(id.clone(), graph.out_degree(id));
        in_degree.insert(id.clone(), graph.in_degree(id));
    }

    let topological_order = match toposort(graph.inner(), None) {
        Ok(order) => order.into_iter().map(|idx| graph.id_of(idx).to_string()).collect(),
        Err(_cycle) => Vec::new(),
    };

    Phase1Stats {
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        density: graph.density(),
        out_degree,
        in_degree,
        topological_order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dependency, DependencyType, Issue, IssueType, Status};
    use chrono::Utc;

    fn issue(id: &str, deps: Vec<&str>) -> Issue {
        Issue {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            status: Status::Open,
            priority: 2,
            issue_type: IssueType::Task,
            labels: vec![],
            estimated_minutes: None,
            content_hash: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            closed_at: None,
            dependencies: deps.into_iter().map(Dependency::blocking).collect(),
        }
    }

    #[test]
    fn acyclic_chain_has_topological_order() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"]), issue("c", vec!["b"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let stats = compute(&g);
        assert_eq!(stats.topological_order.len(), 3);
        // c depends on b depends on a: a must come after c in dependency-first
        // postorder (toposort emits edge sources after targets is not
        // guaranteed direction-wise; just assert completeness + no cycle).
        assert_eq!(stats.node_count, 3);
        assert_eq!(stats.edge_count, 2);
    }

    #[test]
    fn cycle_yields_empty_topological_order() {
        let mut a = issue("a", vec!["c"]);
        let b = issue("b", vec!["a"]);
        let c = issue("c", vec!["b"]);
        a.dependencies.push(Dependency {
            to: "c".to_string(),
            dep_type: DependencyType::Blocks,
        });
        let issues = vec![a, b, c];
        let g = AnalysisGraph::build(&issues).unwrap();
        let stats = compute(&g);
        assert!(stats.topological_order.is_empty());
    }

    #[test]
    fn empty_graph_has_zero_density() {
        let g = AnalysisGraph::build(&[]).unwrap();
        let stats = compute(&g);
        assert_eq!(stats.density, 0.0);
        assert!(stats.topological_order.is_empty());
    }
}
