//! Eigenvector centrality via deterministic power iteration on the transpose
//! (incoming-neighbor) adjacency.

use std::collections::HashMap;

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

pub const ITERATIONS: usize = 50;

/// Power iteration on the transpose graph: `x_{t+1}(v) = sum(x_t(u) for u ->
/// v)`, L2-normalized after every step. Neighbor lists are always consumed
/// in sorted-id order so the result is bit-exact across runs.
pub fn eigenvector(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<HashMap<String, f64>> {
    let ids = graph.ids_sorted();
    let n = ids.len();
    if n == 0 {
        return Some(HashMap::new());
    }

    let mut x: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 1.0 / (n as f64).sqrt())).collect();

    for _ in 0..ITERATIONS {
        if cancel.is_cancelled() {
            return None;
        }
        let mut next: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
        for v in &ids {
            // incoming neighbors of v: issues that v blocks on point to v? no:
            // edge u -> w means u depends on w (w blocks u). "incoming" to w in
            // transpose sense for eigenvector is the set of dependents of w.
            let dependents = graph.dependents_of(v);
            let sum: f64 = dependents.iter().map(|u| x[u]).sum();
            next.insert(v.clone(), sum);
        }
        let norm: f64 = next.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for v in next.values_mut() {
                *v /= norm;
            }
        }
        x = next;
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dependency, Issue, IssueType, Status};
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
    fn hub_blocked_by_many_has_higher_centrality() {
        let issues = vec![
            issue("hub", vec![]),
            issue("a", vec!["hub"]),
            issue("b", vec!["hub"]),
            issue("c", vec!["hub"]),
            issue("lonely", vec![]),
        ];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let scores = eigenvector(&g, &cancel).unwrap();
        assert!(scores["hub"] > scores["lonely"]);
    }

    #[test]
    fn deterministic_across_runs() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"]), issue("c", vec!["a"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let first = eigenvector(&g, &cancel).unwrap();
        let second = eigenvector(&g, &cancel).unwrap();
        for (k, v) in &first {
            assert!((v - second[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_graph_yields_empty_map() {
        let g = AnalysisGraph::build(&[]).unwrap();
        let cancel = CancellationToken::new();
        assert!(eigenvector(&g, &cancel).unwrap().is_empty());
    }
}
