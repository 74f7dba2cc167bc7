//! Damped-random-walk PageRank over the blocking graph.

use std::collections::HashMap;

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

pub const DAMPING: f64 = 0.85;
pub const TOLERANCE: f64 = 1e-6;
pub const MAX_ITERATIONS: usize = 100;

/// Computes PageRank; returns `None` if cancelled mid-iteration (caller
/// treats that the same as a worker that never produced a result).
pub fn pagerank(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<HashMap<String, f64>> {
    let ids = graph.ids_sorted();
    let n = ids.len();
    if n == 0 {
        return Some(HashMap::new());
    }

    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
    let out_degree: Vec<usize> = ids.iter().map(|id| graph.out_degree(id)).collect();

    let mut rank = vec![1.0 / n as f64; n];
    for _ in 0..MAX_ITERATIONS {
        if cancel.is_cancelled() {
            return None;
        }
        let mut next = vec![(1.0 - DAMPING) / n as f64; n];
        let dangling_mass: f64 = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| out_degree[index[id.as_str()]] == 0)
            .map(|(i, _)| rank[i])
            .sum();
        for i in 0..n {
            next[i] += DAMPING * dangling_mass / n as f64;
        }
        for (i, id) in ids.iter().enumerate() {
            let od = out_degree[i];
            if od == 0 {
                continue;
            }
            let share = DAMPING * rank[i] / od as f64;
            for target in graph.blockers_of(id) {
                let j = index[target.as_str()];
                next[j] += share;
            }
        }

        let delta: f64 = rank.iter().zip(next.iter()).map(|(a, b)| (a - b).abs()).sum();
        rank = next;
        if delta < TOLERANCE {
            break;
        }
    }

    Some(ids.into_iter().zip(rank).collect())
}

/// Uniform fallback used when PageRank times out: `1/n` for every node.
pub fn uniform_fallback(graph: &AnalysisGraph) -> HashMap<String, f64> {
    let n = graph.node_count().max(1) as f64;
    graph.ids_in_order().iter().map(|id| (id.clone(), 1.0 / n)).collect()
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
    fn ranks_sum_to_roughly_one() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"]), issue("c", vec!["a"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let ranks = pagerank(&g, &cancel).unwrap();
        let total: f64 = ranks.values().sum();
        assert!((total - 1.0).abs() < 1e-3);
    }

    #[test]
    fn sink_with_more_dependents_ranks_higher() {
        let issues = vec![
            issue("hub", vec![]),
            issue("a", vec!["hub"]),
            issue("b", vec!["hub"]),
            issue("c", vec!["hub"]),
            issue("lonely", vec![]),
        ];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let ranks = pagerank(&g, &cancel).unwrap();
        assert!(ranks["hub"] > ranks["lonely"]);
    }

    #[test]
    fn empty_graph_yields_empty_ranks() {
        let g = AnalysisGraph::build(&[]).unwrap();
        let cancel = CancellationToken::new();
        assert!(pagerank(&g, &cancel).unwrap().is_empty());
    }

    #[test]
    fn cancelled_before_start_returns_none() {
        let issues = vec![issue("a", vec![])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(pagerank(&g, &cancel).is_none());
    }
}
