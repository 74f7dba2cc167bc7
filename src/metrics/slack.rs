//! Longest-path slack: `slack(v) = longest - (forward(v) + reverse(v))`.
//! Critical-path nodes have slack 0. Left empty when the graph is cyclic
//! (the topological order is empty in that case).

use std::collections::HashMap;

use crate::graph::AnalysisGraph;

pub struct SlackResult {
    pub slack: HashMap<String, usize>,
    pub critical_path_length: usize,
}

/// `forward(v)` = longest path ending at `v` starting from any source (a
/// node with no blockers); `reverse(v)` = longest path starting at `v`
/// ending at any sink (a node nothing depends on). Both are computed as a
/// single forward/backward pass over the topological order.
pub fn compute(graph: &AnalysisGraph, topological_order: &[String]) -> SlackResult {
    if topological_order.is_empty() {
        return SlackResult {
            slack: HashMap::new(),
            critical_path_length: 0,
        };
    }

    // forward(v): longest chain of blockers "under" v, i.e. same recurrence
    // as critical_path_score but 0-based (a source has forward = 0).
    let mut forward: HashMap<String, usize> = HashMap::new();
    for id in topological_order.iter().rev() {
        let preds = graph.blockers_of(id);
        let f = preds.iter().filter_map(|p| forward.get(p)).map(|v| v + 1).max().unwrap_or(0);
        forward.insert(id.clone(), f);
    }

    let critical_path_length = forward.values().copied().max().unwrap_or(0);

    // reverse(v): longest chain of dependents "above" v.
    let mut reverse: HashMap<String, usize> = HashMap::new();
    for id in topological_order.iter() {
        let deps = graph.dependents_of(id);
        let r = deps.iter().filter_map(|d| reverse.get(d)).map(|v| v + 1).max().unwrap_or(0);
        reverse.insert(id.clone(), r);
    }

    let mut slack = HashMap::with_capacity(topological_order.len());
    for id in topological_order {
        let f = forward.get(id).copied().unwrap_or(0);
        let r = reverse.get(id).copied().unwrap_or(0);
        slack.insert(id.clone(), critical_path_length.saturating_sub(f + r));
    }

    SlackResult {
        slack,
        critical_path_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dependency, Issue, IssueType, Status};
    use crate::phase1;
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
    fn chain_has_zero_slack_everywhere() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"]), issue("c", vec!["b"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let p1 = phase1::compute(&g);
        let result = compute(&g, &p1.topological_order);
        assert_eq!(result.critical_path_length, 2);
        for v in result.slack.values() {
            assert_eq!(*v, 0);
        }
    }

    #[test]
    fn parallel_branch_has_positive_slack() {
        // top depends on mid1 (depends on root) and mid2 (leaf, no further deps)
        let issues = vec![
            issue("root", vec![]),
            issue("mid1", vec!["root"]),
            issue("mid2", vec![]),
            issue("top", vec!["mid1", "mid2"]),
        ];
        let g = AnalysisGraph::build(&issues).unwrap();
        let p1 = phase1::compute(&g);
        let result = compute(&g, &p1.topological_order);
        // longest path: top -> mid1 -> root, length 2
        assert_eq!(result.critical_path_length, 2);
        assert_eq!(result.slack["mid2"], 1);
        assert_eq!(result.slack["root"], 0);
        assert_eq!(result.slack["top"], 0);
    }

    #[test]
    fn cyclic_graph_yields_empty_slack() {
        let result = compute(&AnalysisGraph::build(&[]).unwrap(), &[]);
        assert!(result.slack.is_empty());
        assert_eq!(result.critical_path_length, 0);
    }
}
