//! Cycle detection: an O(V+E) SCC pre-check, then a bounded simple-cycle
//! enumerator invoked only when a non-trivial SCC exists.

use petgraph::algo::tarjan_scc;

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

/// Returns `(cycles, truncated)`. `cycles` is capped at `max_cycles`; when
/// the enumerator finds more than that, `truncated` is `true`.
pub fn find_cycles(
    graph: &AnalysisGraph,
    max_cycles: usize,
    cancel: &CancellationToken,
) -> Option<(Vec<Vec<String>>, bool)> {
    let sccs = tarjan_scc(graph.inner());
    let has_nontrivial_scc = sccs.iter().any(|scc| {
        scc.len() > 1 || (scc.len() == 1 && graph.blockers_of(graph.id_of(scc[0])).contains(&graph.id_of(scc[0]).to_string()))
    });
    if !has_nontrivial_scc {
        return Some((Vec::new(), false));
    }

    let mut cycles = Vec::new();
    let mut truncated = false;
    let mut ids = graph.ids_sorted();
    ids.sort();

    'outer: for scc in &sccs {
        if scc.len() < 2 {
            continue;
        }
        if cancel.is_cancelled() {
            return None;
        }
        let members: Vec<String> = {
            let mut m: Vec<String> = scc.iter().map(|idx| graph.id_of(*idx).to_string()).collect();
            m.sort();
            m
        };
        // Enumerate simple cycles within this SCC via DFS from its
        // lowest-id member (deterministic), restricted to SCC membership.
        if let Some(found) = enumerate_simple_cycles(graph, &members, max_cycles - cycles.len()) {
            for c in found {
                cycles.push(c);
                if cycles.len() >= max_cycles {
                    truncated = true;
                    break 'outer;
                }
            }
        }
    }

    Some((cycles, truncated))
}

fn enumerate_simple_cycles(graph: &AnalysisGraph, members: &[String], budget: usize) -> Option<Vec<Vec<String>>> {
    if budget == 0 {
        return Some(Vec::new());
    }
    let member_set: std::collections::HashSet<&String> = members.iter().collect();
    let mut found = Vec::new();
    let start = &members[0];

    let mut stack: Vec<(String, Vec<String>)> = vec![(start.clone(), vec![start.clone()])];
    let mut guard = 0usize;
    while let Some((node, path)) = stack.pop() {
        guard += 1;
        if guard > 100_000 {
            break; // pathological SCC safety valve
        }
        for next in graph.blockers_of(&node) {
            if !member_set.contains(&next) {
                continue;
            }
            if next == *start && path.len() > 1 {
                found.push(path.clone());
                if found.len() >= budget {
                    return Some(found);
                }
            } else if !path.contains(&next) {
                let mut new_path = path.clone();
                new_path.push(next.clone());
                stack.push((next, new_path));
            }
        }
    }
    Some(found)
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
    fn acyclic_graph_has_no_cycles() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let (cycles, truncated) = find_cycles(&g, 100, &cancel).unwrap();
        assert!(cycles.is_empty());
        assert!(!truncated);
    }

    #[test]
    fn three_cycle_is_detected() {
        let mut a = issue("a", vec!["c"]);
        a.dependencies = vec![Dependency::blocking("c")];
        let b = issue("b", vec!["a"]);
        let c = issue("c", vec!["b"]);
        let issues = vec![a, b, c];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let (cycles, _truncated) = find_cycles(&g, 100, &cancel).unwrap();
        assert!(!cycles.is_empty());
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        let g = AnalysisGraph::build(&[]).unwrap();
        let cancel = CancellationToken::new();
        let (cycles, truncated) = find_cycles(&g, 100, &cancel).unwrap();
        assert!(cycles.is_empty());
        assert!(!truncated);
    }
}
