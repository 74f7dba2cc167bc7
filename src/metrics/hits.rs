//! HITS: hub and authority scores.

use std::collections::HashMap;

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

pub const ITERATIONS: usize = 50;

/// A good hub points (blocks on) good authorities; a good authority is
/// pointed to by (blocks) good hubs. Skipped entirely if there are no edges.
pub fn hits(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<Option<(HashMap<String, f64>, HashMap<String, f64>)>> {
    if graph.edge_count() == 0 {
        return Some(None);
    }

    let ids = graph.ids_sorted();
    let mut hubs: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 1.0)).collect();
    let mut auth: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 1.0)).collect();

    for _ in 0..ITERATIONS {
        if cancel.is_cancelled() {
            return None;
        }
        let mut new_auth: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
        for v in &ids {
            // authority(v) = sum of hub(u) for every u that blocks on v (dependents).
            let sum: f64 = graph.dependents_of(v).iter().map(|u| hubs[u]).sum();
            new_auth.insert(v.clone(), sum);
        }
        normalize(&mut new_auth);

        let mut new_hubs: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
        for v in &ids {
            // hub(v) = sum of authority(w) for every w that v blocks on.
            let sum: f64 = graph.blockers_of(v).iter().map(|w| new_auth[w]).sum();
            new_hubs.insert(v.clone(), sum);
        }
        normalize(&mut new_hubs);

        hubs = new_hubs;
        auth = new_auth;
    }

    Some(Some((hubs, auth)))
}

fn normalize(map: &mut HashMap<String, f64>) {
    let norm: f64 = map.values().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in map.values_mut() {
            *v /= norm;
        }
    }
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
    fn skipped_when_no_edges() {
        let issues = vec![issue("a", vec![]), issue("b", vec![])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        assert!(hits(&g, &cancel).unwrap().is_none());
    }

    #[test]
    fn authority_goes_to_the_common_blocker() {
        let issues = vec![issue("root", vec![]), issue("a", vec!["root"]), issue("b", vec!["root"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let (_, auth) = hits(&g, &cancel).unwrap().unwrap();
        assert!(auth["root"] > auth["a"]);
        assert!(auth["root"] > auth["b"]);
    }

    #[test]
    fn hub_goes_to_the_dependents() {
        let issues = vec![issue("root", vec![]), issue("a", vec!["root"]), issue("b", vec!["root"])];
        let g = AnalysisGraph::build(&issues).unwrap();
        let cancel = CancellationToken::new();
        let (hubs, _) = hits(&g, &cancel).unwrap().unwrap();
        assert!(hubs["a"] > hubs["root"]);
    }
}
