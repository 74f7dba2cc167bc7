//! Betweenness centrality: exact (Brandes) and pivot-sampled approximate.

use std::collections::{HashMap, VecDeque};

use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

/// Brandes' algorithm on the directed graph, unweighted, O(V*E).
pub fn betweenness_exact(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<HashMap<String, f64>> {
    let ids = graph.ids_sorted();
    let mut centrality: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();

    for source in &ids {
        if cancel.is_cancelled() {
            return None;
        }
        accumulate_from_source(graph, source, &ids, &mut centrality);
    }

    Some(centrality)
}

/// Pivot-sampled approximate betweenness: runs Brandes' single-source
/// accumulation from a random subset of pivots and rescales.
///
/// `sample_size` is clamped to `[1, n]`; when the clamp equals `n` the
/// result is identical to the exact computation (the caller is responsible
/// for reporting that case as `exact` mode, since this function cannot know
/// the original unclamped request).
pub fn betweenness_approximate(
    graph: &AnalysisGraph,
    sample_size: usize,
    seed: u64,
    cancel: &CancellationToken,
) -> Option<(HashMap<String, f64>, usize)> {
    let ids = graph.ids_sorted();
    let n = ids.len();
    let clamped = sample_size.clamp(1, n.max(1)).min(n.max(1));
    if n == 0 {
        return Some((HashMap::new(), 0));
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut pool = ids.clone();
    pool.shuffle(&mut rng);
    let pivots = &pool[..clamped.min(pool.len())];

    let mut centrality: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
    for source in pivots {
        if cancel.is_cancelled() {
            return None;
        }
        accumulate_from_source(graph, source, &ids, &mut centrality);
    }

    let scale = if clamped > 0 { n as f64 / clamped as f64 } else { 1.0 };
    for v in centrality.values_mut() {
        *v *= scale;
    }

    Some((centrality, clamped))
}

/// One BFS-based Brandes accumulation pass from `source`, folded into `centrality`.
fn accumulate_from_source(
    graph: &AnalysisGraph,
    source: &str,
    ids: &[String],
    centrality: &mut HashMap<String, f64>,
) {
    let mut sigma: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
    let mut dist: HashMap<String, i64> = ids.iter().map(|id| (id.clone(), -1)).collect();
    let mut predecessors: HashMap<String, Vec<String>> = ids.iter().map(|id| (id.clone(), Vec::new())).collect();
    let mut order: Vec<String> = Vec::new();

    sigma.insert(source.to_string(), 1.0);
    dist.insert(source.to_string(), 0);
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(source.to_string());

    while let Some(v) = queue.pop_front() {
        order.push(v.clone());
        let neighbors = graph.blockers_of(&v);
        for w in &neighbors {
            if dist[w] < 0 {
                dist.insert(w.clone(), dist[&v] + 1);
                queue.push_back(w.clone());
            }
            if dist[w] == dist[&v] + 1 {
                let add = sigma[&v];
                *sigma.get_mut(w).unwrap() += add;
                predecessors.get_mut(w).unwrap().push(v.clone());
            }
        }
    }

    let mut delta: HashMap<String, f64> = ids.iter().map(|id| (id.clone(), 0.0)).collect();
    for w in order.into_iter().rev() {
        let preds = predecessors[&w].clone();
        let sigma_w = sigma[&w];
        let delta_w = delta[&w];
        for v in preds {
            if sigma_w > 0.0 {
                let contrib = (sigma[&v] / sigma_w) * (1.0 + delta_w);
                *delta.get_mut(&v).unwrap() += contrib;
            }
        }
        if w != source {
            *centrality.get_mut(&w).unwrap() += delta[&w];
        }
    }
}
