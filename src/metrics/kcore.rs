//! k-core decomposition and articulation points, both computed on the
//! undirected projection of the blocking graph.

use std::collections::{HashMap, HashSet};

use crate::graph::AnalysisGraph;
use crate::harness::CancellationToken;

fn undirected_adjacency(graph: &AnalysisGraph) -> HashMap<String, HashSet<String>> {
    let mut adj: HashMap<String, HashSet<String>> = graph.ids_in_order().iter().map(|id| (id.clone(), HashSet::new())).collect();
    for id in graph.ids_in_order() {
        for blocker in graph.blockers_of(id) {
            adj.get_mut(id).unwrap().insert(blocker.clone());
            adj.get_mut(&blocker).unwrap().insert(id.clone());
        }
    }
    adj
}

/// Iterative peeling: at step k, repeatedly remove vertices with degree < k;
/// a removed vertex's core number is `k - 1`; surviving vertices receive the
/// maximum degree observed (i.e. the final surviving value of k).
pub fn k_core(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<HashMap<String, usize>> {
    let adj = undirected_adjacency(graph);
    let mut degree: HashMap<String, usize> = adj.iter().map(|(id, n)| (id.clone(), n.len())).collect();
    let mut core: HashMap<String, usize> = HashMap::new();
    let mut remaining: HashSet<String> = adj.keys().cloned().collect();

    let mut k = 0usize;
    while !remaining.is_empty() {
        if cancel.is_cancelled() {
            return None;
        }
        loop {
            let mut to_remove: Vec<String> = remaining
                .iter()
                .filter(|id| degree[*id] < k)
                .cloned()
                .collect();
            to_remove.sort();
            if to_remove.is_empty() {
                break;
            }
            for id in &to_remove {
                core.insert(id.clone(), k.saturating_sub(1));
                remaining.remove(id);
                let neighbors: Vec<String> = adj[id].iter().filter(|n| remaining.contains(*n)).cloned().collect();
                for n in neighbors {
                    *degree.get_mut(&n).unwrap() -= 1;
                }
            }
        }
        if remaining.is_empty() {
            break;
        }
        k += 1;
    }

    for id in remaining {
        core.insert(id.clone(), k);
    }

    Some(core)
}

/// DFS with discovery/low values, implemented with an explicit stack so
/// long dependency chains cannot overflow the native call stack.
pub fn articulation_points(graph: &AnalysisGraph, cancel: &CancellationToken) -> Option<HashSet<String>> {
    let adj = undirected_adjacency(graph);
    let mut ids: Vec<String> = adj.keys().cloned().collect();
    ids.sort();

    let mut disc: HashMap<String, usize> = HashMap::new();
    let mut low: HashMap<String, usize> = HashMap::new();
    let mut parent: HashMap<String, Option<String>> = HashMap::new();
    let mut articulation: HashSet<String> = HashSet::new();
    let mut timer = 0usize;

    for root in &ids {
        if disc.contains_key(root) {
            continue;
        }
        if cancel.is_cancelled() {
            return None;
        }
        let mut child_count_of_root = 0usize;
        // frame: (node, sorted neighbor list, next neighbor index)
        let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();
        disc.insert(root.clone(), timer);
        low.insert(root.clone(), timer);
        timer += 1;
        parent.insert(root.clone(), None);
        let mut neighbors: Vec<String> = adj[root].iter().cloned().collect();
        neighbors.sort();
        stack.push((root.clone(), neighbors, 0));

        while let Some((node, neighbors, mut idx)) = stack.pop() {
            if idx < neighbors.len() {
                let next = neighbors[idx].clone();
                idx += 1;
                if !disc.contains_key(&next) {
                    disc.insert(next.clone(), timer);
                    low.insert(next.clone(), timer);
                    timer += 1;
                    parent.insert(next.clone(), Some(node.clone()));
                    if node == *root {
                        child_count_of_root += 1;
                    }
                    stack.push((node, neighbors, idx));
                    let mut grand: Vec<String> = adj[&next].iter().cloned().collect();
                    grand.sort();
                    stack.push((next, grand, 0));
                } else if parent.get(&node).and_then(|p| p.as_ref()) != Some(&next) {
                    let nd = disc[&next];
                    let cur_low = low[&node];
                    low.insert(node.clone(), cur_low.min(nd));
                    stack.push((node, neighbors, idx));
                } else {
                    stack.push((node, neighbors, idx));
                }
            } else {
                // done with `node`: propagate low to parent, check articulation rule
                if let Some(Some(p)) = parent.get(&node).cloned() {
                    let child_low = low[&node];
                    let parent_low = low[&p];
                    low.insert(p.clone(), parent_low.min(child_low));
                    if p != *root && child_low >= disc[&p] {
                        articulation.insert(p.clone());
                    }
                }
            }
        }

        if child_count_of_root > 1 {
            articulation.insert(root.clone());
        }
    }

    Some(articulation)
}
