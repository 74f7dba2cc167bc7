//! Critical-path score: `height(v) = 1 + max(height(predecessor))`, sources
//! have height 1. Computed over the topological order, so it is undefined
//! (left empty) when the graph is cyclic.

use std::collections::HashMap;

/// `topological_order` must be a valid topological order of the graph
/// (target-before-source along blocking edges is irrelevant here — what
/// matters is that every predecessor of a node appears before it). We take
/// the Phase-1 topological order (empty when cyclic) and the graph's
/// "blockers_of" relation (a node's predecessors, in the height sense, are
/// the issues it blocks on).
pub fn critical_path_score(
    topological_order: &[String],
    blockers_of: impl Fn(&str) -> Vec<String>,
) -> HashMap<String, usize> {
    let mut height: HashMap<String, usize> = HashMap::new();
    // `toposort` from petgraph yields nodes such that edges go from earlier
    // to later in the list for the edge direction used; our edges point
    // from a dependent to its blocker (u -> v means u depends on v), so a
    // blocker appears *after* its dependents in that order. We need the
    // reverse: process blockers before dependents, i.e. iterate the
    // topological order in reverse so that by the time we reach `v` all of
    // `v`'s blockers already have a height.
    for id in topological_order.iter().rev() {
        let preds = blockers_of(id);
        let h = 1 + preds.iter().filter_map(|p| height.get(p)).copied().max().unwrap_or(0);
        height.insert(id.clone(), h);
    }
    height
}
