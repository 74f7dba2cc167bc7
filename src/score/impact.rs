//! The 8-factor weighted impact score (§4.4). Every factor is normalized to
//! `[0,1]` across the open issue set and carries a short explanation string.

use std::collections::HashMap;

use crate::config::ImpactWeights;
use crate::feedback::WeightFeedback;
use crate::graph::{AnalysisGraph, Issue, Status};
use crate::stats::Phase2Snapshot;

#[derive(Debug, Clone)]
pub struct FactorValue {
    pub value: f64,
    pub explanation: String,
}

#[derive(Debug, Clone)]
pub struct ImpactBreakdown {
    pub pagerank: FactorValue,
    pub betweenness: FactorValue,
    pub blocker_ratio: FactorValue,
    pub staleness: FactorValue,
    pub priority_boost: FactorValue,
    pub time_to_impact: FactorValue,
    pub urgency: FactorValue,
    pub risk: FactorValue,
}

#[derive(Debug, Clone)]
pub struct ImpactScore {
    pub id: String,
    pub score: f64,
    pub breakdown: ImpactBreakdown,
}

fn normalize_max(value: f64, max: f64) -> f64 {
    if max <= 0.0 {
        0.0
    } else {
        (value / max).clamp(0.0, 1.0)
    }
}

/// Computes impact scores for every non-closed-like issue. The input slice
/// need not be pre-filtered; closed-like issues are skipped. `feedback`'s
/// current adjustment is applied to `weights` before any factor is weighted,
/// per the feedback collaborator contract: the core reads adjusted weights
/// at scoring time but never writes back to the store.
pub fn compute_impact_scores(
    issues: &[Issue],
    graph: &AnalysisGraph,
    phase2: &Phase2Snapshot,
    weights: &ImpactWeights,
    urgency_labels: &[String],
    now: chrono::DateTime<chrono::Utc>,
    feedback: &dyn WeightFeedback,
) -> Vec<ImpactScore> {
    let weights = &feedback.current_adjustment().apply(weights);
    let open: Vec<&Issue> = issues.iter().filter(|i| !i.status.is_closed_like()).collect();
    if open.is_empty() {
        return Vec::new();
    }

    let max_in_degree = open.iter().map(|i| graph.in_degree(&i.id) as f64).fold(0.0_f64, f64::max);
    let max_pagerank = open.iter().filter_map(|i| phase2.pagerank.get(&i.id)).cloned().fold(0.0_f64, f64::max);
    let max_betweenness = open.iter().filter_map(|i| phase2.betweenness.get(&i.id)).cloned().fold(0.0_f64, f64::max);
    let max_time_to_impact = open
        .iter()
        .map(|i| raw_time_to_impact(i, graph, phase2))
        .fold(0.0_f64, f64::max);

    let urgency_set: std::collections::HashSet<String> = urgency_labels.iter().map(|l| l.to_lowercase()).collect();
    let max_urgency = open
        .iter()
        .map(|i| raw_urgency(i, &urgency_set, now))
        .fold(0.0_f64, f64::max);

    let mut scores: Vec<ImpactScore> = open
        .iter()
        .map(|issue| {
            let pagerank_raw = phase2.pagerank.get(&issue.id).copied().unwrap_or(0.0);
            let pagerank = FactorValue {
                value: normalize_max(pagerank_raw, max_pagerank),
                explanation: format!("pagerank {:.4} (max {:.4} in open set)", pagerank_raw, max_pagerank),
            };

            let betweenness_raw = phase2.betweenness.get(&issue.id).copied().unwrap_or(0.0);
            let betweenness = FactorValue {
                value: normalize_max(betweenness_raw, max_betweenness),
                explanation: format!("betweenness {:.4} (max {:.4} in open set)", betweenness_raw, max_betweenness),
            };

            let in_degree = graph.in_degree(&issue.id) as f64;
            let blocker_ratio = FactorValue {
                value: normalize_max(in_degree, max_in_degree),
                explanation: format!("blocks {} dependents (max {} in open set)", in_degree as usize, max_in_degree as usize),
            };

            let days_since_updated = (now - issue.updated_at).num_seconds().max(0) as f64 / 86_400.0;
            let staleness_value = (days_since_updated / 30.0).min(1.0);
            let staleness = FactorValue {
                value: staleness_value,
                explanation: format!("{:.1} days since last update", days_since_updated),
            };

            let priority_value = ((4.0 - issue.priority as f64) / 4.0).clamp(0.0, 1.0);
            let priority_boost = FactorValue {
                value: priority_value,
                explanation: format!("priority {}", issue.priority),
            };

            let tti_raw = raw_time_to_impact(issue, graph, phase2);
            let time_to_impact = FactorValue {
                value: normalize_max(tti_raw, max_time_to_impact),
                explanation: format!("critical-path depth {} with estimate", phase2.critical_path_score.get(&issue.id).copied().unwrap_or(0)),
            };

            let urgency_raw = raw_urgency(issue, &urgency_set, now);
            let urgency = FactorValue {
                value: normalize_max(urgency_raw, max_urgency),
                explanation: urgency_explanation(issue, &urgency_set),
            };

            // Open question #1: no Risk signal is defined; route zero.
            let risk = FactorValue {
                value: 0.0,
                explanation: "risk factor placeholder: no signal defined".to_string(),
            };

            let score = weights.pagerank * pagerank.value
                + weights.betweenness * betweenness.value
                + weights.blocker_ratio * blocker_ratio.value
                + weights.staleness * staleness.value
                + weights.priority_boost * priority_boost.value
                + weights.time_to_impact * time_to_impact.value
                + weights.urgency * urgency.value
                + weights.risk * risk.value;

            ImpactScore {
                id: issue.id.clone(),
                score,
                breakdown: ImpactBreakdown {
                    pagerank,
                    betweenness,
                    blocker_ratio,
                    staleness,
                    priority_boost,
                    time_to_impact,
                    urgency,
                    risk,
                },
            }
        })
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    scores
}

fn raw_time_to_impact(issue: &Issue, _graph: &AnalysisGraph, phase2: &Phase2Snapshot) -> f64 {
    let depth = phase2.critical_path_score.get(&issue.id).copied().unwrap_or(0) as f64;
    let has_estimate = issue.estimated_minutes.filter(|m| *m > 0).is_some();
    if has_estimate {
        depth
    } else {
        depth * 0.5
    }
}

fn raw_urgency(issue: &Issue, urgency_labels: &std::collections::HashSet<String>, now: chrono::DateTime<chrono::Utc>) -> f64 {
    let has_urgent_label = issue.label_set().iter().any(|l| urgency_labels.contains(l));
    let label_component = if has_urgent_label { 1.0 } else { 0.0 };
    let age_days = (now - issue.created_at).num_seconds().max(0) as f64 / 86_400.0;
    // Decay over 14 days: newer issues contribute more urgency pressure.
    let decay_component = (1.0 - (age_days / 14.0)).clamp(0.0, 1.0);
    label_component + 0.25 * decay_component
}

fn urgency_explanation(issue: &Issue, urgency_labels: &std::collections::HashSet<String>) -> String {
    let matched: Vec<&str> = issue
        .labels
        .iter()
        .filter(|l| urgency_labels.contains(&l.to_lowercase()))
        .map(|l| l.as_str())
        .collect();
    if matched.is_empty() {
        "no recognized urgency labels".to_string()
    } else {
        format!("urgency labels: {}", matched.join(", "))
    }
}

/// Lookup helper: impact score for an issue id, or `None` if closed-like /
/// not present (used by what-if delta computation in `recommend`).
pub fn find<'a>(scores: &'a [ImpactScore], id: &str) -> Option<&'a ImpactScore> {
    scores.iter().find(|s| s.id == id)
}

pub fn scores_by_id(scores: &[ImpactScore]) -> HashMap<String, f64> {
    scores.iter().map(|s| (s.id.clone(), s.score)).collect()
}
