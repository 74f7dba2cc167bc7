//! Recommendation generation (§4.5): filters triage scores by confidence,
//! attaches a fixed-decision-tree reason list and an `action_hint`, and
//! computes the what-if unblock delta for each recommendation.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::graph::{AnalysisGraph, Issue, Status};
use crate::score::TriageScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionHint {
    BlockedBy,
    ClaimedByOther,
    StaleInProgress,
    QuickWin,
    InProgress,
    Default,
}

impl ActionHint {
    fn as_str(self) -> &'static str {
        match self {
            ActionHint::BlockedBy => "blocked_by",
            ActionHint::ClaimedByOther => "claimed_by_other",
            ActionHint::StaleInProgress => "stale_in_progress",
            ActionHint::QuickWin => "quick_win",
            ActionHint::InProgress => "in_progress",
            ActionHint::Default => "default",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WhatIfDelta {
    pub direct_unblocks: usize,
    pub transitive_unblocks: usize,
    pub blocked_reduction: usize,
    pub estimated_days_saved: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: String,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub primary: String,
    pub action_hint: &'static str,
    pub blocked_by: Vec<String>,
    pub what_if: WhatIfDelta,
}

const STALE_DAYS_SHORT: i64 = 7;
const STALE_DAYS_LONG: i64 = 14;

/// Open blockers of `id`: dependencies whose target is not closed-like.
fn open_blockers_of(id: &str, graph: &AnalysisGraph, status_by_id: &HashMap<&str, Status>) -> Vec<String> {
    graph
        .blockers_of(id)
        .into_iter()
        .filter(|b| status_by_id.get(b.as_str()).map(|s| !s.is_closed_like()).unwrap_or(true))
        .collect()
}

fn reasons_for(
    issue: &Issue,
    triage: &TriageScore,
    blocked_by: &[String],
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<String> {
    let mut reasons = Vec::new();

    if triage.direct_unblocks > 0 {
        reasons.push(format!("unblocks {} other issue(s)", triage.direct_unblocks));
    }
    if triage.is_quick_win {
        reasons.push("short remaining blocker chain".to_string());
    }
    if issue.priority <= 1 {
        reasons.push(format!("high priority (p{})", issue.priority));
    }
    let days_since_updated = (now - issue.updated_at).num_days();
    if days_since_updated >= STALE_DAYS_LONG {
        reasons.push(format!("stale for {} days", days_since_updated));
    } else if days_since_updated >= STALE_DAYS_SHORT {
        reasons.push(format!("idle for {} days", days_since_updated));
    }
    if !blocked_by.is_empty() {
        reasons.push(format!("blocked by {} open issue(s)", blocked_by.len()));
    }
    if issue.status == Status::InProgress {
        reasons.push("already in progress".to_string());
    }

    reasons.truncate(3);
    if reasons.is_empty() {
        reasons.push("contributes to overall triage ranking".to_string());
    }
    reasons
}

fn action_hint_for(issue: &Issue, triage: &TriageScore, blocked_by: &[String], now: chrono::DateTime<chrono::Utc>) -> ActionHint {
    if !blocked_by.is_empty() {
        return ActionHint::BlockedBy;
    }
    // Claim tracking lives outside the core; without a claimant field we
    // can only ever observe "not claimed", so this hint never fires here —
    // kept as a documented precedence slot for a future claims collaborator.
    let days_since_updated = (now - issue.updated_at).num_days();
    if issue.status == Status::InProgress && days_since_updated >= STALE_DAYS_LONG {
        return ActionHint::StaleInProgress;
    }
    if triage.is_quick_win {
        return ActionHint::QuickWin;
    }
    if issue.status == Status::InProgress {
        return ActionHint::InProgress;
    }
    ActionHint::Default
}

/// Reachable closure of "v unblocks u" through chained single-blocker
/// relationships, starting from `id`.
fn transitive_unblocks(id: &str, graph: &AnalysisGraph, status_by_id: &HashMap<&str, Status>) -> HashSet<String> {
    let mut visited = HashSet::new();
    let mut frontier = vec![id.to_string()];
    while let Some(current) = frontier.pop() {
        for dependent in graph.dependents_of(&current) {
            if status_by_id.get(dependent.as_str()).map(|s| s.is_closed_like()).unwrap_or(false) {
                continue;
            }
            let open_blockers = open_blockers_of(&dependent, graph, status_by_id);
            if open_blockers.len() == 1 && open_blockers[0] == current && visited.insert(dependent.clone()) {
                frontier.push(dependent);
            }
        }
    }
    visited
}

pub fn generate_recommendations(
    issues: &[Issue],
    graph: &AnalysisGraph,
    triage_scores: &[TriageScore],
    confidence_threshold: f64,
    now: chrono::DateTime<chrono::Utc>,
) -> Vec<Recommendation> {
    let status_by_id: HashMap<&str, Status> = issues.iter().map(|i| (i.id.as_str(), i.status)).collect();
    let issue_by_id: HashMap<&str, &Issue> = issues.iter().map(|i| (i.id.as_str(), i)).collect();
    let estimate_by_id: HashMap<&str, u32> = issues.iter().filter_map(|i| i.estimated_minutes.map(|m| (i.id.as_str(), m))).collect();

    let mut recommendations: Vec<Recommendation> = triage_scores
        .iter()
        .filter(|t| t.score >= confidence_threshold)
        .filter_map(|triage| {
            let issue = *issue_by_id.get(triage.id.as_str())?;
            let blocked_by = open_blockers_of(&triage.id, graph, &status_by_id);
            let reasons = reasons_for(issue, triage, &blocked_by, now);
            let primary = reasons[0].clone();
            let action_hint = action_hint_for(issue, triage, &blocked_by, now).as_str();

            let direct: Vec<String> = graph
                .dependents_of(&triage.id)
                .into_iter()
                .filter(|d| {
                    !status_by_id.get(d.as_str()).map(|s| s.is_closed_like()).unwrap_or(false)
                        && open_blockers_of(d, graph, &status_by_id) == vec![triage.id.clone()]
                })
                .collect();
            let transitive = transitive_unblocks(&triage.id, graph, &status_by_id);
            let blocked_reduction = transitive.len();
            let estimated_days_saved = direct
                .iter()
                .filter_map(|d| estimate_by_id.get(d.as_str()))
                .map(|m| *m as f64 / (8.0 * 60.0))
                .sum();

            Some(Recommendation {
                id: triage.id.clone(),
                confidence: triage.score,
                reasons,
                primary,
                action_hint,
                blocked_by,
                what_if: WhatIfDelta {
                    direct_unblocks: direct.len(),
                    transitive_unblocks: transitive.len(),
                    blocked_reduction,
                    estimated_days_saved,
                },
            })
        })
        .collect();

    recommendations.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then_with(|| a.id.cmp(&b.id)));
    recommendations
}
