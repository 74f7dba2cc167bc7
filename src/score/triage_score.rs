//! The triage score layers two boosts on top of the impact score: an
//! "unblock" boost (how many issues are waiting directly on this one) and a
//! "quick win" boost (short remaining blocker chain, not already claimed).

use std::collections::HashMap;

use crate::config::ScoringConfig;
use crate::graph::{AnalysisGraph, Issue, Status};
use crate::score::impact::ImpactScore;
use crate::stats::Phase2Snapshot;

/// Names of scoring channels this implementation does not yet compute.
/// Reported so callers can distinguish "scored zero" from "not modeled".
pub const RESERVED_FACTORS: [&str; 3] = ["label_health", "claim_penalty", "attention_score"];

#[derive(Debug, Clone)]
pub struct TriageScore {
    pub id: String,
    pub impact_score: f64,
    pub unblock_boost: f64,
    pub quick_win_boost: f64,
    pub score: f64,
    pub direct_unblocks: usize,
    pub is_quick_win: bool,
    pub factors_pending: Vec<String>,
}

pub fn compute_triage_scores(
    issues: &[Issue],
    graph: &AnalysisGraph,
    phase2: &Phase2Snapshot,
    impact_scores: &[ImpactScore],
    config: &ScoringConfig,
) -> Vec<TriageScore> {
    if impact_scores.is_empty() {
        return Vec::new();
    }

    let status_by_id: HashMap<&str, Status> = issues.iter().map(|i| (i.id.as_str(), i.status)).collect();

    let direct_unblocks_by_id: HashMap<&str, usize> = impact_scores
        .iter()
        .map(|s| (s.id.as_str(), graph.dependents_of(&s.id).len()))
        .collect();
    let max_unblocks = direct_unblocks_by_id.values().copied().max().unwrap_or(0) as f64;
    let max_log_unblocks = if max_unblocks > 0.0 { (1.0 + max_unblocks).log2() } else { 0.0 };

    let mut scores: Vec<TriageScore> = impact_scores
        .iter()
        .map(|impact| {
            let direct_unblocks = direct_unblocks_by_id.get(impact.id.as_str()).copied().unwrap_or(0);
            let unblock_raw = (1.0 + direct_unblocks as f64).log2();
            let unblock_normalized = if max_log_unblocks > 0.0 {
                (unblock_raw / max_log_unblocks).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let height = phase2.critical_path_score.get(&impact.id).copied().unwrap_or(1);
            let status = status_by_id.get(impact.id.as_str()).copied().unwrap_or(Status::Open);
            let is_quick_win = height <= config.quick_win_max_depth as usize && status != Status::InProgress;
            let quick_win_normalized = if is_quick_win { 1.0 } else { 0.0 };

            let score = config.triage_base_weight * impact.score
                + config.triage_unblock_weight * unblock_normalized
                + config.triage_quick_win_weight * quick_win_normalized;

            TriageScore {
                id: impact.id.clone(),
                impact_score: impact.score,
                unblock_boost: unblock_normalized,
                quick_win_boost: quick_win_normalized,
                score,
                direct_unblocks,
                is_quick_win,
                factors_pending: RESERVED_FACTORS.iter().map(|s| s.to_string()).collect(),
            }
        })
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImpactWeights;
    use crate::feedback::NoWeightFeedback;
    use crate::graph::{Dependency, IssueType};
    use crate::score::impact::compute_impact_scores;
    use chrono::Utc;

    fn issue(id: &str, status: Status, deps: Vec<&str>) -> Issue {
        Issue {
            id: id.to_string(),
            title: id.to_string(),
            description: None,
            status,
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
    fn diamond_root_gets_unblock_boost_from_two_dependents() {
        let issues = vec![
            issue("root", Status::Open, vec![]),
            issue("mid1", Status::Open, vec!["root"]),
            issue("mid2", Status::Open, vec!["root"]),
        ];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let phase2 = Phase2Snapshot::default();
        let impact = compute_impact_scores(&issues, &graph, &phase2, &ImpactWeights::default(), &[], Utc::now(), &NoWeightFeedback);
        let triage = compute_triage_scores(&issues, &graph, &phase2, &impact, &ScoringConfig::default());
        let root = triage.iter().find(|t| t.id == "root").unwrap();
        assert_eq!(root.direct_unblocks, 2);
        assert!(root.unblock_boost > 0.0);
    }

    #[test]
    fn shallow_open_issue_is_a_quick_win() {
        let issues = vec![issue("a", Status::Open, vec![])];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let mut phase2 = Phase2Snapshot::default();
        phase2.critical_path_score.insert("a".to_string(), 1);
        let impact = compute_impact_scores(&issues, &graph, &phase2, &ImpactWeights::default(), &[], Utc::now(), &NoWeightFeedback);
        let triage = compute_triage_scores(&issues, &graph, &phase2, &impact, &ScoringConfig::default());
        assert!(triage[0].is_quick_win);
    }

    #[test]
    fn in_progress_issue_is_never_a_quick_win() {
        let issues = vec![issue("a", Status::InProgress, vec![])];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let mut phase2 = Phase2Snapshot::default();
        phase2.critical_path_score.insert("a".to_string(), 1);
        let impact = compute_impact_scores(&issues, &graph, &phase2, &ImpactWeights::default(), &[], Utc::now(), &NoWeightFeedback);
        let triage = compute_triage_scores(&issues, &graph, &phase2, &impact, &ScoringConfig::default());
        assert!(!triage[0].is_quick_win);
    }

    #[test]
    fn deep_blocker_chain_is_not_a_quick_win() {
        let issues = vec![
            issue("a", Status::Open, vec![]),
            issue("b", Status::Open, vec!["a"]),
            issue("c", Status::Open, vec!["b"]),
            issue("d", Status::Open, vec!["c"]),
        ];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let mut phase2 = Phase2Snapshot::default();
        phase2.critical_path_score.insert("a".to_string(), 1);
        phase2.critical_path_score.insert("b".to_string(), 2);
        phase2.critical_path_score.insert("c".to_string(), 3);
        phase2.critical_path_score.insert("d".to_string(), 4);
        let impact = compute_impact_scores(&issues, &graph, &phase2, &ImpactWeights::default(), &[], Utc::now(), &NoWeightFeedback);
        let triage = compute_triage_scores(&issues, &graph, &phase2, &impact, &ScoringConfig::default());
        let d = triage.iter().find(|t| t.id == "d").unwrap();
        assert!(!d.is_quick_win);
    }

    #[test]
    fn reserved_factors_are_reported_as_pending() {
        let issues = vec![issue("a", Status::Open, vec![])];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let phase2 = Phase2Snapshot::default();
        let impact = compute_impact_scores(&issues, &graph, &phase2, &ImpactWeights::default(), &[], Utc::now(), &NoWeightFeedback);
        let triage = compute_triage_scores(&issues, &graph, &phase2, &impact, &ScoringConfig::default());
        assert_eq!(triage[0].factors_pending.len(), 3);
        assert!(triage[0].factors_pending.contains(&"claim_penalty".to_string()));
    }
}
