//! The final `TriageReport` tree (§3, §6): deterministic, serializable, and
//! the sole output surface of the core. Every sequence here is produced by
//! an upstream step that already sorts by its documented key, so assembly
//! only has to wire the pieces together.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::assembly::{
    self, Counts, GraphHealth, LabelGroup, QuickWin, StalenessEntry, Track, Velocity,
};
use crate::config::Config;
use crate::feedback::WeightFeedback;
use crate::graph::{AnalysisGraph, Issue};
use crate::history::HistoryProvider;
use crate::recommend::{self, Recommendation};
use crate::score::{self, TriageScore};
use crate::stats::Phase2Snapshot;

const REPORT_VERSION: &str = "1.0.0";
const BLOCKERS_TO_CLEAR_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub phase2_ready: bool,
    pub issue_count: usize,
    pub compute_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickRef {
    pub counts: Counts,
    pub top_picks: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockerToClear {
    pub id: String,
    pub unblocks: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectHealth {
    pub counts: Counts,
    pub graph_health: GraphHealth,
    pub velocity: Velocity,
    pub staleness: Option<Vec<StalenessEntry>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Commands {
    pub claim_top: String,
    pub show_top: String,
    pub list_ready: String,
    pub list_blocked: String,
    pub refresh_triage: String,
}

fn build_commands(top_pick: Option<&str>) -> Commands {
    let list_ready = "CI=1 br list --ready --json".to_string();
    let list_blocked = "CI=1 br list --blocked --json".to_string();
    let refresh_triage = "CI=1 br triage --json".to_string();
    match top_pick {
        Some(id) => Commands {
            claim_top: format!("CI=1 br claim {id} --json"),
            show_top: format!("CI=1 br show {id} --json"),
            list_ready,
            list_blocked,
            refresh_triage,
        },
        None => Commands {
            claim_top: format!("{list_ready}  # no top pick available"),
            show_top: format!("{list_ready}  # no top pick available"),
            list_ready,
            list_blocked,
            refresh_triage,
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TriageReport {
    pub meta: ReportMeta,
    pub quick_ref: QuickRef,
    pub recommendations: Vec<Recommendation>,
    pub quick_wins: Vec<QuickWin>,
    pub blockers_to_clear: Vec<BlockerToClear>,
    pub project_health: ProjectHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<String>>,
    pub commands: Commands,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations_by_track: Option<Vec<Track>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations_by_label: Option<Vec<LabelGroup>>,
}

fn build_alerts(graph_health: &GraphHealth, staleness: &Option<Vec<StalenessEntry>>) -> Option<Vec<String>> {
    let mut alerts = Vec::new();
    if graph_health.has_cycles {
        alerts.push(format!("{} unresolved dependency cycle(s) detected", graph_health.cycle_count));
    }
    if let Some(stale) = staleness {
        if !stale.is_empty() {
            alerts.push(format!("{} open issue(s) idle past the staleness threshold", stale.len()));
        }
    }
    if alerts.is_empty() {
        None
    } else {
        Some(alerts)
    }
}

fn build_blockers_to_clear(unblocks: &HashMap<String, Vec<String>>) -> Vec<BlockerToClear> {
    let mut blockers: Vec<BlockerToClear> = unblocks
        .iter()
        .map(|(id, dependents)| BlockerToClear {
            id: id.clone(),
            unblocks: dependents.len(),
        })
        .collect();
    blockers.sort_by(|a, b| b.unblocks.cmp(&a.unblocks).then_with(|| a.id.cmp(&b.id)));
    blockers.truncate(BLOCKERS_TO_CLEAR_LIMIT);
    blockers
}

/// Assembles a complete [`TriageReport`] from the pieces computed by
/// `score`, `recommend`, and `assembly`. This is a pure function over
/// already-computed data; the async Phase-2 wait happens upstream.
#[allow(clippy::too_many_arguments)]
pub fn build_report(
    issues: &[Issue],
    graph: &AnalysisGraph,
    phase2: &Phase2Snapshot,
    config: &Config,
    history: &dyn HistoryProvider,
    feedback: &dyn WeightFeedback,
    phase2_ready: bool,
    compute_ms: u64,
    now: DateTime<Utc>,
) -> TriageReport {
    let impact_scores = score::compute_impact_scores(
        issues,
        graph,
        phase2,
        &config.scoring.impact_weights,
        &config.scoring.urgency_labels,
        now,
        feedback,
    );
    let triage_scores: Vec<TriageScore> = score::compute_triage_scores(issues, graph, phase2, &impact_scores, &config.scoring);
    let recommendations = recommend::generate_recommendations(issues, graph, &triage_scores, 0.0, now);

    let unblocks = assembly::unblocks_map(issues, graph);
    let depths = assembly::track_depths(issues, graph);
    let tracks = assembly::build_tracks(&recommendations, &depths, &unblocks);
    let by_label = assembly::group_by_label(issues, &recommendations);
    let counts = assembly::compute_counts(issues, graph);
    let quick_wins = assembly::compute_quick_wins(issues, graph, &unblocks);
    let picks = assembly::default_top_picks(&recommendations);
    let velocity = assembly::compute_velocity(issues, now);
    let graph_health = assembly::compute_graph_health(graph.density(), &phase2.cycles, &phase2.articulation);
    let staleness = {
        let entries = assembly::compute_staleness(issues, history, assembly::default_staleness_threshold(), now);
        if entries.is_empty() { None } else { Some(entries) }
    };

    let alerts = build_alerts(&graph_health, &staleness);
    let blockers_to_clear = build_blockers_to_clear(&unblocks);
    let commands = build_commands(picks.first().map(|s| s.as_str()));

    TriageReport {
        meta: ReportMeta {
            version: REPORT_VERSION.to_string(),
            generated_at: now,
            phase2_ready,
            issue_count: issues.len(),
            compute_ms,
        },
        quick_ref: QuickRef {
            counts: counts.clone(),
            top_picks: picks,
        },
        recommendations,
        quick_wins,
        blockers_to_clear,
        project_health: ProjectHealth {
            counts,
            graph_health,
            velocity,
            staleness,
        },
        alerts,
        commands,
        recommendations_by_track: Some(tracks),
        recommendations_by_label: Some(by_label),
    }
}
