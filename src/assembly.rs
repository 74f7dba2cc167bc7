//! Triage assembly (§4.6): unblock map, track layering, label grouping,
//! health counts, quick wins, top picks, and velocity. This is the layer
//! that turns ranked recommendations into the shape of a [`crate::report::TriageReport`].

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::graph::{AnalysisGraph, Issue, Status};
use crate::history::{HistoryProvider, IssueHistory};
use crate::recommend::Recommendation;

const CYCLE_DEPTH: u32 = 999;
const DEFAULT_TOP_PICKS: usize = 5;
const DEFAULT_VELOCITY_WEEKS: usize = 8;
const DEFAULT_STALENESS_DAYS: i64 = 14;

/// For every open blocker `v`, the open dependents `u` for which `v` is the
/// *only* open blocking edge. Computed in O(V+E): precompute each open
/// issue's open-blocker count once, then scan dependents per blocker.
pub fn unblocks_map(issues: &[Issue], graph: &AnalysisGraph) -> HashMap<String, Vec<String>> {
    let status_by_id: HashMap<&str, Status> = issues.iter().map(|i| (i.id.as_str(), i.status)).collect();
    let is_open = |id: &str| status_by_id.get(id).map(|s| !s.is_closed_like()).unwrap_or(false);

    let mut open_blocker_count: HashMap<String, usize> = HashMap::new();
    for issue in issues {
        if !is_open(&issue.id) {
            continue;
        }
        let count = graph.blockers_of(&issue.id).into_iter().filter(|b| is_open(b)).count();
        open_blocker_count.insert(issue.id.clone(), count);
    }

    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    for issue in issues {
        if !is_open(&issue.id) {
            continue;
        }
        let mut dependents: Vec<String> = graph
            .dependents_of(&issue.id)
            .into_iter()
            .filter(|d| is_open(d) && open_blocker_count.get(d).copied().unwrap_or(0) == 1)
            .collect();
        dependents.sort();
        if !dependents.is_empty() {
            map.insert(issue.id.clone(), dependents);
        }
    }
    map
}

/// BFS depth by open-blocker count: items with no open blockers are depth 0;
/// items blocked only by depth-(d-1) items are depth d. Nodes unreachable by
/// this process (stuck behind a cycle) are bucketed at [`CYCLE_DEPTH`].
pub fn track_depths(issues: &[Issue], graph: &AnalysisGraph) -> HashMap<String, u32> {
    let status_by_id: HashMap<&str, Status> = issues.iter().map(|i| (i.id.as_str(), i.status)).collect();
    let is_open = |id: &str| status_by_id.get(id).map(|s| !s.is_closed_like()).unwrap_or(false);
    let open_ids: Vec<&str> = issues.iter().filter(|i| is_open(&i.id)).map(|i| i.id.as_str()).collect();

    let mut remaining_open_blockers: HashMap<String, usize> = open_ids
        .iter()
        .map(|id| (id.to_string(), graph.blockers_of(id).into_iter().filter(|b| is_open(b)).count()))
        .collect();

    let mut depth: HashMap<String, u32> = HashMap::new();
    let mut sorted_initial: Vec<String> = remaining_open_blockers
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(id, _)| id.clone())
        .collect();
    sorted_initial.sort();
    for id in &sorted_initial {
        depth.insert(id.clone(), 0);
    }
    let mut queue: VecDeque<String> = sorted_initial.into();

    while let Some(current) = queue.pop_front() {
        let current_depth = depth[&current];
        let mut dependents: Vec<String> = graph.dependents_of(&current).into_iter().filter(|d| is_open(d)).collect();
        dependents.sort();
        for dependent in dependents {
            if let Some(count) = remaining_open_blockers.get_mut(&dependent) {
                *count = count.saturating_sub(1);
                if *count == 0 && !depth.contains_key(&dependent) {
                    depth.insert(dependent.clone(), current_depth + 1);
                    queue.push_back(dependent);
                }
            }
        }
    }

    for id in open_ids {
        depth.entry(id.to_string()).or_insert(CYCLE_DEPTH);
    }
    depth
}

fn track_label(depth: u32) -> String {
    if depth == CYCLE_DEPTH {
        return "track-cycle".to_string();
    }
    let mut label = String::new();
    let mut n = depth;
    loop {
        label.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
        if n == 0 {
            break;
        }
        n -= 1;
    }
    format!("track-{label}")
}

#[derive(Debug, Clone, Serialize)]
pub struct Track {
    pub id: String,
    pub depth: u32,
    pub reason: String,
    pub issue_ids: Vec<String>,
    pub top_pick: Option<String>,
    pub claim_command: Option<String>,
    pub unblocks_total: usize,
}

pub fn build_tracks(recommendations: &[Recommendation], depths: &HashMap<String, u32>, unblocks: &HashMap<String, Vec<String>>) -> Vec<Track> {
    let mut by_depth: HashMap<u32, Vec<&Recommendation>> = HashMap::new();
    for rec in recommendations {
        let depth = depths.get(&rec.id).copied().unwrap_or(CYCLE_DEPTH);
        by_depth.entry(depth).or_default().push(rec);
    }

    let mut depths_sorted: Vec<u32> = by_depth.keys().copied().collect();
    depths_sorted.sort();

    depths_sorted
        .into_iter()
        .map(|depth| {
            let mut members = by_depth.remove(&depth).unwrap();
            members.sort_by(|a, b| b.confidence.total_cmp(&a.confidence).then_with(|| a.id.cmp(&b.id)));
            let issue_ids: Vec<String> = members.iter().map(|r| r.id.clone()).collect();
            let top_pick = members.first().map(|r| r.id.clone());
            let unblocks_total = issue_ids.iter().map(|id| unblocks.get(id).map(|v| v.len()).unwrap_or(0)).sum();
            let reason = if depth == CYCLE_DEPTH {
                "part of an unresolved dependency cycle".to_string()
            } else if depth == 0 {
                "no open blockers, ready to start now".to_string()
            } else {
                format!("unblocked once all depth-{} items close", depth - 1)
            };
            let claim_command = top_pick.as_ref().map(|id| format!("CI=1 br claim {id} --json"));

            Track {
                id: track_label(depth),
                depth,
                reason,
                issue_ids,
                top_pick,
                claim_command,
                unblocks_total,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct LabelGroup {
    pub label: String,
    pub issue_ids: Vec<String>,
}

/// Group recommendation ids by each issue's primary label, sorted ascending
/// by label then by id within the group.
pub fn group_by_label(issues: &[Issue], recommendations: &[Recommendation]) -> Vec<LabelGroup> {
    let label_by_id: HashMap<&str, String> = issues.iter().map(|i| (i.id.as_str(), i.primary_label())).collect();
    let mut groups: HashMap<String, Vec<String>> = HashMap::new();
    for rec in recommendations {
        let label = label_by_id.get(rec.id.as_str()).cloned().unwrap_or_else(|| "unlabeled".to_string());
        groups.entry(label).or_default().push(rec.id.clone());
    }
    let mut result: Vec<LabelGroup> = groups
        .into_iter()
        .map(|(label, mut issue_ids)| {
            issue_ids.sort();
            LabelGroup { label, issue_ids }
        })
        .collect();
    result.sort_by(|a, b| a.label.cmp(&b.label));
    result
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Counts {
    pub by_status: HashMap<String, usize>,
    pub by_type: HashMap<String, usize>,
    pub by_priority: HashMap<u8, usize>,
    pub open: usize,
    pub closed: usize,
    pub actionable: usize,
    pub blocked: usize,
}

fn status_key(status: Status) -> &'static str {
    use Status::*;
    match status {
        Open => "open",
        InProgress => "in_progress",
        Blocked => "blocked",
        Closed => "closed",
        Tombstone => "tombstone",
    }
}

fn type_key(issue_type: crate::graph::IssueType) -> &'static str {
    use crate::graph::IssueType::*;
    match issue_type {
        Bug => "bug",
        Task => "task",
        Chore => "chore",
        Feature => "feature",
        Epic => "epic",
    }
}

pub fn compute_counts(issues: &[Issue], graph: &AnalysisGraph) -> Counts {
    let status_by_id: HashMap<&str, Status> = issues.iter().map(|i| (i.id.as_str(), i.status)).collect();
    let is_open = |id: &str| status_by_id.get(id).map(|s| !s.is_closed_like()).unwrap_or(false);

    let mut counts = Counts::default();
    for issue in issues {
        *counts.by_status.entry(status_key(issue.status).to_string()).or_insert(0) += 1;
        *counts.by_type.entry(type_key(issue.issue_type).to_string()).or_insert(0) += 1;
        *counts.by_priority.entry(issue.priority).or_insert(0) += 1;

        if issue.status.is_closed_like() {
            counts.closed += 1;
            continue;
        }
        counts.open += 1;
        let has_open_blocker = graph.blockers_of(&issue.id).iter().any(|b| is_open(b));
        if has_open_blocker {
            counts.blocked += 1;
        } else {
            counts.actionable += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, Serialize)]
pub struct QuickWin {
    pub id: String,
    pub score: f64,
}

fn blocker_ratio_simplicity(ratio: f64) -> f64 {
    if ratio < 0.2 {
        1.0
    } else if ratio < 0.4 {
        0.5
    } else {
        0.0
    }
}

pub fn compute_quick_wins(issues: &[Issue], graph: &AnalysisGraph, unblocks: &HashMap<String, Vec<String>>) -> Vec<QuickWin> {
    let max_in_degree = issues.iter().map(|i| graph.in_degree(&i.id) as f64).fold(0.0_f64, f64::max);

    let mut wins: Vec<QuickWin> = issues
        .iter()
        .filter(|i| !i.status.is_closed_like())
        .map(|issue| {
            let unblocks_count = unblocks.get(&issue.id).map(|v| v.len()).unwrap_or(0);
            let ratio = if max_in_degree > 0.0 { graph.in_degree(&issue.id) as f64 / max_in_degree } else { 0.0 };
            let simplicity = blocker_ratio_simplicity(ratio);
            let priority_bonus = if issue.priority <= 1 { 0.5 } else { 0.0 };
            let score = 0.4 * (1.0 + unblocks_count as f64).log2() + 0.4 * simplicity + 0.2 * priority_bonus;
            QuickWin { id: issue.id.clone(), score }
        })
        .collect();

    wins.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    wins
}

/// Up to `limit` highest-scoring recommendations that have no open blockers.
pub fn top_picks(recommendations: &[Recommendation], limit: usize) -> Vec<String> {
    recommendations
        .iter()
        .filter(|r| r.blocked_by.is_empty())
        .take(limit)
        .map(|r| r.id.clone())
        .collect()
}

pub fn default_top_picks(recommendations: &[Recommendation]) -> Vec<String> {
    top_picks(recommendations, DEFAULT_TOP_PICKS)
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyBucket {
    /// Monday 00:00 UTC that opens this ISO week.
    pub week_start: DateTime<Utc>,
    pub closed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Velocity {
    pub closed_last_7_days: usize,
    pub closed_last_30_days: usize,
    pub avg_days_to_close: Option<f64>,
    pub weekly_buckets: Vec<WeeklyBucket>,
    pub estimated: bool,
}

fn monday_of(dt: DateTime<Utc>) -> DateTime<Utc> {
    let days_since_monday = dt.weekday().num_days_from_monday() as i64;
    (dt - Duration::days(days_since_monday))
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// `closed_at` preferred; falls back to `updated_at` and marks the whole
/// result `estimated` when any closed issue lacked `closed_at`.
pub fn compute_velocity(issues: &[Issue], now: DateTime<Utc>) -> Velocity {
    let mut estimated = false;
    let closed_timestamps: Vec<DateTime<Utc>> = issues
        .iter()
        .filter(|i| i.status.is_closed_like())
        .map(|i| {
            i.closed_at.unwrap_or_else(|| {
                estimated = true;
                i.updated_at
            })
        })
        .collect();

    let closed_last_7_days = closed_timestamps.iter().filter(|t| now - **t <= Duration::days(7)).count();
    let closed_last_30_days = closed_timestamps.iter().filter(|t| now - **t <= Duration::days(30)).count();

    let avg_days_to_close = {
        let durations: Vec<f64> = issues
            .iter()
            .filter(|i| i.status.is_closed_like())
            .map(|i| {
                let closed = i.closed_at.unwrap_or(i.updated_at);
                (closed - i.created_at).num_seconds() as f64 / 86_400.0
            })
            .collect();
        if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        }
    };

    let this_monday = monday_of(now);
    let mut weekly_buckets = Vec::with_capacity(DEFAULT_VELOCITY_WEEKS);
    for week_offset in 0..DEFAULT_VELOCITY_WEEKS as i64 {
        let week_start = this_monday - Duration::weeks(week_offset);
        let week_end = week_start + Duration::weeks(1);
        let count = closed_timestamps.iter().filter(|t| **t >= week_start && **t < week_end).count();
        weekly_buckets.push(WeeklyBucket { week_start, closed_count: count });
    }

    Velocity {
        closed_last_7_days,
        closed_last_30_days,
        avg_days_to_close,
        weekly_buckets,
        estimated,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StalenessEntry {
    pub id: String,
    pub last_activity: DateTime<Utc>,
    pub days_idle: i64,
}

/// Consumes a [`HistoryProvider`] to find the later of history/commit
/// activity and `updated_at`, per open issue over `threshold_days`.
pub fn compute_staleness(
    issues: &[Issue],
    history: &dyn HistoryProvider,
    threshold_days: i64,
    now: DateTime<Utc>,
) -> Vec<StalenessEntry> {
    let mut entries: Vec<StalenessEntry> = issues
        .iter()
        .filter(|i| !i.status.is_closed_like())
        .filter_map(|issue| {
            let history_activity: Option<DateTime<Utc>> = history
                .history_for(&issue.id)
                .ok()
                .flatten()
                .as_ref()
                .and_then(IssueHistory::last_activity);
            let last_activity = history_activity.map(|a| a.max(issue.updated_at)).unwrap_or(issue.updated_at);
            let days_idle = (now - last_activity).num_days();
            if days_idle >= threshold_days {
                Some(StalenessEntry { id: issue.id.clone(), last_activity, days_idle })
            } else {
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| b.days_idle.cmp(&a.days_idle).then_with(|| a.id.cmp(&b.id)));
    entries
}

pub fn default_staleness_threshold() -> i64 {
    DEFAULT_STALENESS_DAYS
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphHealth {
    pub has_cycles: bool,
    pub cycle_count: usize,
    pub articulation_count: usize,
    pub density: f64,
}

pub fn compute_graph_health(density: f64, cycles: &[Vec<String>], articulation: &HashSet<String>) -> GraphHealth {
    GraphHealth {
        has_cycles: !cycles.is_empty(),
        cycle_count: cycles.len(),
        articulation_count: articulation.len(),
        density,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dependency, IssueType};
    use chrono::TimeZone;

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
    fn chain_unblocks_map_s1() {
        let issues = vec![
            issue("A", Status::Open, vec![]),
            issue("B", Status::Open, vec!["A"]),
            issue("C", Status::Open, vec!["B"]),
        ];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let map = unblocks_map(&issues, &graph);
        assert_eq!(map.get("A"), Some(&vec!["B".to_string()]));
    }

    #[test]
    fn diamond_unblocks_root_s2() {
        let issues = vec![
            issue("root", Status::Open, vec![]),
            issue("d1", Status::Open, vec!["root"]),
            issue("d2", Status::Open, vec!["root"]),
            issue("d3", Status::Open, vec!["root"]),
        ];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let map = unblocks_map(&issues, &graph);
        assert_eq!(map.get("root").unwrap().len(), 3);
    }

    #[test]
    fn cycle_of_three_lands_at_depth_999_s3() {
        let mut a = issue("A", Status::Open, vec![]);
        a.dependencies = vec![Dependency::blocking("C")];
        let b = issue("B", Status::Open, vec!["A"]);
        let c = issue("C", Status::Open, vec!["B"]);
        let issues = vec![a, b, c];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let depths = track_depths(&issues, &graph);
        assert_eq!(depths["A"], CYCLE_DEPTH);
        assert_eq!(depths["B"], CYCLE_DEPTH);
        assert_eq!(depths["C"], CYCLE_DEPTH);
    }

    #[test]
    fn tombstone_blocker_is_excluded_from_unblocks_s4() {
        let mut ghost = issue("ghost", Status::Tombstone, vec![]);
        ghost.title = "ghost".to_string();
        let live = issue("live", Status::Open, vec!["ghost"]);
        let issues = vec![ghost, live];
        let graph = AnalysisGraph::build(&issues).unwrap();
        let map = unblocks_map(&issues, &graph);
        assert!(!map.contains_key("ghost"));
    }

    #[test]
    fn velocity_7_and_30_day_boundary_s5() {
        let now = Utc.with_ymd_and_hms(2025, 12, 16, 0, 0, 0).unwrap();
        let mut a = issue("a", Status::Closed, vec![]);
        a.closed_at = Some(now - Duration::hours(7 * 24));
        let mut b = issue("b", Status::Closed, vec![]);
        b.closed_at = Some(now - Duration::hours(30 * 24));
        let issues = vec![a, b];
        let velocity = compute_velocity(&issues, now);
        assert_eq!(velocity.closed_last_7_days, 1);
        assert_eq!(velocity.closed_last_30_days, 2);
    }

    #[test]
    fn top_picks_never_includes_blocked_items() {
        let recs = vec![
            Recommendation {
                id: "a".to_string(),
                confidence: 0.9,
                reasons: vec!["x".to_string()],
                primary: "x".to_string(),
                action_hint: "default",
                blocked_by: vec!["z".to_string()],
                what_if: crate::recommend::WhatIfDelta {
                    direct_unblocks: 0,
                    transitive_unblocks: 0,
                    blocked_reduction: 0,
                    estimated_days_saved: 0.0,
                },
            },
            Recommendation {
                id: "b".to_string(),
                confidence: 0.5,
                reasons: vec!["y".to_string()],
                primary: "y".to_string(),
                action_hint: "default",
                blocked_by: vec![],
                what_if: crate::recommend::WhatIfDelta {
                    direct_unblocks: 0,
                    transitive_unblocks: 0,
                    blocked_reduction: 0,
                    estimated_days_saved: 0.0,
                },
            },
        ];
        let picks = default_top_picks(&recs);
        assert_eq!(picks, vec!["b".to_string()]);
    }

    #[test]
    fn label_grouping_defaults_to_unlabeled() {
        let issues = vec![issue("a", Status::Open, vec![])];
        let recs = vec![Recommendation {
            id: "a".to_string(),
            confidence: 0.5,
            reasons: vec!["x".to_string()],
            primary: "x".to_string(),
            action_hint: "default",
            blocked_by: vec![],
            what_if: crate::recommend::WhatIfDelta {
                direct_unblocks: 0,
                transitive_unblocks: 0,
                blocked_reduction: 0,
                estimated_days_saved: 0.0,
            },
        }];
        let grouped = group_by_label(&issues, &recs);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].label, "unlabeled");
        assert_eq!(grouped[0].issue_ids, vec!["a".to_string()]);
    }

    #[test]
    fn no_history_provider_falls_back_to_updated_at() {
        use crate::history::NoHistoryProvider;
        let mut stale = issue("a", Status::Open, vec![]);
        stale.updated_at = Utc::now() - Duration::days(20);
        let issues = vec![stale];
        let entries = compute_staleness(&issues, &NoHistoryProvider, 14, Utc::now());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a");
    }
}
