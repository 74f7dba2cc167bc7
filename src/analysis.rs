//! Top-level orchestration: `issues -> GraphBuilder -> Phase-1 (sync) ->
//! Phase-2 (background, cancellable) -> GraphStats`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AnalysisConfig, BetweennessMode};
use crate::error::AnalysisError;
use crate::graph::AnalysisGraph;
use crate::harness::{self, CancellationToken, MetricOutcome, MetricStatus};
use crate::metrics::{betweenness, critical_path, cycles, eigenvector, hits, kcore, pagerank, slack};
use crate::phase1;
use crate::stats::{GraphStats, Phase2Snapshot};

/// Runs Phase-1 synchronously and schedules Phase-2 on the background
/// runtime; returns as soon as Phase-1 completes. Callers that need Phase-2
/// data should `.wait_phase2()` on the returned stats, or use [`analyze_sync`].
pub async fn analyze_async(
    issues: &[crate::graph::Issue],
    config: AnalysisConfig,
    cancel: CancellationToken,
) -> Result<Arc<GraphStats>, AnalysisError> {
    let graph = AnalysisGraph::build(issues)?;
    let config = config.adapt_to_size(graph.node_count(), graph.edge_count());
    let p1 = phase1::compute(&graph);
    let stats = Arc::new(GraphStats::new(p1, config.clone()));

    let stats_for_phase2 = stats.clone();
    tokio::spawn(run_phase2(graph, config, cancel, stats_for_phase2));

    Ok(stats)
}

/// Blocks on Phase-2 completion before returning.
pub async fn analyze_sync(
    issues: &[crate::graph::Issue],
    config: AnalysisConfig,
    cancel: CancellationToken,
) -> Result<Arc<GraphStats>, AnalysisError> {
    let stats = analyze_async(issues, config, cancel).await?;
    stats.wait_phase2().await;
    Ok(stats)
}

async fn run_phase2(graph: AnalysisGraph, config: AnalysisConfig, cancel: CancellationToken, stats: Arc<GraphStats>) {
    let graph = Arc::new(graph);
    let mut status: HashMap<String, MetricStatus> = HashMap::new();

    let timeout = config.metric_timeout();

    // Each metric carries its own independent timeout, so per §5's "parallel
    // threads with cooperative cancellation" scheduling model they are raced
    // concurrently rather than chained — wall-clock is the max of the
    // enabled metrics' timeouts, not their sum.
    let pagerank_fut = {
        let g = graph.clone();
        harness::run_metric(config.enable_pagerank, timeout, cancel.clone(), move |cancel| match pagerank::pagerank(&g, &cancel) {
            Some(result) => MetricOutcome::Computed(result),
            None => MetricOutcome::Cancelled,
        })
    };

    let betweenness_fut = {
        let g = graph.clone();
        let mode = config.betweenness_mode;
        let sample_size = config.betweenness_sample_size;
        let n = graph.node_count();
        harness::run_metric(config.enable_betweenness, timeout, cancel.clone(), move |cancel| match mode {
            BetweennessMode::Exact => betweenness::betweenness_exact(&g, &cancel)
                .map(MetricOutcome::Computed)
                .unwrap_or(MetricOutcome::Cancelled),
            BetweennessMode::Approximate => match betweenness::betweenness_approximate(&g, sample_size, 0xC0FFEE, &cancel) {
                Some((values, clamped)) if clamped >= n => MetricOutcome::Computed(values),
                Some((values, clamped)) => MetricOutcome::Approx(values, clamped),
                None => MetricOutcome::Cancelled,
            },
        })
    };

    let eigen_fut = {
        let g = graph.clone();
        harness::run_metric(config.enable_eigenvector, timeout, cancel.clone(), move |cancel| match eigenvector::eigenvector(&g, &cancel) {
            Some(result) => MetricOutcome::Computed(result),
            None => MetricOutcome::Cancelled,
        })
    };

    let hits_fut = {
        let g = graph.clone();
        harness::run_metric(config.enable_hits, timeout, cancel.clone(), move |cancel| match hits::hits(&g, &cancel) {
            Some(Some(result)) => MetricOutcome::Computed(Some(result)),
            Some(None) => MetricOutcome::Computed(None),
            None => MetricOutcome::Cancelled,
        })
    };

    let cycles_fut = {
        let g = graph.clone();
        let max_cycles = config.max_cycles_to_store;
        harness::run_metric(config.enable_cycles, timeout, cancel.clone(), move |cancel| match cycles::find_cycles(&g, max_cycles, &cancel) {
            Some((found, truncated)) => MetricOutcome::Computed((found, truncated)),
            None => MetricOutcome::Cancelled,
        })
    };

    let core_fut = {
        let g = graph.clone();
        harness::run_metric(config.enable_kcore_articulation, timeout, cancel.clone(), move |cancel| match kcore::k_core(&g, &cancel) {
            Some(result) => MetricOutcome::Computed(result),
            None => MetricOutcome::Cancelled,
        })
    };

    let articulation_fut = {
        let g = graph.clone();
        harness::run_metric(config.enable_kcore_articulation, timeout, cancel.clone(), move |cancel| {
            match kcore::articulation_points(&g, &cancel) {
                Some(result) => MetricOutcome::Computed(result),
                None => MetricOutcome::Cancelled,
            }
        })
    };

    let (
        (pagerank_result, pr_status),
        (bc_result, bc_status),
        (eigen_result, eigen_status),
        (hits_result, hits_status),
        (cycles_result, cycles_status),
        (core_result, core_status),
        (art_result, art_status),
    ) = tokio::join!(pagerank_fut, betweenness_fut, eigen_fut, hits_fut, cycles_fut, core_fut, articulation_fut);

    let pagerank_map = pagerank_result.unwrap_or_else(|| pagerank::uniform_fallback(&graph));
    status.insert("pagerank".to_string(), pr_status);

    let betweenness_map = bc_result.unwrap_or_default();
    status.insert("betweenness".to_string(), bc_status);

    let eigenvector_map = eigen_result.unwrap_or_default();
    status.insert("eigenvector".to_string(), eigen_status);

    let (hubs_map, authorities_map) = match hits_result.flatten() {
        Some((h, a)) => (h, a),
        None => (HashMap::new(), HashMap::new()),
    };
    status.insert("hits".to_string(), hits_status);

    // Critical path (pure, synchronous, driven off Phase-1's topological order).
    let cp_status = if config.enable_critical_path {
        MetricStatus::computed(std::time::Duration::from_millis(0))
    } else {
        MetricStatus::skipped("disabled by config")
    };
    let critical_path_map = if config.enable_critical_path {
        critical_path::critical_path_score(&stats.phase1.topological_order, |id| graph.blockers_of(id))
    } else {
        HashMap::new()
    };
    status.insert("critical_path".to_string(), cp_status);

    // Slack (pure, synchronous).
    let slack_status = if config.enable_slack {
        MetricStatus::computed(std::time::Duration::from_millis(0))
    } else {
        MetricStatus::skipped("disabled by config")
    };
    let slack_result = if config.enable_slack {
        slack::compute(&graph, &stats.phase1.topological_order)
    } else {
        crate::metrics::slack::SlackResult {
            slack: HashMap::new(),
            critical_path_length: 0,
        }
    };
    status.insert("slack".to_string(), slack_status);

    // Cycles
    let cycles_list = match cycles_result {
        Some((found, truncated)) => {
            if truncated {
                status.insert(
                    "cycles".to_string(),
                    MetricStatus {
                        reason: Some("truncated".to_string()),
                        ..cycles_status
                    },
                );
            } else {
                status.insert("cycles".to_string(), cycles_status);
            }
            found
        }
        None => {
            status.insert("cycles".to_string(), cycles_status);
            Vec::new()
        }
    };

    // k-core + articulation
    let core_number = core_result.unwrap_or_default();
    status.insert("k_core".to_string(), core_status);

    let articulation = art_result.unwrap_or_default();
    status.insert("articulation".to_string(), art_status);

    let snapshot = Phase2Snapshot {
        pagerank: pagerank_map,
        betweenness: betweenness_map,
        eigenvector: eigenvector_map,
        hubs: hubs_map,
        authorities: authorities_map,
        critical_path_score: critical_path_map,
        core_number,
        articulation,
        slack: slack_result.slack,
        critical_path_length: slack_result.critical_path_length,
        cycles: cycles_list,
        status,
    };

    stats.publish(snapshot);
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

    #[tokio::test]
    async fn empty_issue_set_yields_ready_empty_stats() {
        let stats = analyze_sync(&[], AnalysisConfig::default(), CancellationToken::new()).await.unwrap();
        assert!(stats.phase2_ready());
        let snapshot = stats.try_phase2().unwrap();
        assert!(snapshot.pagerank.is_empty());
        assert!(snapshot.cycles.is_empty());
    }

    #[tokio::test]
    async fn chain_produces_expected_critical_path() {
        let issues = vec![issue("a", vec![]), issue("b", vec!["a"]), issue("c", vec!["b"])];
        let stats = analyze_sync(&issues, AnalysisConfig::default(), CancellationToken::new()).await.unwrap();
        let snapshot = stats.try_phase2().unwrap();
        assert_eq!(snapshot.critical_path_score["c"], 3);
        assert!(snapshot.cycles.is_empty());
    }

    #[tokio::test]
    async fn cycle_of_three_is_detected_and_topological_order_empty() {
        let mut a = issue("a", vec![]);
        a.dependencies = vec![Dependency::blocking("c")];
        let b = issue("b", vec!["a"]);
        let c = issue("c", vec!["b"]);
        let issues = vec![a, b, c];
        let stats = analyze_sync(&issues, AnalysisConfig::default(), CancellationToken::new()).await.unwrap();
        assert!(stats.phase1.topological_order.is_empty());
        let snapshot = stats.try_phase2().unwrap();
        assert!(!snapshot.cycles.is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_fatal() {
        let issues = vec![issue("a", vec![]), issue("a", vec![])];
        let err = analyze_sync(&issues, AnalysisConfig::default(), CancellationToken::new()).await;
        assert!(err.is_err());
    }
}
