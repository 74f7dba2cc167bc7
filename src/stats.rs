//! The two-tier `GraphStats` publication model: Phase-1 fields are readable
//! immediately; Phase-2 fields require observing the completion signal or
//! acquiring the shared snapshot lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::config::AnalysisConfig;
use crate::harness::MetricStatus;
use crate::phase1::Phase1Stats;

/// Everything Phase-2 produces, built once and swapped in atomically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Phase2Snapshot {
    pub pagerank: HashMap<String, f64>,
    pub betweenness: HashMap<String, f64>,
    pub eigenvector: HashMap<String, f64>,
    pub hubs: HashMap<String, f64>,
    pub authorities: HashMap<String, f64>,
    pub critical_path_score: HashMap<String, usize>,
    pub core_number: HashMap<String, usize>,
    pub articulation: HashSet<String>,
    pub slack: HashMap<String, usize>,
    pub critical_path_length: usize,
    pub cycles: Vec<Vec<String>>,
    pub status: HashMap<String, MetricStatus>,
}

/// Immutable-after-completion stats object for one analysis invocation.
///
/// Phase-1 fields are plain data, safe to read the instant `GraphStats` is
/// constructed. Phase-2 fields live behind an `Arc<RwLock<Option<..>>>` that
/// starts `None` and is written exactly once, under lock, by whichever task
/// finishes Phase-2; `ready_notify` is fired at the same moment so async
/// readers can await it instead of polling the lock.
#[derive(Debug, Clone)]
pub struct GraphStats {
    pub phase1: Phase1Stats,
    pub config: AnalysisConfig,
    phase2: Arc<RwLock<Option<Phase2Snapshot>>>,
    ready_notify: Arc<Notify>,
}

impl GraphStats {
    pub fn new(phase1: Phase1Stats, config: AnalysisConfig) -> Self {
        GraphStats {
            phase1,
            config,
            phase2: Arc::new(RwLock::new(None)),
            ready_notify: Arc::new(Notify::new()),
        }
    }

    /// Construct a stats object that is already Phase-2-ready (used by cache
    /// hits, which must return a ready result synchronously, even under a
    /// cancelled caller token).
    pub fn ready(phase1: Phase1Stats, config: AnalysisConfig, snapshot: Phase2Snapshot) -> Self {
        let stats = Self::new(phase1, config);
        stats.publish(snapshot);
        stats
    }

    pub fn phase2_ready(&self) -> bool {
        self.phase2.read().expect("stats lock poisoned").is_some()
    }

    /// Publish the Phase-2 snapshot exactly once and fire the completion event.
    pub fn publish(&self, snapshot: Phase2Snapshot) {
        let mut guard = self.phase2.write().expect("stats lock poisoned");
        *guard = Some(snapshot);
        drop(guard);
        self.ready_notify.notify_waiters();
    }

    /// Block (async) until Phase-2 publication completes, then return a copy.
    ///
    /// Registers the `Notified` future *before* re-checking the snapshot, per
    /// `Notify`'s documented idiom: `notify_waiters()` only wakes futures
    /// that already exist at the moment it fires, so checking first and
    /// registering second can race `publish()` and hang forever.
    pub async fn wait_phase2(&self) -> Phase2Snapshot {
        loop {
            let notified = self.ready_notify.notified();
            if let Some(snapshot) = self.phase2.read().expect("stats lock poisoned").clone() {
                return snapshot;
            }
            notified.await;
        }
    }

    /// Non-blocking peek: `Some(snapshot)` if Phase-2 has published, else `None`.
    pub fn try_phase2(&self) -> Option<Phase2Snapshot> {
        self.phase2.read().expect("stats lock poisoned").clone()
    }
}
