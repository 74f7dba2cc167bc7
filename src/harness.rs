//! Cooperative cancellation and the per-metric timeout/fault-isolation harness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// A cheaply-cloneable cooperative cancellation flag. Metric bodies poll
/// `is_cancelled()` at loop boundaries; nothing forcibly terminates a worker.
#[derive(Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken {
            cancelled: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-metric completion state, as published in `GraphStats.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricState {
    Pending,
    Computed,
    Approx,
    Timeout,
    Skipped,
    Panic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricStatus {
    pub state: MetricState,
    pub reason: Option<String>,
    pub sample_size: Option<usize>,
    pub elapsed_ms: Option<u64>,
}

impl MetricStatus {
    pub fn computed(elapsed: Duration) -> Self {
        MetricStatus {
            state: MetricState::Computed,
            reason: None,
            sample_size: None,
            elapsed_ms: Some(elapsed.as_millis() as u64),
        }
    }

    pub fn approx(sample_size: usize, elapsed: Duration) -> Self {
        MetricStatus {
            state: MetricState::Approx,
            reason: Some("sampled approximation".to_string()),
            sample_size: Some(sample_size),
            elapsed_ms: Some(elapsed.as_millis() as u64),
        }
    }

    pub fn timeout(elapsed: Duration) -> Self {
        MetricStatus {
            state: MetricState::Timeout,
            reason: Some("exceeded per-metric deadline".to_string()),
            sample_size: None,
            elapsed_ms: Some(elapsed.as_millis() as u64),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        MetricStatus {
            state: MetricState::Skipped,
            reason: Some(reason.into()),
            sample_size: None,
            elapsed_ms: None,
        }
    }

    pub fn panic(reason: impl Into<String>) -> Self {
        MetricStatus {
            state: MetricState::Panic,
            reason: Some(reason.into()),
            sample_size: None,
            elapsed_ms: None,
        }
    }

    pub fn pending() -> Self {
        MetricStatus {
            state: MetricState::Pending,
            reason: None,
            sample_size: None,
            elapsed_ms: None,
        }
    }
}

/// What a metric worker hands back to the harness.
pub enum MetricOutcome<T> {
    Computed(T),
    Approx(T, usize),
    Cancelled,
}

/// Runs one metric under the cancellation/timeout harness:
/// - disabled metrics are `skipped` without spawning a worker.
/// - the worker runs on a blocking thread so CPU-bound metric code never
///   blocks the async runtime.
/// - a panic inside the worker is caught by `spawn_blocking`'s `JoinError`
///   and recorded as `panic`, isolated from every other metric.
/// - exceeding the timeout abandons the worker: a detached task drains its
///   join handle so it cannot leak, and a fallback is left to the caller.
pub async fn run_metric<T, F>(
    enabled: bool,
    timeout: Duration,
    cancel: CancellationToken,
    compute: F,
) -> (Option<T>, MetricStatus)
where
    F: FnOnce(CancellationToken) -> MetricOutcome<T> + Send + 'static,
    T: Send + 'static,
{
    if !enabled {
        return (None, MetricStatus::skipped("disabled by config"));
    }

    let start = Instant::now();
    let worker_cancel = cancel.clone();
    let mut handle = tokio::task::spawn_blocking(move || compute(worker_cancel));

    tokio::select! {
        res = &mut handle => {
            match res {
                Ok(MetricOutcome::Computed(value)) => (Some(value), MetricStatus::computed(start.elapsed())),
                Ok(MetricOutcome::Approx(value, sample)) => (Some(value), MetricStatus::approx(sample, start.elapsed())),
                Ok(MetricOutcome::Cancelled) => (None, MetricStatus::skipped("cancelled")),
                Err(join_err) => (None, MetricStatus::panic(join_err.to_string())),
            }
        }
        _ = tokio::time::sleep(timeout) => {
            cancel.cancel();
            tokio::spawn(drain(handle));
            (None, MetricStatus::timeout(start.elapsed()))
        }
    }
}

async fn drain<T: Send + 'static>(handle: tokio::task::JoinHandle<T>) {
    let _ = handle.await;
}

/// Convenience for synchronous, never-times-out Phase-1-style computation
/// that still wants a status entry (e.g. when a metric is trivially empty).
pub fn immediate<T>(value: T) -> (Option<T>, MetricStatus) {
    (Some(value), MetricStatus::computed(Duration::from_millis(0)))
}
