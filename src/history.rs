//! The history collaborator (§6): an optional external source of per-issue
//! commit/event activity, consumed only by staleness computation. Ingestion
//! and storage live outside the core; this module defines the contract and a
//! no-op implementation for callers that have nothing to supply.

use chrono::{DateTime, Utc};

use crate::error::QueryError;

#[derive(Debug, Clone)]
pub struct HistoryEvent {
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct IssueHistory {
    pub events: Vec<HistoryEvent>,
    pub commits: Vec<HistoryEvent>,
}

impl IssueHistory {
    /// The later of the last event and last commit timestamp, or `None` if
    /// this history has no recorded activity at all.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.events
            .iter()
            .chain(self.commits.iter())
            .map(|e| e.timestamp)
            .max()
    }
}

/// External collaborator supplying per-issue activity history. The core
/// never writes to it.
pub trait HistoryProvider {
    fn history_for(&self, issue_id: &str) -> Result<Option<IssueHistory>, QueryError>;
}

/// Default provider for callers with no history backend wired up: every
/// lookup reports "no history", which causes staleness to fall back to
/// `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct NoHistoryProvider;

impl HistoryProvider for NoHistoryProvider {
    fn history_for(&self, _issue_id: &str) -> Result<Option<IssueHistory>, QueryError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn no_history_provider_always_returns_none() {
        let provider = NoHistoryProvider;
        assert!(provider.history_for("anything").unwrap().is_none());
    }

    #[test]
    fn last_activity_is_the_max_of_events_and_commits() {
        let now = Utc::now();
        let history = IssueHistory {
            events: vec![HistoryEvent { timestamp: now - Duration::days(5) }],
            commits: vec![HistoryEvent { timestamp: now - Duration::days(1) }],
        };
        assert_eq!(history.last_activity(), Some(now - Duration::days(1)));
    }

    #[test]
    fn empty_history_has_no_last_activity() {
        let history = IssueHistory::default();
        assert!(history.last_activity().is_none());
    }
}
