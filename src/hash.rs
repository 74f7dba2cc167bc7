//! Deterministic content and dependency hashing, and the diff classifier
//! built on top of it. Hashes are order-independent: sorting every
//! collection before feeding it to the digest is what makes
//! `compute_data_hash(issues) == compute_data_hash(permuted(issues))` hold.

use sha2::{Digest, Sha256};

use crate::graph::Issue;

fn content_digest(issue: &Issue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(issue.id.as_bytes());
    hasher.update(issue.title.as_bytes());
    hasher.update(issue.description.as_deref().unwrap_or("").as_bytes());
    hasher.update([status_tag(issue.status)]);
    hasher.update([issue.priority]);
    hasher.update(issue_type_tag(issue.issue_type).as_bytes());

    let mut labels: Vec<String> = issue.label_set().into_iter().collect();
    labels.sort();
    hasher.update(labels.join(",").as_bytes());

    hasher.update(issue.estimated_minutes.unwrap_or(0).to_le_bytes());
    format!("{:x}", hasher.finalize())
}

fn dependency_digest(issue: &Issue) -> String {
    let mut deps: Vec<String> = issue
        .dependencies
        .iter()
        .map(|d| format!("{}:{:?}", d.to, d.dep_type))
        .collect();
    deps.sort();
    let mut hasher = Sha256::new();
    hasher.update(deps.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}

fn status_tag(status: crate::graph::Status) -> u8 {
    use crate::graph::Status::*;
    match status {
        Open => 0,
        InProgress => 1,
        Blocked => 2,
        Closed => 3,
        Tombstone => 4,
    }
}

fn issue_type_tag(issue_type: crate::graph::IssueType) -> &'static str {
    use crate::graph::IssueType::*;
    match issue_type {
        Bug => "bug",
        Task => "task",
        Chore => "chore",
        Feature => "feature",
        Epic => "epic",
    }
}

/// Order-independent hash of an entire issue set's content *and*
/// dependencies. Two issue sets that differ only in element order hash
/// identically.
pub fn compute_data_hash(issues: &[Issue]) -> String {
    let mut per_issue: Vec<String> = issues.iter().map(|i| format!("{}|{}|{}", i.id, content_digest(i), dependency_digest(i))).collect();
    per_issue.sort();
    let mut hasher = Sha256::new();
    hasher.update(per_issue.join("\n").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Hash of an `AnalysisConfig` + `ScoringConfig` pair (anything that would
/// change Phase-2 or scoring output), used as the second half of the cache key.
pub fn compute_config_hash(analysis: &crate::config::AnalysisConfig, scoring: &crate::config::ScoringConfig) -> String {
    let raw = format!(
        "{}",
        serde_json::to_string(&(analysis, scoring)).expect("config always serializes")
    );
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    ContentChanged,
    DependencyChanged,
    Modified,
    Unchanged,
}

/// Classify how `new_issue` differs from `old_issue` (or its absence).
/// `Modified` is reported only when both content and dependencies changed;
/// callers that don't care about the distinction can match
/// `ContentChanged | DependencyChanged | Modified` as "changed".
pub fn classify(old_issue: Option<&Issue>, new_issue: Option<&Issue>) -> DiffKind {
    match (old_issue, new_issue) {
        (None, Some(_)) => DiffKind::Added,
        (Some(_), None) => DiffKind::Removed,
        (None, None) => DiffKind::Unchanged,
        (Some(old), Some(new)) => {
            let content_changed = content_digest(old) != content_digest(new);
            let deps_changed = dependency_digest(old) != dependency_digest(new);
            match (content_changed, deps_changed) {
                (true, true) => DiffKind::Modified,
                (true, false) => DiffKind::ContentChanged,
                (false, true) => DiffKind::DependencyChanged,
                (false, false) => DiffKind::Unchanged,
            }
        }
    }
}
