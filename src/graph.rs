//! The issue data model and the blocking-dependency analysis graph built from it.

use chrono::{DateTime, Utc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::AnalysisError;

/// Issue status. `Closed` and `Tombstone` are closed-like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
    Tombstone,
}

impl Status {
    /// Closed and tombstone issues never participate in recommendations.
    pub fn is_closed_like(self) -> bool {
        matches!(self, Status::Closed | Status::Tombstone)
    }
}

/// Issue type. Purely informational for counts/grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Task,
    Chore,
    Feature,
    Epic,
}

/// Dependency edge type. Only blocking types participate in the analysis graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    Blocks,
    Related,
    DuplicateOf,
    Parent,
}

impl DependencyType {
    pub fn is_blocking(&self) -> bool {
        matches!(self, DependencyType::Blocks)
    }
}

/// A single outgoing dependency: `from` (implicit, the owning issue) depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub to: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

impl Dependency {
    pub fn blocking(to: impl Into<String>) -> Self {
        Dependency {
            to: to.into(),
            dep_type: DependencyType::Blocks,
        }
    }
}

fn default_priority() -> u8 {
    2
}

/// A work item with typed dependencies on other work items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default = "default_issue_type")]
    pub issue_type: IssueType,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub estimated_minutes: Option<u32>,
    #[serde(default)]
    pub content_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

fn default_issue_type() -> IssueType {
    IssueType::Task
}

impl Issue {
    /// Labels compared case-insensitively; this is the canonical lowercase set.
    pub fn label_set(&self) -> HashSet<String> {
        self.labels.iter().map(|l| l.to_lowercase()).collect()
    }

    /// The first label, or "unlabeled" if none are present. Used for grouping.
    pub fn primary_label(&self) -> String {
        self.labels
            .first()
            .cloned()
            .unwrap_or_else(|| "unlabeled".to_string())
    }

    pub fn is_actionable_input(&self) -> bool {
        !self.status.is_closed_like()
    }
}

/// The directed blocking-dependency graph plus id<->index maps.
///
/// Node weights are issue ids; an edge `u -> v` means issue `u` has a
/// blocking dependency on issue `v` (`v` blocks `u`).
#[derive(Debug, Clone)]
pub struct AnalysisGraph {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
    order: Vec<String>,
}

impl AnalysisGraph {
    /// Build the analysis graph from an ordered issue slice.
    ///
    /// Nodes are added in input order, one per issue. Only blocking
    /// dependencies whose target exists in the issue set produce edges;
    /// everything else (missing targets, non-blocking types, self-loops,
    /// duplicate edges) is silently dropped. Duplicate issue ids are the
    /// sole fatal precondition.
    pub fn build(issues: &[Issue]) -> Result<AnalysisGraph, AnalysisError> {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::with_capacity(issues.len());
        let mut order = Vec::with_capacity(issues.len());

        for issue in issues {
            if index_of.contains_key(&issue.id) {
                return Err(AnalysisError::DuplicateId(issue.id.clone()));
            }
            let idx = graph.add_node(issue.id.clone());
            index_of.insert(issue.id.clone(), idx);
            order.push(issue.id.clone());
        }

        let mut seen_edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
        for issue in issues {
            let Some(&from_idx) = index_of.get(&issue.id) else {
                continue;
            };
            for dep in &issue.dependencies {
                if !dep.dep_type.is_blocking() {
                    continue;
                }
                if dep.to == issue.id {
                    continue; // self-loop, dropped
                }
                let Some(&to_idx) = index_of.get(&dep.to) else {
                    continue; // phantom target, dropped
                };
                if seen_edges.insert((from_idx, to_idx)) {
                    graph.add_edge(from_idx, to_idx, ());
                }
            }
        }

        Ok(AnalysisGraph {
            graph,
            index_of,
            order,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Issue ids in the order they were added (input order).
    pub fn ids_in_order(&self) -> &[String] {
        &self.order
    }

    /// Issue ids sorted ascending. Used whenever deterministic, id-order
    /// iteration is required for a metric or assembly step.
    pub fn ids_sorted(&self) -> Vec<String> {
        let mut ids = self.order.clone();
        ids.sort();
        ids
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index_of.get(id).copied()
    }

    pub fn id_of(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_of.contains_key(id)
    }

    pub fn out_degree(&self, id: &str) -> usize {
        self.index_of
            .get(id)
            .map(|&idx| self.graph.neighbors_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.index_of
            .get(id)
            .map(|&idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Ids of issues this issue blocks on (outgoing edges), sorted ascending.
    pub fn blockers_of(&self, id: &str) -> Vec<String> {
        let Some(&idx) = self.index_of.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out
    }

    /// Ids of issues that depend on this one (incoming edges), sorted ascending.
    pub fn dependents_of(&self, id: &str) -> Vec<String> {
        let Some(&idx) = self.index_of.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<String> = self
            .graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out
    }

    pub fn inner(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// Density = edges / (n * (n-1)); 0 when n <= 1.
    pub fn density(&self) -> f64 {
        let n = self.node_count() as f64;
        if n <= 1.0 {
            return 0.0;
        }
        self.edge_count() as f64 / (n * (n - 1.0))
    }
}
