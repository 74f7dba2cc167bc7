#![recursion_limit = "256"]

pub mod analysis;
pub mod assembly;
pub mod cache;
pub mod config;
pub mod error;
pub mod feedback;
pub mod graph;
pub mod harness;
pub mod hash;
pub mod history;
pub mod metrics;
pub mod parser;
pub mod phase1;
pub mod recommend;
pub mod report;
pub mod score;
pub mod stats;

pub use analysis::{analyze_async, analyze_sync};
pub use assembly::{Counts, GraphHealth, LabelGroup, QuickWin, StalenessEntry, Track, Velocity, WeeklyBucket};
pub use cache::{CachedStats, DiskCache, InMemoryCache, ResultCache};
pub use config::{AnalysisConfig, BetweennessMode, CacheConfig, Config, ImpactWeights, ScoringConfig};
pub use error::{AnalysisError, CacheError, ConfigError, ParseError, QueryError};
pub use feedback::{NoWeightFeedback, WeightAdjustment, WeightFeedback};
pub use graph::{AnalysisGraph, Dependency, DependencyType, Issue, IssueType, Status};
pub use harness::{CancellationToken, MetricOutcome, MetricState, MetricStatus};
pub use hash::{classify, compute_config_hash, compute_data_hash, DiffKind};
pub use history::{HistoryEvent, HistoryProvider, IssueHistory, NoHistoryProvider};
pub use parser::{load_issues, save_issues};
pub use phase1::Phase1Stats;
pub use recommend::{generate_recommendations, ActionHint, Recommendation, WhatIfDelta};
pub use report::{build_report, TriageReport};
pub use score::{compute_impact_scores, compute_triage_scores, ImpactBreakdown, ImpactScore, TriageScore};
pub use stats::{GraphStats, Phase2Snapshot};
