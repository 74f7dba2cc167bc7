//! Analysis configuration.
//!
//! Configuration is stored in `.triagegraph/config.toml` and controls the
//! Phase-2 metric engine, the scoring weights, and the cache layer. Every
//! field has a sensible default so a missing or partial file never prevents
//! analysis from running.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetweennessMode {
    Exact,
    Approximate,
}

fn default_betweenness_mode() -> BetweennessMode {
    BetweennessMode::Exact
}

fn default_metric_timeout_ms() -> u64 {
    2_000
}

fn default_max_cycles_to_store() -> usize {
    100
}

fn default_true() -> bool {
    true
}

fn default_large_graph_threshold() -> usize {
    500
}

fn default_betweenness_sample_size() -> usize {
    64
}

/// Per-metric enable flags and timing/sampling parameters for Phase-2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_true")]
    pub enable_pagerank: bool,
    #[serde(default = "default_true")]
    pub enable_betweenness: bool,
    #[serde(default = "default_true")]
    pub enable_eigenvector: bool,
    #[serde(default = "default_true")]
    pub enable_hits: bool,
    #[serde(default = "default_true")]
    pub enable_critical_path: bool,
    #[serde(default = "default_true")]
    pub enable_cycles: bool,
    #[serde(default = "default_true")]
    pub enable_kcore_articulation: bool,
    #[serde(default = "default_true")]
    pub enable_slack: bool,

    #[serde(default = "default_metric_timeout_ms")]
    pub metric_timeout_ms: u64,

    #[serde(default = "default_betweenness_mode")]
    pub betweenness_mode: BetweennessMode,
    #[serde(default = "default_betweenness_sample_size")]
    pub betweenness_sample_size: usize,

    #[serde(default = "default_max_cycles_to_store")]
    pub max_cycles_to_store: usize,

    /// Node count above which the size-adaptive preset switches betweenness
    /// to approximate mode and raises timeouts.
    #[serde(default = "default_large_graph_threshold")]
    pub large_graph_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            enable_pagerank: true,
            enable_betweenness: true,
            enable_eigenvector: true,
            enable_hits: true,
            enable_critical_path: true,
            enable_cycles: true,
            enable_kcore_articulation: true,
            enable_slack: true,
            metric_timeout_ms: default_metric_timeout_ms(),
            betweenness_mode: default_betweenness_mode(),
            betweenness_sample_size: default_betweenness_sample_size(),
            max_cycles_to_store: default_max_cycles_to_store(),
            large_graph_threshold: default_large_graph_threshold(),
        }
    }
}

impl AnalysisConfig {
    pub fn metric_timeout(&self) -> Duration {
        Duration::from_millis(self.metric_timeout_ms)
    }

    /// Derive a size-adaptive preset from (node_count, edge_count): small
    /// graphs keep exact betweenness; larger ones switch to sampled
    /// approximation and raise the per-metric timeout.
    pub fn adapt_to_size(mut self, node_count: usize, _edge_count: usize) -> Self {
        if node_count > self.large_graph_threshold {
            self.betweenness_mode = BetweennessMode::Approximate;
            self.metric_timeout_ms = self.metric_timeout_ms.max(5_000);
        }
        // A clamp of sample_size to n is applied at metric-compute time, not
        // here, since it folds the "clamp == n reports as exact" rule in
        // one place (see metrics::betweenness).
        self
    }
}

fn default_impact_weights() -> ImpactWeights {
    ImpactWeights::default()
}

/// The eight normalized impact-score weights. Must sum to exactly 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ImpactWeights {
    pub pagerank: f64,
    pub betweenness: f64,
    pub blocker_ratio: f64,
    pub staleness: f64,
    pub priority_boost: f64,
    pub time_to_impact: f64,
    pub urgency: f64,
    pub risk: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        ImpactWeights {
            pagerank: 0.20,
            betweenness: 0.15,
            blocker_ratio: 0.15,
            staleness: 0.10,
            priority_boost: 0.15,
            time_to_impact: 0.10,
            urgency: 0.10,
            risk: 0.05,
        }
    }
}

impl ImpactWeights {
    pub fn sum(&self) -> f64 {
        self.pagerank
            + self.betweenness
            + self.blocker_ratio
            + self.staleness
            + self.priority_boost
            + self.time_to_impact
            + self.urgency
            + self.risk
    }
}

fn default_base_weight() -> f64 {
    0.70
}
fn default_unblock_weight() -> f64 {
    0.15
}
fn default_quick_win_weight() -> f64 {
    0.15
}
fn default_quick_win_max_depth() -> u32 {
    2
}
fn default_urgency_labels() -> Vec<String> {
    [
        "urgent", "critical", "hotfix", "asap", "p0", "p1", "blocker", "sev1", "sev2",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_impact_weights")]
    pub impact_weights: ImpactWeights,
    #[serde(default = "default_base_weight")]
    pub triage_base_weight: f64,
    #[serde(default = "default_unblock_weight")]
    pub triage_unblock_weight: f64,
    #[serde(default = "default_quick_win_weight")]
    pub triage_quick_win_weight: f64,
    #[serde(default = "default_quick_win_max_depth")]
    pub quick_win_max_depth: u32,
    #[serde(default = "default_urgency_labels")]
    pub urgency_labels: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            impact_weights: default_impact_weights(),
            triage_base_weight: default_base_weight(),
            triage_unblock_weight: default_unblock_weight(),
            triage_quick_win_weight: default_quick_win_weight(),
            quick_win_max_depth: default_quick_win_max_depth(),
            urgency_labels: default_urgency_labels(),
        }
    }
}

fn default_in_memory_ttl_secs() -> u64 {
    300
}
fn default_max_disk_entries() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_in_memory_ttl_secs")]
    pub in_memory_ttl_secs: u64,
    #[serde(default)]
    pub disk_cache_enabled: bool,
    #[serde(default)]
    pub disk_cache_dir: Option<String>,
    #[serde(default = "default_max_disk_entries")]
    pub max_disk_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            in_memory_ttl_secs: default_in_memory_ttl_secs(),
            disk_cache_enabled: false,
            disk_cache_dir: None,
            max_disk_entries: default_max_disk_entries(),
        }
    }
}

impl CacheConfig {
    pub fn in_memory_ttl(&self) -> Duration {
        Duration::from_secs(self.in_memory_ttl_secs)
    }

    /// Environment variables consumed by the cache layer: one enables the
    /// disk cache, one sets its directory. Typed config always wins when set.
    pub fn from_env(mut self) -> Self {
        if std::env::var("TRIAGEGRAPH_DISK_CACHE").is_ok() {
            self.disk_cache_enabled = true;
        }
        if let Ok(dir) = std::env::var("TRIAGEGRAPH_CACHE_DIR") {
            self.disk_cache_dir = Some(dir);
        }
        self
    }

    pub fn resolved_disk_cache_dir(&self) -> Option<std::path::PathBuf> {
        if !self.disk_cache_enabled {
            return None;
        }
        self.disk_cache_dir
            .as_ref()
            .map(std::path::PathBuf::from)
            .or_else(|| dirs::cache_dir().map(|d| d.join("triagegraph")))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

impl Config {
    /// Load from a TOML file, falling back to defaults when absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).expect("Config always serializes");
        std::fs::write(path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_weights_sum_to_one() {
        let w = ImpactWeights::default();
        assert!((w.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let raw = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.analysis.metric_timeout_ms, config.analysis.metric_timeout_ms);
        assert!((parsed.scoring.impact_weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config.cache.max_disk_entries, 10);
    }

    #[test]
    fn large_graph_switches_betweenness_to_approximate() {
        let config = AnalysisConfig::default().adapt_to_size(1000, 5000);
        assert_eq!(config.betweenness_mode, BetweennessMode::Approximate);
    }

    #[test]
    fn small_graph_keeps_exact_betweenness() {
        let config = AnalysisConfig::default().adapt_to_size(10, 20);
        assert_eq!(config.betweenness_mode, BetweennessMode::Exact);
    }
}
