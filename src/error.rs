//! Error taxonomy for the triage core.
//!
//! Most failure modes in this crate are *recorded*, not *returned*: a
//! malformed dependency is dropped, a metric that times out gets a fallback
//! value and a status entry. Only the handful of truly fatal or
//! caller-facing conditions below are allowed to unwind the call stack.

use thiserror::Error;

/// Fatal preconditions for building the analysis graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("duplicate issue id: {0}")]
    DuplicateId(String),
}

/// Errors from id-keyed lookups (ETA, recommendation-for-id, etc).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("unknown issue id: {0}")]
    NotFound(String),
}

/// Errors loading or parsing the on-disk configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config toml: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Errors touching the disk-backed cache. These are always caught and
/// downgraded to a cold-cache warning by the cache layer itself; they are
/// never propagated to an analysis caller.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Errors loading or parsing an issue snapshot file.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error on line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}
