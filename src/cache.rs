//! Two-tier result cache keyed by `dataHash|configHash` (§4.7). A hit must
//! return a fully-ready [`GraphStats`] even when the caller's cancellation
//! token is already cancelled — cache hits are never cancellable.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, CacheConfig};
use crate::error::CacheError;
use crate::phase1::Phase1Stats;
use crate::stats::{GraphStats, Phase2Snapshot};

const DISK_CACHE_VERSION: u32 = 1;

/// The serializable half of a `GraphStats`: Phase-1 + Phase-2 fields, with
/// the config that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedStats {
    pub phase1: Phase1Stats,
    pub config: AnalysisConfig,
    pub phase2: Phase2Snapshot,
}

impl CachedStats {
    pub fn from_stats(stats: &GraphStats, phase2: Phase2Snapshot) -> Self {
        CachedStats {
            phase1: stats.phase1.clone(),
            config: stats.config.clone(),
            phase2,
        }
    }

    pub fn into_stats(self) -> GraphStats {
        GraphStats::ready(self.phase1, self.config, self.phase2)
    }
}

fn cache_key(data_hash: &str, config_hash: &str) -> String {
    format!("{data_hash}|{config_hash}")
}

struct InMemoryEntry {
    key: String,
    stats: CachedStats,
    inserted_at: Instant,
}

/// Single-entry, TTL-bounded in-memory cache.
pub struct InMemoryCache {
    ttl: std::time::Duration,
    slot: Mutex<Option<InMemoryEntry>>,
}

impl InMemoryCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        InMemoryCache {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn get(&self, data_hash: &str, config_hash: &str) -> Option<CachedStats> {
        let key = cache_key(data_hash, config_hash);
        let guard = self.slot.lock().expect("cache lock poisoned");
        let entry = guard.as_ref()?;
        if entry.key != key {
            return None;
        }
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.stats.clone())
    }

    pub fn set(&self, data_hash: &str, config_hash: &str, stats: CachedStats) {
        let key = cache_key(data_hash, config_hash);
        let mut guard = self.slot.lock().expect("cache lock poisoned");
        *guard = Some(InMemoryEntry {
            key,
            stats,
            inserted_at: Instant::now(),
        });
    }

    pub fn invalidate(&self) {
        let mut guard = self.slot.lock().expect("cache lock poisoned");
        *guard = None;
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct DiskCacheFile {
    version: u32,
    /// Insertion-ordered so oldest-first eviction is a simple front-trim;
    /// the key is duplicated inside each entry to keep the map self-describing.
    entries: HashMap<String, DiskEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DiskEntry {
    inserted_at_unix_ms: i64,
    stats: CachedStats,
}

/// Disk-backed LRU over a single JSON document. Eviction is oldest-first
/// once entry count exceeds `max_entries`.
pub struct DiskCache {
    path: PathBuf,
    max_entries: usize,
}

impl DiskCache {
    pub fn new(dir: impl AsRef<Path>, max_entries: usize) -> Self {
        DiskCache {
            path: dir.as_ref().join("analysis_cache.json"),
            max_entries,
        }
    }

    fn read(&self) -> Result<DiskCacheFile, CacheError> {
        if !self.path.exists() {
            return Ok(DiskCacheFile {
                version: DISK_CACHE_VERSION,
                entries: HashMap::new(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let file: DiskCacheFile = serde_json::from_str(&raw)?;
        if file.version != DISK_CACHE_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: DISK_CACHE_VERSION,
                found: file.version,
            });
        }
        Ok(file)
    }

    fn write(&self, file: &DiskCacheFile) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(file)?;
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    /// Reads the cache file, treating any I/O or version error as a cold
    /// cache rather than a fatal condition.
    fn read_or_cold(&self) -> DiskCacheFile {
        self.read().unwrap_or_else(|_| DiskCacheFile {
            version: DISK_CACHE_VERSION,
            entries: HashMap::new(),
        })
    }

    pub fn get(&self, data_hash: &str, config_hash: &str) -> Option<CachedStats> {
        let file = self.read_or_cold();
        file.entries.get(&cache_key(data_hash, config_hash)).map(|e| e.stats.clone())
    }

    /// Read-modify-write under a single pass: insert, then evict oldest
    /// entries until the count is within `max_entries`.
    pub fn set(&self, data_hash: &str, config_hash: &str, stats: CachedStats, now_unix_ms: i64) -> Result<(), CacheError> {
        let mut file = self.read_or_cold();
        file.entries.insert(
            cache_key(data_hash, config_hash),
            DiskEntry {
                inserted_at_unix_ms: now_unix_ms,
                stats,
            },
        );

        if file.entries.len() > self.max_entries {
            let mut by_age: Vec<(String, i64)> = file.entries.iter().map(|(k, v)| (k.clone(), v.inserted_at_unix_ms)).collect();
            by_age.sort_by_key(|(_, ts)| *ts);
            let overflow = file.entries.len() - self.max_entries;
            for (key, _) in by_age.into_iter().take(overflow) {
                file.entries.remove(&key);
            }
        }

        self.write(&file)
    }
}

/// Facade combining the in-memory and (optional) disk tiers per `CacheConfig`.
pub struct ResultCache {
    memory: InMemoryCache,
    disk: Option<DiskCache>,
}

impl ResultCache {
    /// Typed config wins when set; otherwise `TRIAGEGRAPH_DISK_CACHE` /
    /// `TRIAGEGRAPH_CACHE_DIR` from the environment can still enable and
    /// locate the disk tier (see `CacheConfig::from_env`).
    pub fn new(config: &CacheConfig) -> Self {
        let config = config.clone().from_env();
        let disk = config.resolved_disk_cache_dir().map(|dir| DiskCache::new(dir, config.max_disk_entries));
        ResultCache {
            memory: InMemoryCache::new(config.in_memory_ttl()),
            disk,
        }
    }

    /// Memory first, then disk (and on a disk hit, repopulate memory).
    pub fn get(&self, data_hash: &str, config_hash: &str) -> Option<CachedStats> {
        if let Some(hit) = self.memory.get(data_hash, config_hash) {
            return Some(hit);
        }
        let disk_hit = self.disk.as_ref()?.get(data_hash, config_hash)?;
        self.memory.set(data_hash, config_hash, disk_hit.clone());
        Some(disk_hit)
    }

    pub fn set(&self, data_hash: &str, config_hash: &str, stats: CachedStats, now_unix_ms: i64) {
        self.memory.set(data_hash, config_hash, stats.clone());
        if let Some(disk) = &self.disk {
            let _ = disk.set(data_hash, config_hash, stats, now_unix_ms);
        }
    }

    pub fn invalidate(&self) {
        self.memory.invalidate();
    }
}
