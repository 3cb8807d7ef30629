//! Bounded, time-expiring store of fetched grids.
//!
//! ## Eviction Strategy
//! - TTL checked on every read, so a stale entry is never returned even if
//!   no sweep has run since it expired.
//! - Sweeps are request-driven (run before each insert), never on a timer.
//!   A sweep drops every expired entry, then drops the globally oldest
//!   entries until the count fits under `max_entries`.
//!
//! Entries are immutable once inserted. Replacing a key is an atomic upsert
//! under the write lock; readers only ever see whole entries.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use grid_common::{Bounds, GridResponse};

/// A cached grid, the bounds it was fetched for, and when it was inserted.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Arc<GridResponse>,
    pub bounds: Bounds,
    pub inserted_at: Instant,
}

impl CacheEntry {
    /// Create an entry stamped with the current time.
    pub fn new(data: Arc<GridResponse>, bounds: Bounds) -> Self {
        Self {
            data,
            bounds,
            inserted_at: Instant::now(),
        }
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// Statistics for the grid cache store.
///
/// All fields are atomic for lock-free reads from the stats endpoint.
#[derive(Debug, Default)]
pub struct GridCacheStats {
    /// Total exact-key hits
    pub hits: AtomicU64,
    /// Total exact-key misses (including stale entries)
    pub misses: AtomicU64,
    /// Total entries removed because their TTL elapsed
    pub expired: AtomicU64,
    /// Total entries removed to satisfy the capacity limit
    pub evictions: AtomicU64,
    /// Current number of entries
    pub entry_count: AtomicU64,
}

impl GridCacheStats {
    /// Calculate cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub evicted: usize,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.expired + self.evicted
    }
}

/// In-memory grid store keyed by quantized bounds + step.
pub struct GridCacheStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    stats: GridCacheStats,
}

impl GridCacheStore {
    /// Create a new store.
    ///
    /// # Arguments
    /// * `ttl` - Age at which an entry becomes stale
    /// * `max_entries` - Entry count limit enforced after every insert
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);

        tracing::info!(
            ttl_secs = ttl.as_secs(),
            max_entries,
            "GridCacheStore initialized"
        );

        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
            stats: GridCacheStats::default(),
        }
    }

    /// Look up a fresh entry. Stale entries read as absent but are left for
    /// the next sweep.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let entries = self.entries.read();
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            _ => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace the entry at `key`, then enforce the entry limit.
    pub fn put(&self, key: String, entry: CacheEntry) {
        let mut entries = self.entries.write();
        entries.insert(key, entry);
        let report = self.sweep_locked(&mut entries);
        self.record_sweep(&report, entries.len());
    }

    /// Remove expired entries, then the oldest entries while over capacity.
    pub fn sweep(&self) -> SweepReport {
        let mut entries = self.entries.write();
        let report = self.sweep_locked(&mut entries);
        self.record_sweep(&report, entries.len());
        report
    }

    fn sweep_locked(&self, entries: &mut HashMap<String, CacheEntry>) -> SweepReport {
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        let expired = before - entries.len();

        let mut evicted = 0;
        while entries.len() > self.max_entries {
            let oldest = entries
                .iter()
                .min_by(|a, b| a.1.inserted_at.cmp(&b.1.inserted_at).then_with(|| a.0.cmp(b.0)))
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    entries.remove(&key);
                    evicted += 1;
                }
                None => break,
            }
        }

        SweepReport { expired, evicted }
    }

    fn record_sweep(&self, report: &SweepReport, len: usize) {
        if report.expired > 0 {
            self.stats
                .expired
                .fetch_add(report.expired as u64, Ordering::Relaxed);
            metrics::counter!("grid_cache_evictions_total", "reason" => "expired")
                .increment(report.expired as u64);
        }
        if report.evicted > 0 {
            self.stats
                .evictions
                .fetch_add(report.evicted as u64, Ordering::Relaxed);
            metrics::counter!("grid_cache_evictions_total", "reason" => "capacity")
                .increment(report.evicted as u64);
        }
        if report.total() > 0 {
            tracing::debug!(
                expired = report.expired,
                evicted = report.evicted,
                remaining = len,
                "GridCacheStore swept entries"
            );
        }

        self.stats.entry_count.store(len as u64, Ordering::Relaxed);
        metrics::gauge!("grid_cache_entries").set(len as f64);
    }

    /// Snapshot of all fresh entries. Iteration order is unspecified.
    pub fn values(&self) -> Vec<CacheEntry> {
        let entries = self.entries.read();
        let now = Instant::now();
        entries
            .values()
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .cloned()
            .collect()
    }

    /// Number of stored entries, stale ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Remove every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        self.stats.entry_count.store(0, Ordering::Relaxed);
        metrics::gauge!("grid_cache_entries").set(0.0);
        tracing::info!("GridCacheStore cleared {} entries", count);
    }

    pub fn stats(&self) -> &GridCacheStats {
        &self.stats
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}
