//! Registry statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for registry operations.
///
/// All counters are atomic and can be safely read from multiple threads.
/// These complement the process-wide `metrics` facade with instance-local
/// numbers that tests and introspection endpoints can read directly.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of completed refresh cycles.
    refresh_successes: AtomicU64,
    /// Number of aborted refresh cycles.
    refresh_failures: AtomicU64,
    /// Number of lookups that found an entry.
    lookup_hits: AtomicU64,
    /// Number of lookups that missed.
    lookup_misses: AtomicU64,
    /// Number of change callback invocations.
    callbacks_invoked: AtomicU64,
}

impl CacheStats {
    /// Create new registry statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed refresh cycle.
    #[inline]
    pub fn record_refresh_success(&self) {
        self.refresh_successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an aborted refresh cycle.
    #[inline]
    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup hit.
    #[inline]
    pub fn record_hit(&self) {
        self.lookup_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup miss.
    #[inline]
    pub fn record_miss(&self) {
        self.lookup_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record change callback invocations.
    #[inline]
    pub fn record_callbacks(&self, count: u64) {
        self.callbacks_invoked.fetch_add(count, Ordering::Relaxed);
    }

    /// Get total completed refresh cycles.
    #[inline]
    pub fn refresh_successes(&self) -> u64 {
        self.refresh_successes.load(Ordering::Relaxed)
    }

    /// Get total aborted refresh cycles.
    #[inline]
    pub fn refresh_failures(&self) -> u64 {
        self.refresh_failures.load(Ordering::Relaxed)
    }

    /// Get total lookup hits.
    #[inline]
    pub fn lookup_hits(&self) -> u64 {
        self.lookup_hits.load(Ordering::Relaxed)
    }

    /// Get total lookup misses.
    #[inline]
    pub fn lookup_misses(&self) -> u64 {
        self.lookup_misses.load(Ordering::Relaxed)
    }

    /// Get total change callback invocations.
    #[inline]
    pub fn callbacks_invoked(&self) -> u64 {
        self.callbacks_invoked.load(Ordering::Relaxed)
    }

    /// Calculate lookup hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.lookup_hits() as f64;
        let total = hits + self.lookup_misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.refresh_successes.store(0, Ordering::Relaxed);
        self.refresh_failures.store(0, Ordering::Relaxed);
        self.lookup_hits.store(0, Ordering::Relaxed);
        self.lookup_misses.store(0, Ordering::Relaxed);
        self.callbacks_invoked.store(0, Ordering::Relaxed);
    }
}
