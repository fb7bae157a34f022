//! Registry configuration.

use std::time::Duration;

/// Configuration for the namespace registry cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Interval between background refresh cycles.
    pub refresh_interval: Duration,
    /// Page size used when draining the namespace list from the store.
    pub page_size: usize,
    /// Per-call deadline for metadata store calls. A timeout aborts the
    /// refresh cycle, not the cache.
    pub store_call_timeout: Duration,
    /// When true, `start` runs the initial refresh inline and fails if it
    /// fails; lookups are servable the moment `start` returns.
    pub enable_prefetch_on_start: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            page_size: 200,
            store_call_timeout: Duration::from_secs(30),
            enable_prefetch_on_start: true,
        }
    }
}
