//! Immutable per-namespace cache entries.
//!
//! A [`NamespaceEntry`] is a frozen projection of one persistent record.
//! Entries are never mutated after construction; a refresh that observes a
//! changed record builds a fresh entry, and readers keep whatever entry they
//! already hold. All derived queries are pure functions of the entry and
//! their arguments.

use std::time::Duration;

use metrics::counter;
use registry_core::{
    NamespaceConfig, NamespaceId, NamespaceInfo, NamespaceName, NamespaceRecord,
    ReplicationConfig,
};

/// Namespace data key holding the extended retention in days for sampled
/// workflows. Non-negative integer.
pub const SAMPLE_RETENTION_KEY: &str = "sample-retention-days";

/// Namespace data key holding the sampling probability in `[0, 1]`.
pub const SAMPLE_RATE_KEY: &str = "sample-retention-rate";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Immutable snapshot of one namespace.
///
/// Entries are shared as `Arc<NamespaceEntry>` between both index mappings
/// and every subscriber delivery, so two subscribers observing the same
/// change observe the same allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceEntry {
    id: NamespaceId,
    name: NamespaceName,
    info: NamespaceInfo,
    config: NamespaceConfig,
    replication: ReplicationConfig,
    config_version: i64,
    failover_version: i64,
    failover_notification_version: i64,
    notification_version: i64,
    is_global: bool,
}

impl NamespaceEntry {
    /// Project a persistent record into a cache entry.
    pub fn from_record(record: NamespaceRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            info: record.info,
            config: record.config,
            replication: record.replication,
            config_version: record.config_version,
            failover_version: record.failover_version,
            failover_notification_version: record.failover_notification_version,
            notification_version: record.notification_version,
            is_global: record.is_global,
        }
    }

    /// Stable unique identifier.
    #[inline]
    pub fn id(&self) -> &NamespaceId {
        &self.id
    }

    /// Human-readable name.
    #[inline]
    pub fn name(&self) -> &NamespaceName {
        &self.name
    }

    /// Human-facing metadata.
    #[inline]
    pub fn info(&self) -> &NamespaceInfo {
        &self.info
    }

    /// Per-namespace configuration.
    #[inline]
    pub fn config(&self) -> &NamespaceConfig {
        &self.config
    }

    /// Replication topology.
    #[inline]
    pub fn replication(&self) -> &ReplicationConfig {
        &self.replication
    }

    /// Monotonic within the namespace; bumped on any config edit.
    #[inline]
    pub fn config_version(&self) -> i64 {
        self.config_version
    }

    /// Monotonic across the cluster; bumped on any active-cluster change.
    #[inline]
    pub fn failover_version(&self) -> i64 {
        self.failover_version
    }

    /// Store version at which the last failover was recorded.
    #[inline]
    pub fn failover_notification_version(&self) -> i64 {
        self.failover_notification_version
    }

    /// Store version at which the underlying record was last mutated.
    #[inline]
    pub fn notification_version(&self) -> i64 {
        self.notification_version
    }

    /// Whether the namespace participates in multi-cluster replication.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.is_global
    }

    /// Effective history retention for a workflow.
    ///
    /// Returns the base retention unless both sampling keys are present and
    /// well-formed and the workflow id falls inside the sampling rate, in
    /// which case the extended retention applies. Malformed keys fall back to
    /// base retention; this call never fails.
    pub fn retention(&self, workflow_id: &str) -> Duration {
        match self.sampling_config() {
            Some((days, rate)) if sample_position(workflow_id) < rate => {
                Duration::from_secs(days * SECONDS_PER_DAY)
            }
            _ => self.config.retention,
        }
    }

    /// Whether both sampling keys are present and parse, regardless of rate.
    pub fn is_sampled_for_longer_retention_enabled(&self) -> bool {
        self.sampling_config().is_some()
    }

    /// Whether the given workflow id is sampled for extended retention.
    pub fn is_sampled_for_longer_retention(&self, workflow_id: &str) -> bool {
        match self.sampling_config() {
            Some((_, rate)) => sample_position(workflow_id) < rate,
            None => false,
        }
    }

    /// Whether the namespace serves traffic on the given cluster.
    ///
    /// Local namespaces are active everywhere they exist; for global
    /// namespaces only the active cluster qualifies.
    pub fn active_in_cluster(&self, cluster: &str) -> bool {
        if !self.is_global {
            return true;
        }
        self.replication.active_cluster == cluster
    }

    /// Copy of this entry with a different active cluster.
    #[must_use]
    pub fn with_active_cluster(&self, cluster: impl Into<String>) -> Self {
        let mut entry = self.clone();
        entry.replication.active_cluster = cluster.into();
        entry
    }

    /// Copy of this entry with the global replication flag changed.
    #[must_use]
    pub fn with_global_flag(&self, is_global: bool) -> Self {
        let mut entry = self.clone();
        entry.is_global = is_global;
        entry
    }

    /// Copy of this entry with a different description.
    #[must_use]
    pub fn with_description(&self, description: impl Into<String>) -> Self {
        let mut entry = self.clone();
        entry.info.description = description.into();
        entry
    }

    /// Copy of this entry with a different base retention.
    #[must_use]
    pub fn with_retention(&self, retention: Duration) -> Self {
        let mut entry = self.clone();
        entry.config.retention = retention;
        entry
    }

    /// Extended retention days and sampling rate, if both keys parse.
    fn sampling_config(&self) -> Option<(u64, f64)> {
        let days = self.info.data.get(SAMPLE_RETENTION_KEY)?;
        let rate = self.info.data.get(SAMPLE_RATE_KEY)?;
        match (days.parse::<u64>(), rate.parse::<f64>()) {
            (Ok(days), Ok(rate)) => Some((days, rate)),
            _ => {
                counter!("namespace_sampling_parse_fallbacks_total").increment(1);
                None
            }
        }
    }
}

/// Deterministic position of a workflow id on `[0, 1)`.
///
/// 32-bit FNV-1a of the id's UTF-8 bytes, bucketed into thousandths. The
/// digest is pinned: sampling decisions must agree across processes and
/// releases, so this must never change.
fn sample_position(workflow_id: &str) -> f64 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut hash = FNV_OFFSET;
    for byte in workflow_id.as_bytes() {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    f64::from(hash % 1000) / 1000.0
}
