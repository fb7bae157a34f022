//! Persistent namespace records as returned by the metadata store.
//!
//! These are plain data carriers mirroring the store's schema. The cache
//! never mutates them; it projects them into immutable cache entries.

use std::collections::HashMap;
use std::time::Duration;

use crate::{NamespaceId, NamespaceName};

/// Human-facing metadata of a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceInfo {
    /// Free-form description.
    pub description: String,
    /// Contact address of the owning team.
    pub owner_email: String,
    /// Free-form key/value mapping; well-known keys are interpreted by the
    /// cache (see the sampling keys in `registry-cache`).
    pub data: HashMap<String, String>,
}

/// Per-namespace configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Base workflow history retention.
    pub retention: Duration,
    /// Binary checksums marked bad for this namespace, keyed by checksum.
    pub bad_binaries: HashMap<String, BadBinaryInfo>,
}

/// Metadata about a binary checksum marked bad for a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BadBinaryInfo {
    /// Why the binary was marked bad.
    pub reason: String,
    /// Who marked it.
    pub operator: String,
}

/// Replication topology of a namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Cluster currently serving writes for this namespace.
    pub active_cluster: String,
    /// Clusters participating in replication. Order carries no meaning.
    pub clusters: Vec<String>,
}

/// One namespace as persisted in the metadata store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceRecord {
    /// Stable unique identifier.
    pub id: NamespaceId,
    /// Human-readable name, unique at any moment.
    pub name: NamespaceName,
    /// Human-facing metadata.
    pub info: NamespaceInfo,
    /// Per-namespace configuration.
    pub config: NamespaceConfig,
    /// Replication topology.
    pub replication: ReplicationConfig,
    /// Monotonic within the namespace; bumped on any config edit.
    pub config_version: i64,
    /// Monotonic across the cluster; bumped on any active-cluster change.
    pub failover_version: i64,
    /// Store version at which the last failover was recorded.
    pub failover_notification_version: i64,
    /// Store version at which this record was last mutated. Globally unique
    /// per mutation; the refresher's sort key.
    pub notification_version: i64,
    /// Whether the namespace participates in multi-cluster replication.
    pub is_global: bool,
}
