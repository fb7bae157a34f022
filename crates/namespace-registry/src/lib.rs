//! # namespace-registry
//!
//! Namespace registry cache for the workflow platform.
//!
//! Hot paths (request routing, task dispatch, history replication) resolve
//! namespace metadata millions of times per second and cannot afford a
//! database round-trip. This library keeps an in-memory snapshot of every
//! namespace, refreshed in the background from the authoritative metadata
//! store, and serves:
//!
//! - Lock-free point lookups by name and by id with bounded staleness
//! - Ordered, versioned change notifications for shard controllers
//! - Derived queries (sampled retention, active-in-cluster) consistent with
//!   the last observed snapshot
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use namespace_registry::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = NamespaceRegistry::new(store, CacheConfig::default());
//! registry.start().await?;
//!
//! let entry = registry.get_namespace(&NamespaceName::new("billing"))?;
//! if entry.active_in_cluster("us-east-1") {
//!     let retention = entry.retention(workflow_id);
//! }
//!
//! registry.register_namespace_change_callback(
//!     shard_id,
//!     last_seen_version,
//!     Box::new(|| { /* quiesce */ }),
//!     Box::new(|prev, next| { /* apply delta */ }),
//! );
//!
//! registry.stop().await;
//! ```
//!
//! ## Architecture
//!
//! This library is organized into two crates:
//!
//! - `registry-core` - Identifiers, records, errors and the store seam
//! - `registry-cache` - The cache: entries, the atomically published index,
//!   the refresher and the change notifier
//!
//! This crate (`namespace-registry`) re-exports all public APIs for
//! convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - All errors are returned as `Result`
//! 2. **Readers never block** - One atomic index load per lookup
//! 3. **Stale beats down** - Refresh failures keep the previous snapshot
//! 4. **Observable** - Built-in metrics and tracing support

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use registry_cache as cache;
pub use registry_core as core;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use namespace_registry::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use registry_core::{
        BadBinaryInfo, ListNamespacesRequest, ListNamespacesResponse, MetadataStore,
        NamespaceConfig, NamespaceId, NamespaceInfo, NamespaceName, NamespaceRecord, PageToken,
        RegistryError, ReplicationConfig, StoreMetadata,
    };

    // Cache types
    pub use registry_cache::{
        CacheConfig, CacheStats, ChangeCallback, NamespaceEntry, NamespaceRegistry,
        PrepareCallback, ShardId, SAMPLE_RATE_KEY, SAMPLE_RETENTION_KEY,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("namespace-registry {} (MSRV {})", VERSION, MSRV)
    }
}
