//! # registry-cache
//!
//! In-memory namespace registry cache with atomic snapshot publication and
//! ordered change callbacks.
//!
//! This crate provides the caching layer between the platform's hot paths
//! (request routing, task dispatch, history replication) and the
//! authoritative namespace metadata store:
//!
//! - [`NamespaceRegistry`] - The façade: lifecycle, lookups, subscriptions
//! - [`NamespaceEntry`] - Immutable snapshot of one namespace with derived
//!   queries (sampled retention, active-in-cluster)
//! - [`NamespaceIndex`] / [`PublishedIndex`] - Paired name/id mappings behind
//!   one atomic pointer
//!
//! ## Key Design Decisions
//!
//! - Both lookup mappings live in one immutable index published via a single
//!   atomic pointer swap; readers never observe a half-updated state
//! - Change batches are delivered sorted ascending by store notification
//!   version, and each subscription's acked version only moves forward
//! - Refresh failures keep the previous snapshot; staleness beats downtime
//!
//! ## Example
//!
//! ```rust,ignore
//! use registry_cache::{CacheConfig, NamespaceRegistry};
//!
//! let registry = NamespaceRegistry::new(store, CacheConfig::default());
//! registry.start().await?;
//!
//! let entry = registry.get_namespace(&"billing".into())?;
//! let retention = entry.retention(workflow_id);
//!
//! registry.stop().await;
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod entry;
mod index;
mod notify;
mod refresh;
mod stats;


pub use cache::NamespaceRegistry;
pub use config::CacheConfig;
pub use entry::{NamespaceEntry, SAMPLE_RATE_KEY, SAMPLE_RETENTION_KEY};
pub use index::{NamespaceIndex, PublishedIndex};
pub use notify::{ChangeCallback, PrepareCallback, ShardId};
pub use stats::CacheStats;
