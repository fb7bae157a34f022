//! # registry-core
//!
//! Core types, errors and the metadata store seam for the namespace registry.
//!
//! This crate provides the foundational types used across the registry crates:
//!
//! - [`RegistryError`] - Error type covering every registry failure mode
//! - [`NamespaceId`] / [`NamespaceName`] - Typed namespace identifiers
//! - [`NamespaceRecord`] - The persistent record model of the metadata store
//! - [`MetadataStore`] - Async trait the registry consumes the store through
//!
//! ## Example
//!
//! ```rust
//! use registry_core::{NamespaceId, NamespaceName, RegistryError};
//!
//! let id = NamespaceId::new("5c9f21aa-8c26-4bfd-93b5-1f32cf21ad3c");
//! let name = NamespaceName::new("billing");
//!
//! let err = RegistryError::not_found(name.as_str());
//! assert!(err.to_string().contains("billing"));
//! assert!(!id.as_str().is_empty());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod id;
mod record;
mod store;

pub use error::RegistryError;
pub use id::{NamespaceId, NamespaceName};
pub use record::{
    BadBinaryInfo, NamespaceConfig, NamespaceInfo, NamespaceRecord, ReplicationConfig,
};
pub use store::{
    ListNamespacesRequest, ListNamespacesResponse, MetadataStore, PageToken, StoreMetadata,
};

/// Result type alias using [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
