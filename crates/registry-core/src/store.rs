//! The metadata store seam.
//!
//! The registry consumes the authoritative store through [`MetadataStore`],
//! a small read-only trait: one call for the store-wide notification version
//! and one for a page of the namespace list. Production wires this to the
//! persistence layer; tests substitute in-memory doubles.

use async_trait::async_trait;

use crate::{NamespaceRecord, Result};

/// Opaque pagination token issued by the metadata store.
pub type PageToken = Vec<u8>;

/// Store-wide metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreMetadata {
    /// The store's current notification version: the version the next
    /// mutation will be assigned. Monotonically increasing.
    pub notification_version: i64,
}

/// Request for one page of the namespace list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListNamespacesRequest {
    /// Maximum records to return.
    pub page_size: usize,
    /// Token from the previous page, or `None` for the first page.
    pub next_page_token: Option<PageToken>,
}

/// One page of the namespace list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListNamespacesResponse {
    /// Records in this page.
    pub namespaces: Vec<NamespaceRecord>,
    /// Token for the next page; `None` or empty when the listing is drained.
    pub next_page_token: Option<PageToken>,
}

/// Read-only client of the authoritative namespace metadata store.
///
/// Implementations must tolerate concurrent writers: a record mutated while
/// the listing is being drained may surface on a later page with a
/// notification version at or above the value `get_metadata` returned at the
/// start of the drain. The refresher defends against that reordering; the
/// store only has to keep `notification_version` monotonic.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Read the store's current notification version.
    async fn get_metadata(&self) -> Result<StoreMetadata>;

    /// Fetch one page of namespace records.
    async fn list_namespaces(
        &self,
        request: ListNamespacesRequest,
    ) -> Result<ListNamespacesResponse>;
}
