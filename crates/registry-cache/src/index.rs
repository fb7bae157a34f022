//! The paired lookup index and its atomic publication cell.
//!
//! Name lookups and id lookups must never disagree, so both mappings live in
//! one immutable [`NamespaceIndex`] that is built offline during a refresh
//! and published through [`PublishedIndex`] with a single atomic pointer
//! store. Readers load the pointer once per call and see either the old
//! complete index or the new complete index, never a mix.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use registry_core::{NamespaceId, NamespaceName};

use crate::entry::NamespaceEntry;

/// Immutable paired mapping of namespaces by name and by id.
///
/// Both maps reference the same `Arc<NamespaceEntry>` allocations. Within one
/// index, `(id, name)` is a bijection: every entry reachable by id is the
/// same object reachable by its name.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    by_name: HashMap<NamespaceName, Arc<NamespaceEntry>>,
    by_id: HashMap<NamespaceId, Arc<NamespaceEntry>>,
    max_seen_version: i64,
}

impl NamespaceIndex {
    /// Build an index from projected entries.
    ///
    /// `max_seen_version` is the store notification version the building
    /// refresh cycle fenced on; every entry's own version is strictly below
    /// it.
    pub fn new(entries: Vec<Arc<NamespaceEntry>>, max_seen_version: i64) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_id = HashMap::with_capacity(entries.len());
        for entry in entries {
            by_name.insert(entry.name().clone(), Arc::clone(&entry));
            by_id.insert(entry.id().clone(), entry);
        }
        Self {
            by_name,
            by_id,
            max_seen_version,
        }
    }

    /// Look an entry up by name.
    #[inline]
    pub fn lookup_by_name(&self, name: &str) -> Option<&Arc<NamespaceEntry>> {
        self.by_name.get(name)
    }

    /// Look an entry up by id.
    #[inline]
    pub fn lookup_by_id(&self, id: &str) -> Option<&Arc<NamespaceEntry>> {
        self.by_id.get(id)
    }

    /// The store notification version this index was fenced on.
    #[inline]
    pub fn max_seen_version(&self) -> i64 {
        self.max_seen_version
    }

    /// Number of namespaces in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether the index holds no namespaces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Iterate over all entries in unspecified order.
    pub fn entries(&self) -> impl Iterator<Item = &Arc<NamespaceEntry>> {
        self.by_id.values()
    }
}

/// Atomic publication cell for the current index.
///
/// Holds `None` until the first successful refresh. Lookups perform one
/// atomic load; the refresher performs one atomic store per cycle. No other
/// reader-side synchronisation exists.
#[derive(Default)]
pub struct PublishedIndex {
    current: ArcSwapOption<NamespaceIndex>,
}

impl PublishedIndex {
    /// Create an empty (not yet ready) cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published index, if any refresh has succeeded.
    #[inline]
    pub fn load(&self) -> Option<Arc<NamespaceIndex>> {
        self.current.load_full()
    }

    /// Atomically replace the published index.
    pub fn publish(&self, index: Arc<NamespaceIndex>) {
        self.current.store(Some(index));
    }

    /// Whether a first refresh has been published.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.current.load().is_some()
    }
}

impl fmt::Debug for PublishedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishedIndex")
            .field("ready", &self.is_ready())
            .finish()
    }
}
