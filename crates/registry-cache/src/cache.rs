//! The namespace registry façade: lifecycle, lookups, subscriptions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use registry_core::{MetadataStore, NamespaceId, NamespaceName, RegistryError, Result};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use crate::config::CacheConfig;
use crate::entry::NamespaceEntry;
use crate::index::PublishedIndex;
use crate::notify::{ChangeCallback, Notifier, PrepareCallback, ShardId};
use crate::refresh::{refresh_loop, Refresher};
use crate::stats::CacheStats;

/// Read-through-free, refresh-behind cache of every namespace in the
/// metadata store.
///
/// The registry is an ordinary instance with an explicit lifecycle: hosts
/// typically hold one per process, but nothing here is global. Lookups are
/// lock-free (one atomic index load per call); a single background worker
/// refreshes the snapshot and drives subscriber callbacks.
///
/// # Example
///
/// ```rust,ignore
/// use registry_cache::{CacheConfig, NamespaceRegistry};
///
/// let registry = NamespaceRegistry::new(store, CacheConfig::default());
/// registry.start().await?;
///
/// let entry = registry.get_namespace(&"billing".into())?;
/// assert!(entry.active_in_cluster("us-east-1"));
///
/// registry.stop().await;
/// ```
pub struct NamespaceRegistry {
    published: Arc<PublishedIndex>,
    notifier: Arc<Notifier>,
    refresher: Arc<Refresher>,
    stats: Arc<CacheStats>,
    refresh_trigger: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl NamespaceRegistry {
    /// Create a registry over the given store. No I/O happens until
    /// [`start`](Self::start).
    pub fn new(store: Arc<dyn MetadataStore>, config: CacheConfig) -> Self {
        let published = Arc::new(PublishedIndex::new());
        let stats = Arc::new(CacheStats::new());
        let notifier = Arc::new(Notifier::new(Arc::clone(&published)));
        let refresher = Arc::new(Refresher::new(
            store,
            Arc::clone(&published),
            Arc::clone(&notifier),
            Arc::clone(&stats),
            config,
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            published,
            notifier,
            refresher,
            stats,
            refresh_trigger: Arc::new(Notify::new()),
            shutdown_tx,
            shutdown_rx,
            worker: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Load the initial snapshot and launch the background refresh worker.
    ///
    /// With `enable_prefetch_on_start` set (the default) the initial refresh
    /// runs inline and its store error fails `start`; this is the only
    /// operation that surfaces store failures. Without prefetch the worker
    /// refreshes as soon as it is scheduled and lookups return
    /// [`RegistryError::NotReady`] until the first cycle lands. Calling
    /// `start` on a started registry is a no-op.
    pub async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if self.refresher.config().enable_prefetch_on_start {
            if let Err(error) = self.refresher.refresh().await {
                self.started.store(false, Ordering::SeqCst);
                return Err(error);
            }
        } else {
            self.refresh_trigger.notify_one();
        }

        let handle = tokio::spawn(refresh_loop(
            Arc::clone(&self.refresher),
            Arc::clone(&self.refresh_trigger),
            self.shutdown_rx.clone(),
        ));
        *self.worker.lock().expect("worker handle lock poisoned") = Some(handle);
        info!(
            namespaces = self.namespace_count(),
            "namespace registry started"
        );
        Ok(())
    }

    /// Stop the background worker and wait for it to exit.
    ///
    /// An in-flight callback dispatch completes before this returns; an
    /// in-flight store call is abandoned. Idempotent.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
        let handle = self.worker.lock().expect("worker handle lock poisoned").take();
        if let Some(handle) = handle {
            if handle.await.is_err() {
                warn!("namespace refresh worker panicked");
            }
            info!("namespace registry stopped");
        }
    }

    /// Point lookup by name against the current snapshot.
    pub fn get_namespace(&self, name: &NamespaceName) -> Result<Arc<NamespaceEntry>> {
        let index = self.published.load().ok_or(RegistryError::NotReady)?;
        match index.lookup_by_name(name.as_str()) {
            Some(entry) => {
                self.stats.record_hit();
                trace!(%name, "namespace lookup hit");
                Ok(Arc::clone(entry))
            }
            None => {
                self.stats.record_miss();
                trace!(%name, "namespace lookup miss");
                Err(RegistryError::not_found(name.as_str()))
            }
        }
    }

    /// Point lookup by id against the current snapshot.
    pub fn get_namespace_by_id(&self, id: &NamespaceId) -> Result<Arc<NamespaceEntry>> {
        let index = self.published.load().ok_or(RegistryError::NotReady)?;
        match index.lookup_by_id(id.as_str()) {
            Some(entry) => {
                self.stats.record_hit();
                trace!(%id, "namespace lookup hit");
                Ok(Arc::clone(entry))
            }
            None => {
                self.stats.record_miss();
                trace!(%id, "namespace lookup miss");
                Err(RegistryError::not_found(id.as_str()))
            }
        }
    }

    /// Subscribe to namespace changes.
    ///
    /// `initial_notification_version` is the first store version the
    /// subscriber has not yet seen. If the current snapshot is ahead of it
    /// the subscriber is caught up synchronously before this returns;
    /// otherwise it starts receiving batches from the next refresh.
    /// Registration shares a lock with dispatch, so a subscriber never
    /// observes a partial mix of catch-up and live batches. Registering an
    /// already-registered shard id replaces its callbacks.
    pub fn register_namespace_change_callback(
        &self,
        shard_id: ShardId,
        initial_notification_version: i64,
        prepare: PrepareCallback,
        apply: ChangeCallback,
    ) {
        self.notifier
            .register(shard_id, initial_notification_version, prepare, apply);
    }

    /// Remove a subscription; its callbacks are never invoked again.
    pub fn unregister_namespace_change_callback(&self, shard_id: ShardId) {
        self.notifier.unregister(shard_id);
    }

    /// Ask the worker for an immediate refresh.
    ///
    /// Non-blocking. Triggers arriving while a cycle is in flight coalesce;
    /// at least one full cycle begins after every call.
    pub fn request_refresh(&self) {
        self.refresh_trigger.notify_one();
    }

    /// All entries in the current snapshot, in unspecified order.
    pub fn all_namespaces(&self) -> Result<Vec<Arc<NamespaceEntry>>> {
        let index = self.published.load().ok_or(RegistryError::NotReady)?;
        Ok(index.entries().map(Arc::clone).collect())
    }

    /// Number of namespaces in the current snapshot; 0 before the first
    /// refresh.
    pub fn namespace_count(&self) -> usize {
        self.published.load().map_or(0, |index| index.len())
    }

    /// Whether a first refresh has completed.
    pub fn is_ready(&self) -> bool {
        self.published.is_ready()
    }

    /// Instance-local operation counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

impl fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceRegistry")
            .field("ready", &self.is_ready())
            .field("namespaces", &self.namespace_count())
            .field("subscriptions", &self.notifier.subscription_count())
            .finish()
    }
}

impl Drop for NamespaceRegistry {
    fn drop(&mut self) {
        // If stop() was skipped, let the detached worker exit on its own.
        let _ = self.shutdown_tx.send(true);
    }
}
