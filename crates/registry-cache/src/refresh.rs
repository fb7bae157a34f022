//! Periodic reload of the namespace list and ordered change detection.
//!
//! One refresh cycle turns the store's paginated listing into a fresh
//! [`NamespaceIndex`], publishes it with a single atomic store and hands the
//! ordered change set to the notifier. Failures abort the cycle and leave
//! the previously published index untouched; the next tick retries.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use registry_core::{
    ListNamespacesRequest, MetadataStore, NamespaceRecord, RegistryError, Result,
};
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::entry::NamespaceEntry;
use crate::index::{NamespaceIndex, PublishedIndex};
use crate::notify::{NamespaceChange, Notifier};
use crate::stats::CacheStats;

pub(crate) struct Refresher {
    store: Arc<dyn MetadataStore>,
    published: Arc<PublishedIndex>,
    notifier: Arc<Notifier>,
    stats: Arc<CacheStats>,
    config: CacheConfig,
}

impl Refresher {
    pub(crate) fn new(
        store: Arc<dyn MetadataStore>,
        published: Arc<PublishedIndex>,
        notifier: Arc<Notifier>,
        stats: Arc<CacheStats>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            published,
            notifier,
            stats,
            config,
        }
    }

    pub(crate) fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Run one full refresh cycle, recording the outcome.
    pub(crate) async fn refresh(&self) -> Result<()> {
        let started = Instant::now();
        let outcome = self.refresh_once().await;
        match &outcome {
            Ok(()) => {
                self.stats.record_refresh_success();
                counter!("namespace_refresh_success_total").increment(1);
                histogram!("namespace_refresh_duration_seconds")
                    .record(started.elapsed().as_secs_f64());
            }
            Err(error) => {
                self.stats.record_refresh_failure();
                counter!("namespace_refresh_failures_total").increment(1);
                warn!(%error, "namespace refresh failed, keeping previous snapshot");
            }
        }
        outcome
    }

    async fn refresh_once(&self) -> Result<()> {
        // The store version read up front fences the cycle: it is the
        // exclusive upper bound for every record admitted below.
        let store_version = self
            .call_store("get_metadata", self.store.get_metadata())
            .await?
            .notification_version;
        let records = self.drain_namespaces().await?;

        let old_index = self.published.load();

        let mut entries = Vec::with_capacity(records.len());
        let mut deferred = 0usize;
        for record in records {
            // A write landing mid-enumeration may surface on a later page
            // with no trustworthy order relative to earlier pages; leave it
            // for the next cycle.
            if record.notification_version >= store_version {
                deferred += 1;
                continue;
            }
            entries.push(Arc::new(NamespaceEntry::from_record(record)));
        }

        let index = Arc::new(NamespaceIndex::new(entries, store_version));
        let changes = diff(old_index.as_deref(), &index);

        debug!(
            entries = index.len(),
            changes = changes.len(),
            deferred,
            store_version,
            "namespace refresh cycle complete"
        );
        gauge!("namespace_registry_entries").set(index.len() as f64);

        self.published.publish(Arc::clone(&index));
        if !changes.is_empty() {
            let invoked = self.notifier.dispatch(&changes);
            self.stats.record_callbacks(invoked);
            counter!("namespace_change_callbacks_total").increment(invoked);
        }
        Ok(())
    }

    async fn drain_namespaces(&self) -> Result<Vec<NamespaceRecord>> {
        let mut records = Vec::new();
        let mut next_page_token = None;
        loop {
            let request = ListNamespacesRequest {
                page_size: self.config.page_size,
                next_page_token: next_page_token.take(),
            };
            let page = self
                .call_store("list_namespaces", self.store.list_namespaces(request))
                .await?;
            records.extend(page.namespaces);
            match page.next_page_token {
                Some(token) if !token.is_empty() => next_page_token = Some(token),
                _ => break,
            }
        }
        Ok(records)
    }

    async fn call_store<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.store_call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::StoreTimeout {
                operation,
                timeout: self.config.store_call_timeout,
            }),
        }
    }
}

/// Ordered change set between two successive indexes.
///
/// Creations and updates come first, sorted ascending by the new entry's
/// notification version (ties broken by id); deletions ride at the tail,
/// sorted by the old entry's version. Version monotonicity in the store
/// makes a structural compare unnecessary: a differing version is a change.
fn diff(old: Option<&NamespaceIndex>, new: &NamespaceIndex) -> Vec<NamespaceChange> {
    let mut changes = Vec::new();
    for entry in new.entries() {
        let prev = old.and_then(|index| index.lookup_by_id(entry.id().as_str()));
        match prev {
            Some(prev) if prev.notification_version() == entry.notification_version() => {}
            Some(prev) => changes.push(NamespaceChange::updated(
                Arc::clone(prev),
                Arc::clone(entry),
            )),
            None => changes.push(NamespaceChange::created(Arc::clone(entry))),
        }
    }
    changes.sort_by(|a, b| {
        a.notification_version()
            .cmp(&b.notification_version())
            .then_with(|| {
                let id = |change: &NamespaceChange| {
                    change.next().or(change.prev()).map(|entry| entry.id().clone())
                };
                id(a).cmp(&id(b))
            })
    });

    if let Some(old) = old {
        let mut deleted: Vec<&Arc<NamespaceEntry>> = old
            .entries()
            .filter(|entry| new.lookup_by_id(entry.id().as_str()).is_none())
            .collect();
        deleted.sort_by(|a, b| {
            a.notification_version()
                .cmp(&b.notification_version())
                .then_with(|| a.id().cmp(b.id()))
        });
        changes.extend(
            deleted
                .into_iter()
                .map(|entry| NamespaceChange::deleted(Arc::clone(entry))),
        );
    }
    changes
}

/// Background refresh worker.
///
/// Runs one cycle per tick and one per explicit trigger; triggers arriving
/// while a cycle is in flight coalesce into at most one follow-up cycle.
/// Exits when the shutdown watch flips. Store I/O is abandoned at shutdown,
/// but a callback dispatch that already started always runs to completion
/// (dispatch contains no await point).
pub(crate) async fn refresh_loop(
    refresher: Arc<Refresher>,
    trigger: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let interval = refresher.config().refresh_interval;
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let mut cancel = shutdown.clone();
        tokio::select! {
            _ = async { shutdown.wait_for(|stopped| *stopped).await.ok(); } => break,
            _ = ticker.tick() => cancellable_refresh(&refresher, &mut cancel).await,
            _ = trigger.notified() => cancellable_refresh(&refresher, &mut cancel).await,
        }
    }
    debug!("namespace refresh worker exited");
}

async fn cancellable_refresh(refresher: &Refresher, shutdown: &mut watch::Receiver<bool>) {
    tokio::select! {
        result = refresher.refresh() => {
            // failures already logged and counted
            let _ = result;
        }
        _ = async { shutdown.wait_for(|stopped| *stopped).await.ok(); } => {
            debug!("in-flight refresh abandoned at shutdown");
        }
    }
}
