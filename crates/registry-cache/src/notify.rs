//! Subscription registry and ordered change dispatch.
//!
//! Subscribers (typically shard controllers) register a pair of callbacks:
//! a prepare barrier, invoked before a change batch becomes visible so the
//! subscriber can quiesce in-flight work, and an apply callback carrying the
//! aligned previous/next entry lists. One mutex serialises register,
//! unregister and dispatch, so a new subscriber either observes a full
//! catch-up snapshot or starts cleanly from the next dispatch, never a
//! partial mix.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::entry::NamespaceEntry;
use crate::index::PublishedIndex;

/// Caller-chosen key identifying a subscription; used for deregistration and
/// de-duplication.
pub type ShardId = i32;

/// Barrier invoked before a change batch is applied.
pub type PrepareCallback = Box<dyn FnMut() + Send>;

/// Receives aligned previous/next entry lists, sorted ascending by
/// notification version. A `None` in the previous list marks a creation (or
/// a catch-up delivery); a `None` in the next list marks a deletion.
pub type ChangeCallback =
    Box<dyn FnMut(&[Option<Arc<NamespaceEntry>>], &[Option<Arc<NamespaceEntry>>]) + Send>;

/// One element of a refresh's change set.
///
/// The change set is shared: every subscriber receiving a change receives
/// the same `Arc` allocations.
#[derive(Clone, Debug)]
pub struct NamespaceChange {
    prev: Option<Arc<NamespaceEntry>>,
    next: Option<Arc<NamespaceEntry>>,
}

impl NamespaceChange {
    /// A namespace absent from the previous index.
    pub fn created(next: Arc<NamespaceEntry>) -> Self {
        Self {
            prev: None,
            next: Some(next),
        }
    }

    /// A namespace present in both indexes at different versions.
    pub fn updated(prev: Arc<NamespaceEntry>, next: Arc<NamespaceEntry>) -> Self {
        Self {
            prev: Some(prev),
            next: Some(next),
        }
    }

    /// A namespace present in the previous index only.
    pub fn deleted(prev: Arc<NamespaceEntry>) -> Self {
        Self {
            prev: Some(prev),
            next: None,
        }
    }

    /// Entry before the change, if it existed.
    #[inline]
    pub fn prev(&self) -> Option<&Arc<NamespaceEntry>> {
        self.prev.as_ref()
    }

    /// Entry after the change; `None` for deletions.
    #[inline]
    pub fn next(&self) -> Option<&Arc<NamespaceEntry>> {
        self.next.as_ref()
    }

    /// The version ordering this change within a batch: the new entry's
    /// notification version, falling back to the old one's for deletions.
    pub fn notification_version(&self) -> i64 {
        self.next
            .as_deref()
            .or(self.prev.as_deref())
            .map(NamespaceEntry::notification_version)
            .unwrap_or_default()
    }
}

struct Subscription {
    /// Highest notification version already delivered to this subscriber.
    last_acked_version: i64,
    prepare: PrepareCallback,
    apply: ChangeCallback,
}

/// Registry of change subscribers and the dispatch path feeding them.
pub(crate) struct Notifier {
    published: Arc<PublishedIndex>,
    subscriptions: Mutex<HashMap<ShardId, Subscription>>,
}

impl Notifier {
    pub(crate) fn new(published: Arc<PublishedIndex>) -> Self {
        Self {
            published,
            subscriptions: Mutex::new(HashMap::new()),
        }
    }

    /// Add a subscription, catching it up against the current index first if
    /// it is behind.
    ///
    /// `initial_notification_version` is the first version the subscriber has
    /// not yet seen. If the published index is ahead of it, every current
    /// entry at or above that version is delivered immediately as a synthetic
    /// batch (`prev` entries all `None`), sorted ascending. Re-registering an
    /// existing shard id replaces the previous subscription.
    pub(crate) fn register(
        &self,
        shard_id: ShardId,
        initial_notification_version: i64,
        mut prepare: PrepareCallback,
        mut apply: ChangeCallback,
    ) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("subscription lock poisoned");

        let mut last_acked_version = initial_notification_version.saturating_sub(1);
        if let Some(index) = self.published.load() {
            if initial_notification_version < index.max_seen_version() {
                let mut catch_up: Vec<&Arc<NamespaceEntry>> = index
                    .entries()
                    .filter(|entry| entry.notification_version() >= initial_notification_version)
                    .collect();
                catch_up.sort_by(|a, b| {
                    a.notification_version()
                        .cmp(&b.notification_version())
                        .then_with(|| a.id().cmp(b.id()))
                });

                if !catch_up.is_empty() {
                    let prevs: Vec<Option<Arc<NamespaceEntry>>> = vec![None; catch_up.len()];
                    let nexts: Vec<Option<Arc<NamespaceEntry>>> =
                        catch_up.iter().map(|entry| Some(Arc::clone(entry))).collect();
                    prepare();
                    apply(&prevs, &nexts);
                    last_acked_version = catch_up
                        .last()
                        .map(|entry| entry.notification_version())
                        .unwrap_or(last_acked_version);
                    debug!(
                        shard_id,
                        delivered = catch_up.len(),
                        "caught subscriber up to current snapshot"
                    );
                }
            }
        }

        subscriptions.insert(
            shard_id,
            Subscription {
                last_acked_version,
                prepare,
                apply,
            },
        );
        debug!(shard_id, "registered namespace change callback");
    }

    /// Remove a subscription. Its callbacks are never invoked again.
    pub(crate) fn unregister(&self, shard_id: ShardId) {
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("subscription lock poisoned");
        if subscriptions.remove(&shard_id).is_some() {
            debug!(shard_id, "unregistered namespace change callback");
        } else {
            warn!(shard_id, "attempted to unregister unknown callback");
        }
    }

    /// Fan a refresh's change set out to every subscription that has not yet
    /// seen it. `changes` must already be in delivery order. Returns the
    /// number of subscriptions invoked.
    pub(crate) fn dispatch(&self, changes: &[NamespaceChange]) -> u64 {
        if changes.is_empty() {
            return 0;
        }
        let mut subscriptions = self
            .subscriptions
            .lock()
            .expect("subscription lock poisoned");

        let mut invoked = 0;
        for (shard_id, subscription) in subscriptions.iter_mut() {
            // Deletions are keyed by the old entry's version, which the
            // subscriber has usually acked already; they always go through.
            let pending: Vec<&NamespaceChange> = changes
                .iter()
                .filter(|change| {
                    change.next().is_none()
                        || change.notification_version() > subscription.last_acked_version
                })
                .collect();
            if pending.is_empty() {
                continue;
            }

            let prevs: Vec<Option<Arc<NamespaceEntry>>> =
                pending.iter().map(|change| change.prev().cloned()).collect();
            let nexts: Vec<Option<Arc<NamespaceEntry>>> =
                pending.iter().map(|change| change.next().cloned()).collect();

            (subscription.prepare)();
            (subscription.apply)(&prevs, &nexts);
            subscription.last_acked_version = pending
                .iter()
                .filter(|change| change.next().is_some())
                .map(|change| change.notification_version())
                .fold(subscription.last_acked_version, i64::max);
            invoked += 1;
            debug!(
                shard_id,
                delivered = pending.len(),
                acked = subscription.last_acked_version,
                "delivered namespace changes"
            );
        }
        invoked
    }

    /// Number of active subscriptions.
    pub(crate) fn subscription_count(&self) -> usize {
        self.subscriptions
            .lock()
            .expect("subscription lock poisoned")
            .len()
    }
}
