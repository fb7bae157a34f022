//! End-to-end registry behavior against scripted and in-memory stores.

mod support;

use std::sync::{Arc, Mutex};

use namespace_registry::prelude::*;
use support::{namespace_record, wait_until, InMemoryStore, ScriptedStore};

/// Record fixture with a fixed id, for tests that pin exact interleavings.
fn record(name: &str, id: &str, notification_version: i64) -> NamespaceRecord {
    let mut record = namespace_record(name, 1);
    record.id = NamespaceId::new(id);
    record.notification_version = notification_version;
    record
}

#[tokio::test]
async fn list_across_two_pages_indexes_everything() {
    let store = ScriptedStore::new();
    store.expect_metadata(3);
    store.expect_page(vec![record("alpha", "i1", 0)], Some(b"t"));
    store.expect_page(vec![record("beta", "i2", 1), record("gamma", "i3", 2)], None);

    let registry = NamespaceRegistry::new(store, CacheConfig::default());
    registry.start().await.expect("start succeeds");
    assert_eq!(registry.namespace_count(), 3);

    let beta = registry
        .get_namespace(&NamespaceName::new("beta"))
        .expect("beta resolvable by name");
    assert_eq!(*beta, NamespaceEntry::from_record(record("beta", "i2", 1)));

    let gamma = registry
        .get_namespace_by_id(&NamespaceId::new("i3"))
        .expect("gamma resolvable by id");
    assert_eq!(*gamma, NamespaceEntry::from_record(record("gamma", "i3", 2)));

    // name and id paths hand out the same allocation
    let beta_by_id = registry
        .get_namespace_by_id(&NamespaceId::new("i2"))
        .expect("beta resolvable by id");
    assert!(Arc::ptr_eq(&beta, &beta_by_id));

    registry.stop().await;
}

#[tokio::test]
async fn mid_enumeration_write_waits_for_the_next_cycle() {
    let store = ScriptedStore::new();
    // gamma's version equals the metadata fence: it landed mid-enumeration
    store.expect_metadata(2);
    store.expect_page(vec![record("alpha", "i1", 0)], Some(b"t"));
    store.expect_page(vec![record("beta", "i2", 1), record("gamma", "i3", 2)], None);

    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, CacheConfig::default());
    registry.start().await.expect("start succeeds");

    assert_eq!(registry.namespace_count(), 2);
    assert!(matches!(
        registry.get_namespace(&NamespaceName::new("gamma")),
        Err(RegistryError::NotFound { .. })
    ));

    // next cycle observes a fence past gamma and picks it up
    store.expect_metadata(3);
    store.expect_page(
        vec![
            record("alpha", "i1", 0),
            record("beta", "i2", 1),
            record("gamma", "i3", 2),
        ],
        None,
    );
    registry.request_refresh();
    wait_until(|| registry.namespace_count() == 3).await;
    assert!(registry.get_namespace(&NamespaceName::new("gamma")).is_ok());

    registry.stop().await;
}

#[tokio::test]
async fn late_registration_catches_up_in_version_order() {
    let store = ScriptedStore::new();
    store.expect_metadata(3);
    store.expect_page(
        vec![
            record("alpha", "i1", 0),
            record("beta", "i2", 1),
            record("gamma", "i3", 2),
        ],
        None,
    );

    let registry = NamespaceRegistry::new(store, CacheConfig::default());
    registry.start().await.expect("start succeeds");

    let prepares = Arc::new(Mutex::new(0u32));
    let deliveries: Arc<Mutex<Vec<(Vec<Option<NamespaceEntry>>, Vec<NamespaceEntry>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let prepare_count = Arc::clone(&prepares);
    let delivery_log = Arc::clone(&deliveries);
    registry.register_namespace_change_callback(
        0,
        0,
        Box::new(move || *prepare_count.lock().unwrap() += 1),
        Box::new(move |prevs, nexts| {
            delivery_log.lock().unwrap().push((
                prevs.iter().map(|e| e.as_deref().cloned()).collect(),
                nexts.iter().map(|e| (**e.as_ref().unwrap()).clone()).collect(),
            ));
        }),
    );

    assert_eq!(*prepares.lock().unwrap(), 1);
    let deliveries = deliveries.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    let (prevs, nexts) = &deliveries[0];
    assert_eq!(prevs, &vec![None, None, None]);
    assert_eq!(
        nexts,
        &vec![
            NamespaceEntry::from_record(record("alpha", "i1", 0)),
            NamespaceEntry::from_record(record("beta", "i2", 1)),
            NamespaceEntry::from_record(record("gamma", "i3", 2)),
        ]
    );

    registry.stop().await;
}

#[tokio::test]
async fn changes_are_delivered_sorted_by_new_version() {
    let store = ScriptedStore::new();
    store.expect_metadata(2);
    store.expect_page(vec![record("alpha", "i1", 0), record("beta", "i2", 1)], None);

    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, CacheConfig::default());
    registry.start().await.expect("start succeeds");

    let deliveries: Arc<Mutex<Vec<(Vec<Option<NamespaceEntry>>, Vec<NamespaceEntry>)>>> =
        Arc::new(Mutex::new(Vec::new()));
    let delivery_log = Arc::clone(&deliveries);
    // current with the snapshot: no catch-up fires
    registry.register_namespace_change_callback(
        0,
        2,
        Box::new(|| {}),
        Box::new(move |prevs, nexts| {
            delivery_log.lock().unwrap().push((
                prevs.iter().map(|e| e.as_deref().cloned()).collect(),
                nexts.iter().map(|e| (**e.as_ref().unwrap()).clone()).collect(),
            ));
        }),
    );
    assert!(deliveries.lock().unwrap().is_empty());

    // beta failed over first (v2), alpha's description changed later (v3)
    let beta_new = {
        let mut r = record("beta", "i2", 2);
        r.replication.active_cluster = "standby".to_string();
        r.failover_version = 1;
        r
    };
    let alpha_new = {
        let mut r = record("alpha", "i1", 3);
        r.info.description = "updated description".to_string();
        r.config_version = 1;
        r
    };
    store.expect_metadata(4);
    store.expect_page(vec![alpha_new.clone(), beta_new.clone()], None);

    registry.request_refresh();
    wait_until(|| !deliveries.lock().unwrap().is_empty()).await;

    let deliveries = deliveries.lock().unwrap();
    assert_eq!(deliveries.len(), 1, "one batch, not one call per change");
    let (prevs, nexts) = &deliveries[0];
    // ascending new version: beta (2) before alpha (3)
    assert_eq!(
        prevs,
        &vec![
            Some(NamespaceEntry::from_record(record("beta", "i2", 1))),
            Some(NamespaceEntry::from_record(record("alpha", "i1", 0))),
        ]
    );
    assert_eq!(
        nexts,
        &vec![
            NamespaceEntry::from_record(beta_new),
            NamespaceEntry::from_record(alpha_new),
        ]
    );

    registry.stop().await;
}

#[tokio::test]
async fn unchanged_snapshot_triggers_no_callbacks() {
    let store = ScriptedStore::new();
    store.expect_metadata(2);
    store.expect_page(vec![record("alpha", "i1", 0), record("beta", "i2", 1)], None);

    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, CacheConfig::default());
    registry.start().await.expect("start succeeds");

    let applies = Arc::new(Mutex::new(0u32));
    let apply_count = Arc::clone(&applies);
    registry.register_namespace_change_callback(
        0,
        2,
        Box::new(|| {}),
        Box::new(move |_, _| *apply_count.lock().unwrap() += 1),
    );

    // identical store state: same fence, same records
    store.expect_metadata(2);
    store.expect_page(vec![record("alpha", "i1", 0), record("beta", "i2", 1)], None);
    registry.request_refresh();
    wait_until(|| registry.stats().refresh_successes() >= 2).await;

    assert_eq!(*applies.lock().unwrap(), 0);
    assert_eq!(registry.stats().callbacks_invoked(), 0);

    registry.stop().await;
}

#[tokio::test]
async fn deletions_arrive_with_no_next_entry() {
    let store = InMemoryStore::new();
    let alpha = namespace_record("alpha", 1);
    let beta = namespace_record("beta", 2);
    let beta_id = beta.id.clone();
    store.put(alpha);
    let beta_version = store.put(beta);

    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, CacheConfig::default());
    registry.start().await.expect("start succeeds");
    assert_eq!(registry.namespace_count(), 2);

    let deletions: Arc<Mutex<Vec<(NamespaceId, i64, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let deletion_log = Arc::clone(&deletions);
    registry.register_namespace_change_callback(
        0,
        store.version(),
        Box::new(|| {}),
        Box::new(move |prevs, nexts| {
            for (prev, next) in prevs.iter().zip(nexts) {
                if let Some(prev) = prev {
                    deletion_log.lock().unwrap().push((
                        prev.id().clone(),
                        prev.notification_version(),
                        next.is_none(),
                    ));
                }
            }
        }),
    );

    store.remove(&beta_id);
    registry.request_refresh();
    wait_until(|| !deletions.lock().unwrap().is_empty()).await;

    let deletions = deletions.lock().unwrap();
    assert_eq!(deletions.len(), 1);
    assert_eq!(deletions[0], (beta_id.clone(), beta_version, true));
    assert!(matches!(
        registry.get_namespace_by_id(&beta_id),
        Err(RegistryError::NotFound { .. })
    ));

    registry.stop().await;
}

#[tokio::test]
async fn cold_start_without_prefetch_becomes_ready_on_its_own() {
    let store = InMemoryStore::new();
    store.put(namespace_record("alpha", 1));

    let config = CacheConfig {
        enable_prefetch_on_start: false,
        ..CacheConfig::default()
    };
    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, config);
    registry.start().await.expect("start without prefetch");

    wait_until(|| registry.is_ready()).await;
    assert!(registry.get_namespace(&NamespaceName::new("alpha")).is_ok());

    registry.stop().await;
}

#[tokio::test]
async fn pagination_drains_large_listings() {
    let store = InMemoryStore::new();
    for i in 0..25 {
        store.put(namespace_record(&format!("ns-{i:02}"), 1));
    }

    let config = CacheConfig {
        page_size: 10,
        ..CacheConfig::default()
    };
    let registry = NamespaceRegistry::new(Arc::clone(&store) as Arc<dyn MetadataStore>, config);
    registry.start().await.expect("start succeeds");

    assert_eq!(registry.namespace_count(), 25);
    let all = registry.all_namespaces().expect("ready");
    assert_eq!(all.len(), 25);

    registry.stop().await;
}
