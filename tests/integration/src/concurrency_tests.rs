//! Concurrent access and delivery-sharing behavior.

mod support;

use std::sync::{Arc, Mutex};

use namespace_registry::prelude::*;
use support::{init_test_logging, namespace_record, wait_until, InMemoryStore};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn thousand_readers_race_an_overlapping_refresh() {
    init_test_logging();

    let store = InMemoryStore::new();
    let mut record = namespace_record("contended", 1);
    record.info.description = "before".to_string();
    let id = record.id.clone();
    store.put(record.clone());

    let registry = Arc::new(NamespaceRegistry::new(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheConfig::default(),
    ));
    registry.start().await.expect("start succeeds");

    // mutate the store and refresh while the readers hammer the id
    record.info.description = "after".to_string();
    store.put(record);
    registry.request_refresh();

    let mut readers = Vec::with_capacity(1000);
    for _ in 0..1000 {
        let registry = Arc::clone(&registry);
        let id = id.clone();
        readers.push(tokio::spawn(async move {
            let entry = registry.get_namespace_by_id(&id).expect("always resolvable");
            entry.info().description.clone()
        }));
    }

    for reader in readers {
        let description = reader.await.expect("reader task completes");
        // every reader sees a complete snapshot, old or new, never a mix
        assert!(description == "before" || description == "after");
    }

    wait_until(|| {
        registry
            .get_namespace_by_id(&id)
            .map(|entry| entry.info().description == "after")
            .unwrap_or(false)
    })
    .await;

    registry.stop().await;
}

#[tokio::test]
async fn subscribers_share_change_set_allocations() {
    let store = InMemoryStore::new();
    let mut record = namespace_record("shared", 1);
    let id = record.id.clone();
    store.put(record.clone());

    let registry = NamespaceRegistry::new(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheConfig::default(),
    );
    registry.start().await.expect("start succeeds");

    let first: Arc<Mutex<Vec<Arc<NamespaceEntry>>>> = Arc::new(Mutex::new(Vec::new()));
    let second: Arc<Mutex<Vec<Arc<NamespaceEntry>>>> = Arc::new(Mutex::new(Vec::new()));
    for (shard_id, sink) in [(1, Arc::clone(&first)), (2, Arc::clone(&second))] {
        registry.register_namespace_change_callback(
            shard_id,
            store.version(),
            Box::new(|| {}),
            Box::new(move |_prevs, nexts| {
                sink.lock()
                    .unwrap()
                    .extend(nexts.iter().map(|e| Arc::clone(e.as_ref().unwrap())));
            }),
        );
    }

    record.config_version += 1;
    store.put(record);
    registry.request_refresh();
    wait_until(|| !second.lock().unwrap().is_empty()).await;

    let first = first.lock().unwrap();
    let second = second.lock().unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id(), &id);
    // both subscribers observed the same allocation, not equal copies
    assert!(Arc::ptr_eq(&first[0], &second[0]));

    registry.stop().await;
}

#[tokio::test]
async fn delivered_versions_climb_across_refreshes() {
    let store = InMemoryStore::new();
    let mut record = namespace_record("climbing", 1);
    store.put(record.clone());

    let registry = NamespaceRegistry::new(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheConfig::default(),
    );
    registry.start().await.expect("start succeeds");

    let versions: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&versions);
    registry.register_namespace_change_callback(
        0,
        store.version(),
        Box::new(|| {}),
        Box::new(move |_prevs, nexts| {
            sink.lock().unwrap().extend(
                nexts
                    .iter()
                    .map(|e| e.as_ref().unwrap().notification_version()),
            );
        }),
    );

    for round in 0..5 {
        record.config_version = round + 1;
        store.put(record.clone());
        registry.request_refresh();
        let expected = (round + 1) as usize;
        wait_until(|| versions.lock().unwrap().len() >= expected).await;
    }

    let versions = versions.lock().unwrap();
    assert_eq!(versions.len(), 5);
    assert!(
        versions.windows(2).all(|pair| pair[0] < pair[1]),
        "versions must climb strictly: {versions:?}"
    );

    registry.stop().await;
}

#[tokio::test]
async fn readers_keep_their_entry_after_it_is_superseded() {
    let store = InMemoryStore::new();
    let mut record = namespace_record("pinned", 1);
    let id = record.id.clone();
    store.put(record.clone());

    let registry = NamespaceRegistry::new(
        Arc::clone(&store) as Arc<dyn MetadataStore>,
        CacheConfig::default(),
    );
    registry.start().await.expect("start succeeds");

    let held = registry.get_namespace_by_id(&id).expect("resolvable");
    let held_version = held.notification_version();

    record.config_version += 1;
    store.put(record);
    registry.request_refresh();
    wait_until(|| {
        registry
            .get_namespace_by_id(&id)
            .map(|entry| entry.notification_version() > held_version)
            .unwrap_or(false)
    })
    .await;

    // the superseded entry is untouched in the reader's hands
    assert_eq!(held.notification_version(), held_version);
    assert_eq!(held.name().as_str(), "pinned");

    registry.stop().await;
}
