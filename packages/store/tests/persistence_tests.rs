//! Hydration order and write-through persistence

use mediakit_store::{
    spawn_remote_writer, ChangeOrigin, Component, FileCache, HydrationSource, LayoutType,
    LocalCache, MemoryCache, MemoryRemote, SaveOutcome, Snapshot, Store,
};
use std::sync::Arc;

fn document(kind: &str, title: &str) -> Snapshot {
    let mut store = Store::new(Box::new(MemoryCache::new()));
    let id = store.add_component(Component::new(kind).with_data("title", title));
    let section = store.add_section(LayoutType::TwoColumn);
    store.assign_component(&id, &section, 2);
    store.snapshot().clone()
}

#[tokio::test]
async fn test_cache_supersedes_remote() {
    let cached = document("hero", "from cache");
    let remote = MemoryRemote::with_snapshot(document("bio", "from remote"));
    let cache = MemoryCache::with_snapshot(&cached).unwrap();

    let mut store = Store::new(Box::new(cache));
    let mut rx = store.subscribe();
    let source = store.hydrate(Some(&remote)).await;

    assert_eq!(source, HydrationSource::Cache);
    assert_eq!(store.snapshot(), &cached);

    let event = rx.try_recv().unwrap();
    assert_eq!(event.origin, ChangeOrigin::Hydration);
}

#[tokio::test]
async fn test_empty_cache_falls_back_to_remote() {
    let remote_doc = document("bio", "from remote");
    let remote = MemoryRemote::with_snapshot(remote_doc.clone());
    // A cache holding sections but no components does not count
    let mut sections_only = Snapshot::default();
    sections_only
        .sections
        .push(mediakit_store::Section::new("s1", LayoutType::Grid));
    let cache = MemoryCache::with_snapshot(&sections_only).unwrap();

    let mut store = Store::new(Box::new(cache.clone()));
    let source = store.hydrate(Some(&remote)).await;

    assert_eq!(source, HydrationSource::Remote);
    assert_eq!(store.snapshot(), &remote_doc);
    // Hydration does not write back
    assert_eq!(cache.saves(), 0);
}

#[tokio::test]
async fn test_corrupt_cache_falls_back_to_remote() {
    let remote_doc = document("bio", "from remote");
    let remote = MemoryRemote::with_snapshot(remote_doc.clone());

    let mut store = Store::new(Box::new(MemoryCache::with_raw("{\"components\": [")));
    let source = store.hydrate(Some(&remote)).await;

    assert_eq!(source, HydrationSource::Remote);
    assert_eq!(store.snapshot(), &remote_doc);
}

#[tokio::test]
async fn test_nothing_anywhere_starts_empty() {
    let remote = MemoryRemote::new();
    remote.set_failing(true);

    let mut store = Store::new(Box::new(MemoryCache::new()));
    let mut rx = store.subscribe();
    let source = store.hydrate(Some(&remote)).await;

    assert_eq!(source, HydrationSource::Empty);
    assert!(store.snapshot().is_empty());
    // Still signals so the renderer mounts the empty state
    assert!(rx.try_recv().is_ok());

    let mut offline = Store::new(Box::new(MemoryCache::new()));
    assert_eq!(offline.hydrate(None).await, HydrationSource::Empty);
}

#[tokio::test]
async fn test_hydrated_ids_continue_sequence() {
    let cached = document("hero", "x");
    let mut store = Store::new(Box::new(MemoryCache::with_snapshot(&cached).unwrap()));
    store.hydrate(None).await;

    assert_eq!(store.add_component(Component::new("bio")), "c2");
    assert_eq!(store.add_section(LayoutType::Hero), "s2");
}

#[tokio::test]
async fn test_remote_failure_keeps_local_cache() {
    let remote = MemoryRemote::new();
    remote.set_failing(true);
    let mut writer = spawn_remote_writer(Arc::new(remote.clone()));

    let cache = MemoryCache::new();
    let mut store = Store::new(Box::new(cache.clone())).with_remote(writer.sink.clone());
    let id = store.add_component(Component::new("hero"));

    let outcome = writer.outcomes.recv().await.unwrap();
    assert!(matches!(outcome, SaveOutcome::Failed(_)));

    // The mutation stands and the cache has it
    assert!(store.component(&id).is_some());
    assert!(cache.contents().unwrap().components.contains_key(&id));
    assert!(remote.stored().is_none());
}

#[tokio::test]
async fn test_remote_receives_latest_snapshot() {
    let remote = MemoryRemote::new();
    let mut writer = spawn_remote_writer(Arc::new(remote.clone()));

    let mut store = Store::new(Box::new(MemoryCache::new())).with_remote(writer.sink.clone());
    let id = store.add_component(Component::new("hero"));
    for i in 0..5 {
        store.set_field(&id, "count", i);
    }

    // Drain until the writer has caught up with the final version
    let mut saved = 0;
    while saved < 6 {
        match writer.outcomes.recv().await.unwrap() {
            SaveOutcome::Saved { coalesced, .. } => saved += 1 + coalesced,
            SaveOutcome::Failed(e) => panic!("unexpected failure: {e}"),
        }
    }

    assert_eq!(remote.stored().as_ref(), Some(store.snapshot()));
}

#[tokio::test]
async fn test_cache_write_failure_is_not_fatal() {
    let cache = MemoryCache::new();
    cache.set_failing(true);
    let mut store = Store::new(Box::new(cache.clone()));
    let mut rx = store.subscribe();

    let id = store.add_component(Component::new("hero"));

    assert!(store.component(&id).is_some());
    assert!(rx.try_recv().is_ok());
    assert_eq!(cache.saves(), 0);
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".mediakit").join("state.json");

    let mut first = Store::new(Box::new(FileCache::new(&path)));
    first.hydrate(None).await;
    let id = first.add_component(Component::new("contact").with_data("email", "hi@example.com"));
    let expected = first.snapshot().clone();
    drop(first);

    let mut second = Store::new(Box::new(FileCache::new(&path)));
    assert_eq!(second.hydrate(None).await, HydrationSource::Cache);
    assert_eq!(second.snapshot(), &expected);
    assert!(second.component(&id).is_some());
}

#[tokio::test]
async fn test_reload_from_cache_detects_external_change() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut store = Store::new(Box::new(FileCache::new(&path)));
    store.hydrate(None).await;
    store.add_component(Component::new("hero"));

    // Own write reads back identical
    assert!(!store.reload_from_cache().unwrap());

    let mut external = FileCache::new(&path);
    external.save(&document("bio", "edited elsewhere")).unwrap();

    let mut rx = store.subscribe();
    assert!(store.reload_from_cache().unwrap());
    assert_eq!(rx.try_recv().unwrap().origin, ChangeOrigin::Reload);
    assert_eq!(store.component("c1").unwrap().kind, "bio");
}
