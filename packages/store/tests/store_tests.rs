//! Store operation tests

use mediakit_store::{
    ChangeOrigin, Component, Direction, LayoutType, MemoryCache, PartialSnapshot, Snapshot, Store,
};
use serde_json::json;

fn store() -> Store {
    Store::new(Box::new(MemoryCache::new()))
}

fn assert_references_intact(snapshot: &Snapshot) {
    assert!(
        snapshot.integrity_violations().is_empty(),
        "broken references: {:?}",
        snapshot.integrity_violations()
    );
}

#[test]
fn test_add_first_component_gets_c1() {
    let mut store = store();
    let mut rx = store.subscribe();

    let id = store.add_component(Component::new("A"));

    assert_eq!(id, "c1");
    assert_eq!(store.snapshot().layout_order, vec!["c1"]);
    assert_eq!(store.component("c1").unwrap().kind, "A");

    let event = rx.try_recv().unwrap();
    assert_eq!(event.origin, ChangeOrigin::Local);
    assert_eq!(event.snapshot.layout_order, vec!["c1"]);
}

#[test]
fn test_add_component_keeps_explicit_id() {
    let mut store = store();
    let id = store.add_component(Component::new("hero").with_id("intro"));
    assert_eq!(id, "intro");

    // Upsert does not duplicate the order entry
    store.add_component(Component::new("hero").with_id("intro").with_data("title", "New"));
    assert_eq!(store.snapshot().layout_order, vec!["intro"]);
    assert_eq!(
        store.component("intro").unwrap().text("title").as_deref(),
        Some("New")
    );
}

#[test]
fn test_update_component_merges() {
    let mut store = store();
    let id = store.add_component(
        Component::new("hero")
            .with_data("title", "Hello")
            .with_data("subtitle", "World"),
    );

    let patch = json!({"title": "Hi"}).as_object().cloned().unwrap();
    assert!(store.update_component(&id, patch));

    let component = store.component(&id).unwrap();
    assert_eq!(component.text("title").as_deref(), Some("Hi"));
    assert_eq!(component.text("subtitle").as_deref(), Some("World"));
}

#[test]
fn test_update_component_replaces_nested_objects() {
    let mut store = store();
    let id = store.add_component(Component::new("hero").with_data("title", "Hello"));
    let styled = json!({"style": {"color": "red", "size": 2}}).as_object().cloned().unwrap();
    store.update_component(&id, styled);

    let patch = json!({"style": {"color": "blue"}}).as_object().cloned().unwrap();
    assert!(store.update_component(&id, patch));

    let component = store.component(&id).unwrap();
    assert_eq!(component.data["style"], json!({"color": "blue"}));
    assert_eq!(component.text("title").as_deref(), Some("Hello"));
}

#[test]
fn test_unknown_ids_fail_silently() {
    let mut store = store();
    let mut rx = store.subscribe();

    assert!(!store.update_component("c9", Default::default()));
    assert!(!store.remove_component("c9"));
    assert!(!store.move_component("c9", Direction::Up));
    assert!(store.duplicate_component("c9").is_none());
    assert!(!store.assign_component("c9", "s1", 1));

    assert!(rx.try_recv().is_err());
}

#[test]
fn test_remove_assigned_component_clears_every_reference() {
    let mut store = store();
    let c1 = store.add_component(Component::new("hero"));
    let c2 = store.add_component(Component::new("bio"));
    let s1 = store.add_section(LayoutType::TwoColumn);
    assert!(store.assign_component(&c1, &s1, 1));
    assert!(store.assign_component(&c2, &s1, 2));

    assert!(store.remove_component(&c1));

    let snapshot = store.snapshot();
    assert!(!snapshot.components.contains_key(&c1));
    assert!(!snapshot.layout_order.contains(&c1));
    let section = snapshot.section(&s1).unwrap();
    assert!(!section.contains(&c1));
    assert!(section.contains(&c2));
    assert_references_intact(snapshot);
}

#[test]
fn test_set_state_shallow_merge() {
    let mut store = store();
    store.add_component(Component::new("hero"));
    store.set_theme("midnight");

    let incoming: PartialSnapshot = serde_json::from_value(json!({
        "components": {
            "c7": {"id": "c7", "type": "contact", "data": {"email": "a@b.c"}}
        },
        "layoutOrder": ["c7", "c1"]
    }))
    .unwrap();
    store.set_state(incoming);

    let snapshot = store.snapshot();
    // components replaced wholesale, dangling c1 stripped from the order
    assert_eq!(snapshot.components.len(), 1);
    assert_eq!(snapshot.layout_order, vec!["c7"]);
    // untouched keys survive
    assert_eq!(snapshot.theme(), "midnight");
    assert_references_intact(snapshot);

    // New ids skip past hydrated ones
    assert_eq!(store.add_component(Component::new("hero")), "c8");
}

#[test]
fn test_sections_lifecycle() {
    let mut store = store();
    let c1 = store.add_component(Component::new("hero"));
    let s1 = store.add_section(LayoutType::FullWidth);
    let s2 = store.add_section(LayoutType::Grid);
    let s3 = store.insert_section_after(&s1, LayoutType::Hero).unwrap();

    let ids: Vec<_> = store.snapshot().sections.iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids, vec![s1.clone(), s3.clone(), s2.clone()]);

    assert!(store.assign_component(&c1, &s3, 4));
    assert_eq!(store.snapshot().section(&s3).unwrap().column_assignment[0].column, 1);

    assert!(store.retype_section(&s3, LayoutType::ThreeColumn));
    assert!(store.remove_section(&s3));
    assert!(store.insert_section_after("nope", LayoutType::Grid).is_none());

    // Components survive section removal
    assert!(store.component(&c1).is_some());
    assert_eq!(store.snapshot().layout_order, vec![c1]);
}

#[test]
fn test_move_and_duplicate() {
    let mut store = store();
    let c1 = store.add_component(Component::new("hero"));
    let c2 = store.add_component(Component::new("bio").with_data("name", "Ada"));

    assert!(store.move_component(&c2, Direction::Up));
    assert_eq!(store.snapshot().layout_order, vec![c2.clone(), c1.clone()]);
    assert!(!store.move_component(&c2, Direction::Up));

    let copy = store.duplicate_component(&c2).unwrap();
    assert_eq!(store.snapshot().layout_order, vec![c2.clone(), copy.clone(), c1]);
    assert_eq!(
        store.component(&copy).unwrap().data,
        store.component(&c2).unwrap().data
    );
}

#[test]
fn test_invariants_hold_across_operation_mix() {
    let mut store = store();
    let mut rx = store.subscribe();

    let ids: Vec<String> = (0..6)
        .map(|i| store.add_component(Component::new("topics").with_data("n", i)))
        .collect();
    let s1 = store.add_section(LayoutType::ThreeColumn);
    let s2 = store.add_section(LayoutType::MainAside);

    for (i, id) in ids.iter().enumerate() {
        let section = if i % 2 == 0 { &s1 } else { &s2 };
        store.assign_component(id, section, i as i32 - 1);
    }
    store.duplicate_component(&ids[2]);
    store.remove_component(&ids[0]);
    store.move_component(&ids[4], Direction::Down);
    store.remove_section(&s2);
    store.remove_component(&ids[3]);
    store.set_layout_order(vec!["ghost".into(), ids[5].clone()]);
    store.undo();
    store.undo();

    while let Ok(event) = rx.try_recv() {
        assert_references_intact(&event.snapshot);
    }
    assert_references_intact(store.snapshot());
}

#[test]
fn test_global_settings_merge() {
    let mut store = store();
    store.set_theme("sunrise");
    store.update_global_settings(json!({"fontScale": 1.2}).as_object().cloned().unwrap());

    let settings = &store.snapshot().global_settings;
    assert_eq!(settings["theme"], "sunrise");
    assert_eq!(settings["fontScale"], 1.2);

    store.update_global_settings(json!({"colors": {"accent": "#f00", "base": "#000"}}).as_object().cloned().unwrap());
    store.update_global_settings(json!({"colors": {"accent": "#0f0"}}).as_object().cloned().unwrap());
    assert_eq!(store.snapshot().global_settings["colors"], json!({"accent": "#0f0"}));
}

#[test]
fn test_history_limit() {
    let mut store = store().with_history_limit(2);
    let id = store.add_component(Component::new("hero"));
    for title in ["a", "b", "c"] {
        store.set_field(&id, "title", title);
    }

    assert!(store.undo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.component(&id).unwrap().text("title").as_deref(), Some("a"));
}

#[test]
fn test_history_signals_carry_origin() {
    let mut store = store();
    store.add_component(Component::new("hero"));
    let mut rx = store.subscribe();

    store.undo();
    let event = rx.try_recv().unwrap();
    assert_eq!(event.origin, ChangeOrigin::History);
    assert!(event.snapshot.components.is_empty());
}
