//! Renderer and layout composer tests

use mediakit_render::{
    collect_intents, to_html, ComponentAction, HtmlOptions, Intent, Rendered, Renderer,
    SectionAction, TemplateError, TemplateRegistry, TemplateSchema, VNode, VirtualDomDocument,
};
use mediakit_store::{BackgroundType, Component, LayoutType, MemoryCache, Section, SectionOptions, Snapshot, Store};
use std::sync::Arc;

fn registry() -> Arc<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    registry.register(
        "hero",
        |component: &Component| -> Result<Rendered, TemplateError> {
            let title = component.text("title").unwrap_or_default();
            Ok(Rendered::node(
                VNode::element("div").with_class("hero").with_child(
                    VNode::element("h1")
                        .with_attr("data-property", "title")
                        .with_text(title),
                ),
            ))
        },
        Some(TemplateSchema::fields(&["title"])),
    );
    registry.register(
        "broken",
        |_: &Component| -> Result<Rendered, TemplateError> {
            Err(TemplateError::MissingField("name".to_string()))
        },
        None,
    );
    Arc::new(registry)
}

fn store() -> Store {
    Store::new(Box::new(MemoryCache::new()))
}

fn root(document: &VirtualDomDocument) -> &VNode {
    &document.nodes[0]
}

#[test]
fn test_single_component_replaces_empty_state() {
    let mut store = store();
    let mut renderer = Renderer::new(registry());

    let document = renderer.mount(&store);
    assert!(document.find_by_attr("id", "empty-state").is_some());

    let id = store.add_component(Component::new("A"));
    assert_eq!(id, "c1");
    assert!(renderer.pump());

    let document = renderer.output();
    let blocks = document.find_all(|n| n.has_class("mk-component"));
    assert_eq!(blocks.len(), 1);
    assert!(document.find_by_attr("id", "empty-state").is_none());
    // No template for "A": fallback block carrying the id
    assert!(blocks[0].text_content().contains("Component ID: c1"));
}

#[test]
fn test_two_column_section_with_empty_second_column() {
    let mut store = store();
    store.add_component(Component::new("hero").with_data("title", "Hi"));
    let section_id = store.add_section(LayoutType::TwoColumn);
    assert_eq!(section_id, "s1");
    assert!(store.assign_component("c1", "s1", 1));

    let mut renderer = Renderer::new(registry());
    let document = renderer.render(store.snapshot());

    let section = document.section("s1").unwrap();
    assert_eq!(section.attr("data-section-type"), Some("two-column"));

    let columns = section.find_all(|n| n.has_class("mk-section__column"));
    assert_eq!(columns.len(), 2);
    assert!(columns[0]
        .find_first(|n| n.attr("data-component-id") == Some("c1"))
        .is_some());

    let placeholder = columns[1]
        .find_first(|n| n.has_class("mk-section__empty"))
        .unwrap();
    assert_eq!(placeholder.attr("data-section-id"), Some("s1"));
    assert_eq!(placeholder.attr("data-column"), Some("2"));
}

#[test]
fn test_removed_component_leaves_placeholder() {
    let mut store = store();
    store.add_component(Component::new("hero"));
    store.add_section(LayoutType::TwoColumn);
    store.assign_component("c1", "s1", 1);

    let mut renderer = Renderer::new(registry());
    renderer.mount(&store);

    assert!(store.remove_component("c1"));
    assert!(renderer.pump());

    let section = renderer.output().section("s1").unwrap();
    let placeholders = section.find_all(|n| n.has_class("mk-section__empty"));
    assert_eq!(placeholders.len(), 2);
    assert_eq!(placeholders[0].attr("data-column"), Some("1"));
    assert!(store.snapshot().sections[0].column_assignment.is_empty());
}

#[test]
fn test_unknown_layout_renders_like_full_width() {
    let mut snapshot = Snapshot::default();
    snapshot
        .components
        .insert("c1".into(), Component::new("hero").with_id("c1"));
    snapshot.layout_order.push("c1".into());
    snapshot
        .sections
        .push(Section::new("s1", LayoutType::parse("masonry")).with_assignment("c1", 3));

    let mut full_width = snapshot.clone();
    full_width.sections[0] = Section::new("s1", LayoutType::FullWidth).with_assignment("c1", 3);

    let mut renderer = Renderer::new(registry());
    let unknown = renderer.render(&snapshot).clone();
    let known = renderer.render(&full_width).clone();

    assert_eq!(unknown, known);
}

#[test]
fn test_template_failure_and_missing_template_fall_back() {
    let mut store = store();
    store.add_component(Component::new("broken"));
    store.add_component(Component::new("mystery"));
    store.add_component(Component::new("hero").with_data("title", "Fine"));

    let mut renderer = Renderer::new(registry());
    let document = renderer.render(store.snapshot()).clone();

    assert!(document.component("c1").unwrap().has_class("mk-component--fallback"));
    assert!(document.component("c2").unwrap().has_class("mk-component--fallback"));
    let hero = document.component("c3").unwrap();
    assert!(!hero.has_class("mk-component--fallback"));
    assert_eq!(hero.find_by_attr("data-property", "title").unwrap().text_content(), "Fine");
    assert_eq!(renderer.stats().fallbacks, 2);
}

#[test]
fn test_components_follow_layout_order_without_sections() {
    let mut store = store();
    store.add_component(Component::new("hero").with_data("title", "one"));
    store.add_component(Component::new("hero").with_data("title", "two"));
    store.set_layout_order(vec!["c2".into(), "c1".into()]);

    let mut renderer = Renderer::new(registry());
    let document = renderer.render(store.snapshot());

    let ids: Vec<&str> = root(document)
        .children()
        .iter()
        .filter_map(|n| n.attr("data-component-id"))
        .collect();
    assert_eq!(ids, vec!["c2", "c1"]);
}

#[test]
fn test_theme_class_on_root() {
    let mut store = store();
    store.add_component(Component::new("hero"));

    let mut renderer = Renderer::new(registry());
    assert!(root(renderer.render(store.snapshot())).has_class("theme-default"));

    store.set_theme("midnight");
    assert!(root(renderer.render(store.snapshot())).has_class("theme-midnight"));
}

#[test]
fn test_rendering_is_idempotent() {
    let mut store = store();
    store.add_component(Component::new("hero").with_data("title", "Same"));
    store.add_section(LayoutType::MainAside);
    store.assign_component("c1", "s1", 2);

    let mut renderer = Renderer::new(registry());
    let first = renderer.render(store.snapshot()).clone();
    let second = renderer.render(store.snapshot()).clone();
    assert_eq!(first, second);
}

#[test]
fn test_controls_decode_into_intents() {
    let mut store = store();
    store.add_component(Component::new("hero"));
    store.add_section(LayoutType::ThreeColumn);
    store.assign_component("c1", "s1", 2);

    let mut renderer = Renderer::new(registry());
    let intents = collect_intents(root(renderer.render(store.snapshot())));

    assert!(intents.contains(&Intent::component(ComponentAction::Delete, "c1")));
    assert!(intents.contains(&Intent::Section {
        action: SectionAction::Retype,
        section_id: "s1".to_string(),
        next_layout: Some(LayoutType::MainAside),
        requires_confirmation: false,
    }));
    assert!(intents.contains(&Intent::Section {
        action: SectionAction::Remove,
        section_id: "s1".to_string(),
        next_layout: None,
        requires_confirmation: true,
    }));
}

#[test]
fn test_section_options_become_style_rules() {
    let mut store = store();
    let id = store.add_section(LayoutType::FullWidth);
    store.update_section_options(
        &id,
        SectionOptions {
            background_type: Some(BackgroundType::Color),
            background_color: Some("#112233".to_string()),
            spacing_top: Some("large".to_string()),
            ..SectionOptions::default()
        },
    );

    let mut renderer = Renderer::new(registry());
    let document = renderer.render(store.snapshot());

    let rule = document
        .styles
        .iter()
        .find(|r| r.media.is_none())
        .unwrap();
    assert_eq!(rule.properties["background-color"], "#112233");
    assert_eq!(rule.properties["margin-top"], "60px");

    let html = to_html(document, &HtmlOptions::default());
    assert!(html.contains("<style>"));
    assert!(html.contains("data-section-id=\"s1\""));
}

#[test]
fn test_unmounted_renderer_ignores_changes() {
    let mut store = store();
    let mut renderer = Renderer::new(registry());
    renderer.mount(&store);
    renderer.unmount();

    store.add_component(Component::new("hero"));
    assert!(!renderer.pump());
    assert!(!renderer.is_mounted());
}
