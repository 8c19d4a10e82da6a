//! Projection of rendered output and editor panels onto the surface host

use mediakit_render::{VNode, VirtualDomDocument};
use mediakit_store::Component;
use mediakit_sync::{ElementHandle, ElementSpec, MemorySurface, Surface};
use tracing::debug;

/// Replace the preview surface with the editable nodes of `document`.
///
/// Inside each component's content, a node with `data-property` becomes an
/// element bound by identifier; one with only `data-index` is bound by
/// index. Returns the ids of components that produced elements.
pub fn project_preview(document: &VirtualDomDocument, surface: &mut MemorySurface) -> Vec<String> {
    surface.clear(Surface::Preview, None);

    let wrappers = document.find_all(|node| {
        node.has_class("mk-component") && node.attr("data-component-id").is_some()
    });

    let mut mounted = Vec::new();
    for wrapper in wrappers {
        let Some(component_id) = wrapper.attr("data-component-id") else {
            continue;
        };
        let Some(content) = wrapper.find_first(|n| n.has_class("mk-component__content")) else {
            continue;
        };

        let mut count = 0;
        content.walk(&mut |node: &VNode| {
            if let Some(spec) = element_spec(node) {
                surface.insert(Surface::Preview, component_id, spec);
                count += 1;
            }
        });

        if count > 0 {
            mounted.push(component_id.to_string());
        }
    }

    debug!(components = mounted.len(), "projected preview");
    mounted
}

fn element_spec(node: &VNode) -> Option<ElementSpec> {
    let spec = match (node.attr("data-property"), node.attr("data-index")) {
        (Some(property), _) => ElementSpec::property(property),
        // Item containers carry an index as well as their children's
        // properties; only leaf text nodes are editable
        (None, Some(index)) if is_leaf(node) => ElementSpec::index(index.parse().ok()?),
        _ => return None,
    };
    Some(spec.with_value(node.text_content()))
}

fn is_leaf(node: &VNode) -> bool {
    node.children().iter().all(|c| matches!(c, VNode::Text { .. }))
}

/// Open the editor panel for `component`: one input per tracked property,
/// filled from the component's data. Any previously open panel is closed.
pub fn open_editor_panel(
    surface: &mut MemorySurface,
    component: &Component,
    properties: &[String],
) -> Vec<ElementHandle> {
    surface.clear(Surface::Editor, None);
    properties
        .iter()
        .map(|property| {
            let value = component.text(property).unwrap_or_default();
            surface.insert(
                Surface::Editor,
                &component.id,
                ElementSpec::property(property.as_str()).with_value(value),
            )
        })
        .collect()
}

pub fn close_editor_panel(surface: &mut MemorySurface) -> usize {
    surface.clear(Surface::Editor, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::builtin_templates;
    use mediakit_render::Renderer;
    use mediakit_store::Snapshot;
    use mediakit_sync::SurfaceHost;
    use std::sync::Arc;

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::default();
        snapshot.components.insert(
            "c1".into(),
            Component::new("hero").with_id("c1").with_data("title", "Hello"),
        );
        snapshot
            .components
            .insert("c2".into(), Component::new("unknown").with_id("c2"));
        snapshot.layout_order = vec!["c1".into(), "c2".into()];
        snapshot
    }

    #[test]
    fn test_preview_projection_binds_properties() {
        let mut renderer = Renderer::new(Arc::new(builtin_templates()));
        let document = renderer.render(&snapshot()).clone();
        let mut surface = MemorySurface::new();

        let mounted = project_preview(&document, &mut surface);

        // Fallback blocks have nothing editable
        assert_eq!(mounted, vec!["c1"]);
        let elements = surface.elements(Surface::Preview, "c1");
        assert_eq!(elements.len(), 3);
        let title = surface.find(Surface::Preview, "c1", "title").unwrap();
        assert_eq!(surface.value(title), Some("Hello"));
    }

    #[test]
    fn test_reprojection_replaces_preview_only() {
        let mut renderer = Renderer::new(Arc::new(builtin_templates()));
        let document = renderer.render(&snapshot()).clone();
        let mut surface = MemorySurface::new();
        let component = Component::new("hero").with_id("c1");
        open_editor_panel(&mut surface, &component, &["title".to_string()]);

        project_preview(&document, &mut surface);
        project_preview(&document, &mut surface);

        assert_eq!(surface.elements(Surface::Preview, "c1").len(), 3);
        assert_eq!(surface.elements(Surface::Editor, "c1").len(), 1);
    }

    #[test]
    fn test_editor_panel_is_exclusive() {
        let mut surface = MemorySurface::new();
        let first = Component::new("hero").with_id("c1").with_data("title", "A");
        let second = Component::new("hero").with_id("c2");

        let handles = open_editor_panel(&mut surface, &first, &["title".into(), "subtitle".into()]);
        assert_eq!(handles.len(), 2);
        assert_eq!(surface.value(handles[0]), Some("A"));

        open_editor_panel(&mut surface, &second, &["title".into()]);
        assert!(surface.elements(Surface::Editor, "c1").is_empty());
        assert_eq!(surface.elements(Surface::Editor, "c2").len(), 1);
    }
}
