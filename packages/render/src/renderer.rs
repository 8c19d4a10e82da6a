//! # Renderer
//!
//! Projects a snapshot into a [`VirtualDomDocument`] by full rebuild; there
//! is no diffing. Every rebuild:
//!
//! 1. Tears down the stateful sub-views created by the previous rebuild
//! 2. Renders the empty state when there are no components and no sections
//! 3. Otherwise composes sections in order, or components in layout order
//!    when the document has no sections
//!
//! Each component is wrapped with a control surface. Template failures and
//! missing templates produce a fallback block for that component only.

use crate::controls::component_controls;
use crate::layout::compose_section;
use crate::templates::{MountedView, TemplateRegistry};
use crate::vdom::{VNode, VirtualDomDocument};
use mediakit_store::{Component, Snapshot, StateChanged, Store};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, instrument, warn};

pub const ROOT_ID: &str = "media-kit-preview";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rebuilds: u64,
    pub components_rendered: u64,
    pub fallbacks: u64,
    pub teardowns: u64,
}

pub struct Renderer {
    templates: Arc<TemplateRegistry>,
    output: VirtualDomDocument,
    views: Vec<(String, Box<dyn MountedView>)>,
    subscription: Option<broadcast::Receiver<StateChanged>>,
    stats: RenderStats,
}

impl Renderer {
    pub fn new(templates: Arc<TemplateRegistry>) -> Self {
        Self {
            templates,
            output: VirtualDomDocument::new(),
            views: Vec::new(),
            subscription: None,
            stats: RenderStats::default(),
        }
    }

    /// Subscribe to the store and render its current state once
    pub fn mount(&mut self, store: &Store) -> &VirtualDomDocument {
        self.subscription = Some(store.subscribe());
        let snapshot = store.state();
        self.render(&snapshot)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Drain pending state changes and rebuild once from the latest one.
    /// Returns true when a rebuild happened.
    pub fn pump(&mut self) -> bool {
        let Some(rx) = self.subscription.as_mut() else {
            return false;
        };

        let mut latest: Option<Arc<Snapshot>> = None;
        loop {
            match rx.try_recv() {
                Ok(event) => latest = Some(event.snapshot),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "renderer fell behind state changes");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        match latest {
            Some(snapshot) => {
                self.render(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Rebuild the output from `snapshot`
    #[instrument(skip_all, fields(components = snapshot.components.len(), sections = snapshot.sections.len()))]
    pub fn render(&mut self, snapshot: &Snapshot) -> &VirtualDomDocument {
        self.teardown_views();
        self.stats.rebuilds += 1;

        let theme = snapshot.theme();
        let mut root = VNode::element("div")
            .with_attr("id", ROOT_ID)
            .with_class("preview-area")
            .with_class(format!("theme-{}", theme))
            .with_attr("data-theme", theme);
        let mut document = VirtualDomDocument::new();

        if snapshot.is_empty() {
            root.push_child(empty_state());
        } else if !snapshot.sections.is_empty() {
            for section in &snapshot.sections {
                let block = compose_section(section, snapshot, &mut |component: &Component| {
                    self.render_component(component)
                });
                root.push_child(block.node);
                for rule in block.styles {
                    document.add_rule(rule);
                }
            }
        } else {
            for component in snapshot.ordered_components() {
                let node = self.render_component(component);
                root.push_child(node);
            }
        }

        document.add_node(root);
        self.output = document;
        debug!(views = self.views.len(), "rebuild complete");
        &self.output
    }

    pub fn output(&self) -> &VirtualDomDocument {
        &self.output
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Sub-views currently owned by the renderer
    pub fn mounted_views(&self) -> usize {
        self.views.len()
    }

    /// Tear down views and stop listening to the store
    pub fn unmount(&mut self) {
        self.teardown_views();
        self.subscription = None;
        self.output = VirtualDomDocument::new();
    }

    fn teardown_views(&mut self) {
        for (component_id, mut view) in self.views.drain(..) {
            debug!(%component_id, "tearing down sub-view");
            view.teardown();
            self.stats.teardowns += 1;
        }
    }

    fn render_component(&mut self, component: &Component) -> VNode {
        self.stats.components_rendered += 1;

        let content = match self.templates.render(component) {
            None => {
                warn!(component_id = %component.id, kind = %component.kind, "no template registered");
                return self.fallback(component);
            }
            Some(Err(e)) => {
                warn!(component_id = %component.id, kind = %component.kind, error = %e, "template failed");
                return self.fallback(component);
            }
            Some(Ok(rendered)) => {
                if let Some(view) = rendered.view {
                    self.views.push((component.id.clone(), view));
                }
                rendered.node
            }
        };

        component_wrapper(component)
            .with_child(
                VNode::element("div")
                    .with_class("mk-component__content")
                    .with_child(content),
            )
            .with_child(component_controls(&component.id))
    }

    fn fallback(&mut self, component: &Component) -> VNode {
        self.stats.fallbacks += 1;
        component_wrapper(component)
            .with_class("mk-component--fallback")
            .with_child(
                VNode::element("div")
                    .with_class("component-fallback")
                    .with_child(VNode::element("h4").with_text(component.kind.as_str()))
                    .with_child(
                        VNode::element("p").with_text(format!("Component ID: {}", component.id)),
                    ),
            )
            .with_child(component_controls(&component.id))
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.teardown_views();
    }
}

fn component_wrapper(component: &Component) -> VNode {
    VNode::element("div")
        .with_key(component.id.as_str())
        .with_class("mk-component")
        .with_class(format!("mk-component--{}", component.kind))
        .with_attr("data-component-id", component.id.as_str())
        .with_attr("data-component-type", component.kind.as_str())
}

fn empty_state() -> VNode {
    VNode::element("div")
        .with_class("mk-empty-state")
        .with_attr("id", "empty-state")
        .with_child(VNode::element("h3").with_text("No components yet"))
        .with_child(VNode::element("p").with_text("Click \"Add Component\" to get started"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::{Rendered, TemplateError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingView(Arc<AtomicUsize>);

    impl MountedView for CountingView {
        fn teardown(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_views_are_torn_down_before_each_rebuild() {
        let torn_down = Arc::new(AtomicUsize::new(0));
        let counter = torn_down.clone();

        let mut registry = TemplateRegistry::new();
        registry.register(
            "video",
            move |_: &Component| -> Result<Rendered, TemplateError> {
                Ok(Rendered::node(VNode::element("video")).with_view(CountingView(counter.clone())))
            },
            None,
        );

        let mut snapshot = Snapshot::default();
        snapshot
            .components
            .insert("c1".into(), Component::new("video").with_id("c1"));
        snapshot.layout_order.push("c1".into());

        let mut renderer = Renderer::new(Arc::new(registry));
        renderer.render(&snapshot);
        assert_eq!(renderer.mounted_views(), 1);
        assert_eq!(torn_down.load(Ordering::SeqCst), 0);

        renderer.render(&snapshot);
        assert_eq!(torn_down.load(Ordering::SeqCst), 1);

        // Empty state also releases views
        renderer.render(&Snapshot::default());
        assert_eq!(torn_down.load(Ordering::SeqCst), 2);
        assert_eq!(renderer.mounted_views(), 0);
        assert_eq!(renderer.stats().teardowns, 2);
    }
}
