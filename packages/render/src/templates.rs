//! # Content Templates
//!
//! Presentational render functions keyed by component type. A template
//! turns a component into an output node and may hand back a stateful
//! sub-view that the renderer owns until its next rebuild.
//!
//! ```rust,ignore
//! registry.register(
//!     "hero",
//!     |component| Ok(Rendered::node(VNode::element("h1").with_text(component.text("title").unwrap_or_default()))),
//!     Some(TemplateSchema::fields(&["title", "subtitle"])),
//! );
//! ```

use crate::vdom::VNode;
use mediakit_store::Component;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid data for {kind}: {message}")]
    InvalidData { kind: String, message: String },

    #[error("Template panicked: {0}")]
    Panicked(String),
}

/// A nested stateful view created by a template
pub trait MountedView: Send {
    /// Release everything the view holds; called before every rebuild
    fn teardown(&mut self);
}

/// Output of a template
pub struct Rendered {
    pub node: VNode,
    pub view: Option<Box<dyn MountedView>>,
}

impl Rendered {
    pub fn node(node: VNode) -> Self {
        Self { node, view: None }
    }

    pub fn with_view(mut self, view: impl MountedView + 'static) -> Self {
        self.view = Some(Box::new(view));
        self
    }
}

impl std::fmt::Debug for Rendered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendered")
            .field("node", &self.node)
            .field("view", &self.view.is_some())
            .finish()
    }
}

/// One editable field of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub label: Option<String>,
}

/// Editable fields a template exposes, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSchema {
    pub fields: Vec<FieldSchema>,
    /// Repeated items (topics, questions) rather than named slots
    pub list_based: bool,
}

impl TemplateSchema {
    pub fn fields(names: &[&str]) -> Self {
        Self {
            fields: names
                .iter()
                .map(|name| FieldSchema {
                    name: (*name).to_string(),
                    label: None,
                })
                .collect(),
            list_based: false,
        }
    }

    pub fn list_based(mut self) -> Self {
        self.list_based = true;
        self
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

pub type RenderFn = Box<dyn Fn(&Component) -> Result<Rendered, TemplateError> + Send + Sync>;

struct Template {
    render: RenderFn,
    schema: Option<TemplateSchema>,
}

#[derive(Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the template for a component type
    pub fn register<F>(&mut self, kind: impl Into<String>, render: F, schema: Option<TemplateSchema>)
    where
        F: Fn(&Component) -> Result<Rendered, TemplateError> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.templates.contains_key(&kind) {
            tracing::debug!(%kind, "replacing content template");
        }
        self.templates.insert(
            kind,
            Template {
                render: Box::new(render),
                schema,
            },
        );
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.templates.contains_key(kind)
    }

    pub fn schema(&self, kind: &str) -> Option<&TemplateSchema> {
        self.templates.get(kind).and_then(|t| t.schema.as_ref())
    }

    /// Registered types with a schema
    pub fn schemas(&self) -> impl Iterator<Item = (&str, &TemplateSchema)> {
        self.templates
            .iter()
            .filter_map(|(kind, t)| t.schema.as_ref().map(|s| (kind.as_str(), s)))
    }

    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Render a component; `None` when no template is registered.
    ///
    /// A panicking template is reported as [`TemplateError::Panicked`] so one
    /// bad component cannot take down a rebuild.
    pub fn render(&self, component: &Component) -> Option<Result<Rendered, TemplateError>> {
        let template = self.templates.get(&component.kind)?;
        let result = catch_unwind(AssertUnwindSafe(|| (template.render)(component)));
        Some(result.unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(TemplateError::Panicked(message))
        }))
    }
}

impl std::fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_render() {
        let mut registry = TemplateRegistry::new();
        registry.register(
            "hero",
            |c: &Component| Ok(Rendered::node(VNode::element("h1").with_text(c.text("title").unwrap_or_default()))),
            Some(TemplateSchema::fields(&["title"])),
        );

        let component = Component::new("hero").with_data("title", "Hi");
        let rendered = registry.render(&component).unwrap().unwrap();
        assert_eq!(rendered.node.text_content(), "Hi");
        assert_eq!(registry.schema("hero").unwrap().field_names(), vec!["title"]);
        assert!(registry.render(&Component::new("other")).is_none());
    }

    #[test]
    fn test_panicking_template_is_contained() {
        let mut registry = TemplateRegistry::new();
        registry.register("boom", |_: &Component| -> Result<Rendered, TemplateError> { panic!("kaboom") }, None);

        let result = registry.render(&Component::new("boom")).unwrap();
        assert_eq!(result.unwrap_err(), TemplateError::Panicked("kaboom".to_string()));
    }
}
