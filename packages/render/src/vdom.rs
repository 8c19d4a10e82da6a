use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Virtual DOM node
///
/// Attributes and styles are ordered maps so two renders of the same
/// snapshot compare equal and serialize identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VNode {
    /// HTML element
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        styles: BTreeMap<String, String>,
        children: Vec<VNode>,
        /// Stable identity (component or section id)
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// Text node
    Text { content: String },

    /// Comment node
    Comment { content: String },
}

impl VNode {
    pub fn element(tag: impl Into<String>) -> Self {
        VNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        VNode::Text {
            content: content.into(),
        }
    }

    pub fn comment(content: impl Into<String>) -> Self {
        VNode::Comment {
            content: content.into(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Append to the `class` attribute
    pub fn with_class(mut self, class: impl AsRef<str>) -> Self {
        let class = class.as_ref();
        if class.is_empty() {
            return self;
        }
        if let VNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes
                .entry("class".to_string())
                .and_modify(|existing| {
                    existing.push(' ');
                    existing.push_str(class);
                })
                .or_insert_with(|| class.to_string());
        }
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let VNode::Element { ref mut styles, .. } = self {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: VNode) -> Self {
        self.push_child(child);
        self
    }

    pub fn with_children(mut self, new_children: Vec<VNode>) -> Self {
        if let VNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn with_text(self, content: impl Into<String>) -> Self {
        self.with_child(VNode::text(content))
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        if let VNode::Element {
            key: ref mut node_key,
            ..
        } = self
        {
            *node_key = Some(key.into());
        }
        self
    }

    pub fn push_child(&mut self, child: VNode) {
        if let VNode::Element { children, .. } = self {
            children.push(child);
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { styles, .. } => styles.get(name).map(String::as_str),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text { content } => content.clone(),
            VNode::Comment { .. } => String::new(),
            VNode::Element { children, .. } => children.iter().map(VNode::text_content).collect(),
        }
    }

    /// Depth-first, pre-order traversal
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a VNode)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn find_all(&self, predicate: impl Fn(&VNode) -> bool) -> Vec<&VNode> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if predicate(node) {
                found.push(node);
            }
        });
        found
    }

    pub fn find_first(&self, predicate: impl Fn(&VNode) -> bool) -> Option<&VNode> {
        self.find_all(predicate).into_iter().next()
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&VNode> {
        self.find_first(|node| node.attr(name) == Some(value))
    }
}

/// Virtual Document (root nodes plus generated style rules)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualDomDocument {
    pub nodes: Vec<VNode>,
    pub styles: Vec<CssRule>,
}

/// CSS Rule, optionally scoped to a media query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssRule {
    pub selector: String,
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl CssRule {
    pub fn new(selector: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            selector: selector.into(),
            properties,
            media: None,
        }
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

impl VirtualDomDocument {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            styles: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: VNode) {
        self.nodes.push(node);
    }

    pub fn add_style(&mut self, selector: impl Into<String>, properties: BTreeMap<String, String>) {
        self.styles.push(CssRule::new(selector, properties));
    }

    pub fn add_rule(&mut self, rule: CssRule) {
        self.styles.push(rule);
    }

    pub fn find_all(&self, predicate: impl Fn(&VNode) -> bool) -> Vec<&VNode> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| {
                if predicate(n) {
                    found.push(n);
                }
            });
        }
        found
    }

    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&VNode> {
        self.find_all(|node| node.attr(name) == Some(value))
            .into_iter()
            .next()
    }

    /// Rendered wrapper of a component
    pub fn component(&self, component_id: &str) -> Option<&VNode> {
        self.find_all(|node| {
            node.attr("data-component-id") == Some(component_id) && node.has_class("mk-component")
        })
        .into_iter()
        .next()
    }

    /// Rendered block of a section
    pub fn section(&self, section_id: &str) -> Option<&VNode> {
        self.find_all(|node| {
            node.attr("data-section-id") == Some(section_id) && node.has_class("mk-section")
        })
        .into_iter()
        .next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_queries() {
        let node = VNode::element("div")
            .with_class("a")
            .with_class("b")
            .with_attr("data-id", "x")
            .with_style("color", "red")
            .with_child(VNode::element("span").with_text("Hello "))
            .with_text("World");

        assert!(node.has_class("a"));
        assert!(node.has_class("b"));
        assert!(!node.has_class("c"));
        assert_eq!(node.attr("data-id"), Some("x"));
        assert_eq!(node.style("color"), Some("red"));
        assert_eq!(node.text_content(), "Hello World");
        assert_eq!(node.find_all(|n| n.tag() == Some("span")).len(), 1);
    }

    #[test]
    fn test_text_nodes_ignore_element_builders() {
        let node = VNode::text("x").with_attr("a", "b").with_child(VNode::text("y"));
        assert_eq!(node, VNode::text("x"));
    }

    #[test]
    fn test_default_document_is_empty() {
        let doc = VirtualDomDocument::default();
        assert_eq!(doc, VirtualDomDocument::new());
        assert!(doc.nodes.is_empty() && doc.styles.is_empty());
    }

    #[test]
    fn test_document_lookup() {
        let mut doc = VirtualDomDocument::new();
        doc.add_node(
            VNode::element("div").with_child(
                VNode::element("div")
                    .with_class("mk-component")
                    .with_attr("data-component-id", "c1"),
            ),
        );

        assert!(doc.component("c1").is_some());
        assert!(doc.component("c2").is_none());
        assert!(doc.find_by_attr("data-component-id", "c1").is_some());
    }
}
