//! Control surfaces attached to rendered components and sections.
//!
//! Controls are plain output nodes carrying `data-action` attributes. The
//! renderer never acts on them; the bootstrap layer decodes them with
//! [`Intent::from_control`] and turns them into store calls.

use crate::vdom::VNode;
use mediakit_store::LayoutType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentAction {
    MoveUp,
    MoveDown,
    Edit,
    Duplicate,
    Delete,
}

impl ComponentAction {
    pub const ALL: [ComponentAction; 5] = [
        ComponentAction::MoveUp,
        ComponentAction::MoveDown,
        ComponentAction::Edit,
        ComponentAction::Duplicate,
        ComponentAction::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentAction::MoveUp => "move-up",
            ComponentAction::MoveDown => "move-down",
            ComponentAction::Edit => "edit",
            ComponentAction::Duplicate => "duplicate",
            ComponentAction::Delete => "delete",
        }
    }

    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == action)
    }

    fn title(self) -> &'static str {
        match self {
            ComponentAction::MoveUp => "Move Up",
            ComponentAction::MoveDown => "Move Down",
            ComponentAction::Edit => "Edit",
            ComponentAction::Duplicate => "Duplicate",
            ComponentAction::Delete => "Delete",
        }
    }

    fn glyph(self) -> &'static str {
        match self {
            ComponentAction::MoveUp => "↑",
            ComponentAction::MoveDown => "↓",
            ComponentAction::Edit => "✎",
            ComponentAction::Duplicate => "⧉",
            ComponentAction::Delete => "✕",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionAction {
    Retype,
    InsertAfter,
    Remove,
}

impl SectionAction {
    pub const ALL: [SectionAction; 3] = [
        SectionAction::Retype,
        SectionAction::InsertAfter,
        SectionAction::Remove,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionAction::Retype => "retype-section",
            SectionAction::InsertAfter => "insert-section-after",
            SectionAction::Remove => "remove-section",
        }
    }

    pub fn parse(action: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == action)
    }
}

/// A user request emitted by a control surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Component {
        action: ComponentAction,
        component_id: String,
    },
    Section {
        action: SectionAction,
        section_id: String,
        /// Target layout for a retype
        next_layout: Option<LayoutType>,
        /// Removal of a non-empty section must be confirmed first
        requires_confirmation: bool,
    },
}

impl Intent {
    pub fn component(action: ComponentAction, component_id: impl Into<String>) -> Self {
        Intent::Component {
            action,
            component_id: component_id.into(),
        }
    }

    /// Decode a control node; `None` for anything that is not a control
    pub fn from_control(node: &VNode) -> Option<Intent> {
        let action = node.attr("data-action")?;

        if let Some(action) = ComponentAction::parse(action) {
            let component_id = node.attr("data-component-id")?;
            return Some(Intent::component(action, component_id));
        }

        let action = SectionAction::parse(action)?;
        let section_id = node.attr("data-section-id")?.to_string();
        Some(Intent::Section {
            action,
            section_id,
            next_layout: node.attr("data-layout-next").map(LayoutType::parse),
            requires_confirmation: node.attr("data-confirm") == Some("true"),
        })
    }
}

/// Move up, move down, edit, duplicate, delete
pub fn component_controls(component_id: &str) -> VNode {
    let buttons = ComponentAction::ALL
        .into_iter()
        .map(|action| {
            VNode::element("button")
                .with_class("control-btn")
                .with_class(action.as_str())
                .with_attr("type", "button")
                .with_attr("data-action", action.as_str())
                .with_attr("data-component-id", component_id)
                .with_attr("title", action.title())
                .with_text(action.glyph())
        })
        .collect();

    VNode::element("div")
        .with_class("component-controls")
        .with_children(buttons)
}

/// Retype, insert-after, remove
pub fn section_controls(section_id: &str, layout: &LayoutType, non_empty: bool) -> VNode {
    let next = layout.next();

    let retype = VNode::element("button")
        .with_class("control-btn")
        .with_class("retype")
        .with_attr("type", "button")
        .with_attr("data-action", SectionAction::Retype.as_str())
        .with_attr("data-section-id", section_id)
        .with_attr("data-layout-next", next.as_str())
        .with_attr("title", format!("Switch to {}", next))
        .with_text("⇆");

    let insert = VNode::element("button")
        .with_class("control-btn")
        .with_class("insert-after")
        .with_attr("type", "button")
        .with_attr("data-action", SectionAction::InsertAfter.as_str())
        .with_attr("data-section-id", section_id)
        .with_attr("title", "Add Section Below")
        .with_text("+");

    let mut remove = VNode::element("button")
        .with_class("control-btn")
        .with_class("delete")
        .with_attr("type", "button")
        .with_attr("data-action", SectionAction::Remove.as_str())
        .with_attr("data-section-id", section_id)
        .with_attr("title", "Remove Section")
        .with_text("✕");
    if non_empty {
        remove = remove.with_attr("data-confirm", "true");
    }

    VNode::element("div")
        .with_class("section-controls")
        .with_child(retype)
        .with_child(insert)
        .with_child(remove)
}

/// Every control in a tree, decoded
pub fn collect_intents(root: &VNode) -> Vec<Intent> {
    root.find_all(|node| node.attr("data-action").is_some())
        .into_iter()
        .filter_map(Intent::from_control)
        .collect()
}
