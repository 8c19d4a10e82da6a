use super::partition::{ColumnCount, Partition};
use super::style::section_rules;
use crate::controls::section_controls;
use crate::vdom::{CssRule, VNode};
use mediakit_store::{Component, Section, Snapshot};
use tracing::{debug, warn};

/// Output of composing one section
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBlock {
    pub node: VNode,
    pub styles: Vec<CssRule>,
    /// Components actually rendered (missing ones are skipped)
    pub rendered: usize,
}

/// Build the layout block for a section.
///
/// `render_component` produces the wrapped output of one component; the
/// composer only arranges what it returns. Assigned ids with no matching
/// component are skipped with a warning. Unknown layout types compose
/// exactly like full-width sections.
pub fn compose_section(
    section: &Section,
    snapshot: &Snapshot,
    render_component: &mut dyn FnMut(&Component) -> VNode,
) -> SectionBlock {
    let partition = Partition::for_layout(&section.layout_type);
    let layout = partition.layout.layout_type();

    if !section.layout_type.is_known() {
        debug!(
            section_id = %section.id,
            layout = %section.layout_type,
            "unknown layout type; composing as full-width"
        );
    }

    let mut rendered = 0;
    let mut inner = VNode::element("div").with_class("mk-section__inner");

    for group in partition.group(&section.column_assignment) {
        let children: Vec<VNode> = group
            .component_ids
            .iter()
            .filter_map(|id| match snapshot.component(id) {
                Some(component) => Some(render_component(component)),
                None => {
                    warn!(
                        section_id = %section.id,
                        component_id = %id,
                        "section references missing component; skipping"
                    );
                    None
                }
            })
            .collect();
        rendered += children.len();

        let mut column = column_container(section, &partition, group.column);
        if children.is_empty() {
            column.push_child(drop_placeholder(section, &partition, group.column));
        } else {
            column = column.with_children(children);
        }
        inner.push_child(column);
    }

    let node = VNode::element("section")
        .with_key(section.id.as_str())
        .with_class("mk-section")
        .with_class(format!("mk-section--{}", layout.as_str()))
        .with_attr("id", format!("section-{}", section.id))
        .with_attr("data-section-id", section.id.as_str())
        .with_attr("data-section-type", layout.as_str())
        .with_child(inner)
        .with_child(section_controls(&section.id, &layout, rendered > 0));

    SectionBlock {
        node,
        styles: section_rules(&section.id, partition.layout, &section.options),
        rendered,
    }
}

fn column_container(section: &Section, partition: &Partition, column: i32) -> VNode {
    let mut node = VNode::element("div")
        .with_class("mk-section__column")
        .with_class(format!("mk-section__column--{}", partition.column_modifier(column)))
        .with_attr("data-section-id", section.id.as_str())
        .with_attr("data-column", column.to_string())
        .with_attr("data-column-label", partition.column_label(column));
    if partition.columns == ColumnCount::AutoFlow {
        node = node.with_class("mk-section__grid");
    }
    node
}

/// Empty drop target tagged with its section and column
fn drop_placeholder(section: &Section, partition: &Partition, column: i32) -> VNode {
    let prompt = match partition.columns {
        ColumnCount::Fixed(n) if n > 1 => format!("Drop to {}", partition.column_label(column)),
        _ => "Drop components here or click to add".to_string(),
    };

    VNode::element("div")
        .with_class("mk-section__empty")
        .with_attr("data-drop-zone", "true")
        .with_attr("data-section-id", section.id.as_str())
        .with_attr("data-column", column.to_string())
        .with_child(
            VNode::element("div")
                .with_class("mk-section__empty-text")
                .with_text(prompt),
        )
}
