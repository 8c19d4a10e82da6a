//! Stock content templates
//!
//! Every editable node carries `data-property` so the preview projection can
//! bind it without positional guessing.

use mediakit_render::{Rendered, TemplateError, TemplateRegistry, TemplateSchema, VNode};
use mediakit_store::Component;
use mediakit_sync::PropertyTable;

/// Named-slot types: (type, css block, [(field, tag)])
const FIELD_TEMPLATES: &[(&str, &str, &[(&str, &str)])] = &[
    ("hero", "gmkb-hero", &[("title", "h1"), ("subtitle", "h2"), ("description", "p")]),
    ("biography", "gmkb-biography", &[("title", "h3"), ("content", "div")]),
    (
        "contact",
        "gmkb-contact",
        &[("email", "a"), ("phone", "span"), ("website", "a"), ("address", "address")],
    ),
    ("guest-intro", "gmkb-guest-intro", &[("name", "h2"), ("title", "h3"), ("introduction", "p")]),
    ("authority-hook", "gmkb-authority-hook", &[("headline", "h2"), ("subheadline", "h3")]),
    ("call-to-action", "gmkb-cta", &[("title", "h3"), ("buttonText", "button")]),
];

/// List types: (type, css block, [(field, tag)], empty message)
const LIST_TEMPLATES: &[(&str, &str, &[(&str, &str)], &str)] = &[
    ("topics", "gmkb-topics", &[("title", "h4"), ("description", "p")], "No topics yet"),
    ("questions", "gmkb-questions", &[("question", "p")], "No questions yet"),
    ("stats", "gmkb-stats", &[("value", "strong"), ("label", "span")], "No stats yet"),
];

pub fn builtin_templates() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();

    for (kind, block, fields) in FIELD_TEMPLATES {
        let block = *block;
        let fields: &'static [(&'static str, &'static str)] = fields;
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        registry.register(
            *kind,
            move |component: &Component| render_fields(component, block, fields),
            Some(TemplateSchema::fields(&names)),
        );
    }

    for (kind, block, fields, empty) in LIST_TEMPLATES {
        let block = *block;
        let empty = *empty;
        let fields: &'static [(&'static str, &'static str)] = fields;
        let names: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        registry.register(
            *kind,
            move |component: &Component| render_list(component, block, fields, empty),
            Some(TemplateSchema::fields(&names).list_based()),
        );
    }

    registry
}

/// Stock property mappings, overridden by whatever the registry's schemas
/// declare
pub fn property_table(registry: &TemplateRegistry) -> PropertyTable {
    let mut table = PropertyTable::builtin();
    for (kind, schema) in registry.schemas() {
        table.insert_fields(kind, schema.field_names(), schema.list_based);
    }
    table
}

fn render_fields(
    component: &Component,
    block: &str,
    fields: &[(&str, &str)],
) -> Result<Rendered, TemplateError> {
    let children = fields
        .iter()
        .map(|(field, tag)| {
            VNode::element(*tag)
                .with_class(format!("{}__{}", block, field))
                .with_attr("data-property", *field)
                .with_text(component.text(field).unwrap_or_default())
        })
        .collect();

    Ok(Rendered::node(
        VNode::element("div").with_class(block).with_children(children),
    ))
}

fn render_list(
    component: &Component,
    block: &str,
    fields: &[(&str, &str)],
    empty: &str,
) -> Result<Rendered, TemplateError> {
    let items = item_count(component, fields);
    let mut root = VNode::element("div").with_class(block);

    if items == 0 {
        root.push_child(
            VNode::element("p")
                .with_class(format!("{}__empty", block))
                .with_text(empty),
        );
        return Ok(Rendered::node(root));
    }

    let mut list = VNode::element("ul").with_class(format!("{}__list", block));
    for n in 1..=items {
        let mut item = VNode::element("li")
            .with_class(format!("{}__item", block))
            .with_attr("data-index", n.to_string());
        for (field, tag) in fields {
            let property = format!("{}_{}", field, n);
            item.push_child(
                VNode::element(*tag)
                    .with_class(format!("{}__{}", block, field))
                    .with_attr("data-property", property.as_str())
                    .with_text(component.text(&property).unwrap_or_default()),
            );
        }
        list.push_child(item);
    }
    root.push_child(list);
    Ok(Rendered::node(root))
}

fn item_count(component: &Component, fields: &[(&str, &str)]) -> usize {
    (1..)
        .take_while(|n| {
            fields
                .iter()
                .any(|(field, _)| component.data.contains_key(&format!("{}_{}", field, n)))
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_stock_type_has_a_template() {
        let registry = builtin_templates();
        let table = property_table(&registry);
        for kind in registry.kinds() {
            assert!(table.get(kind).is_some(), "{kind} has no property mapping");
        }
        assert!(registry.contains("hero"));
        assert!(registry.schema("topics").unwrap().list_based);
    }

    #[test]
    fn test_hero_marks_properties() {
        let registry = builtin_templates();
        let hero = Component::new("hero").with_id("c1").with_data("title", "Hi");
        let rendered = registry.render(&hero).unwrap().unwrap();

        let title = rendered.node.find_by_attr("data-property", "title").unwrap();
        assert_eq!(title.tag(), Some("h1"));
        assert_eq!(title.text_content(), "Hi");
    }

    #[test]
    fn test_topics_render_items_from_data() {
        let registry = builtin_templates();
        let topics = Component::new("topics")
            .with_id("c1")
            .with_data("title_1", "Growth")
            .with_data("title_2", "Focus")
            .with_data("description_2", "Deep work");
        let rendered = registry.render(&topics).unwrap().unwrap();

        let items = rendered.node.find_all(|n| n.tag() == Some("li"));
        assert_eq!(items.len(), 2);
        assert_eq!(
            rendered
                .node
                .find_by_attr("data-property", "description_2")
                .unwrap()
                .text_content(),
            "Deep work"
        );
    }

    #[test]
    fn test_empty_list() {
        let registry = builtin_templates();
        let rendered = registry
            .render(&Component::new("questions").with_id("c1"))
            .unwrap()
            .unwrap();
        assert_eq!(rendered.node.text_content(), "No questions yet");
    }
}
