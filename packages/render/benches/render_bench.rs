use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mediakit_render::{to_html, HtmlOptions, Rendered, Renderer, TemplateError, TemplateRegistry, VNode};
use mediakit_store::{Component, LayoutType, Section, Snapshot};
use std::sync::Arc;

fn registry() -> Arc<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    registry.register(
        "topics",
        |component: &Component| -> Result<Rendered, TemplateError> {
            let mut list = VNode::element("ul");
            for index in 1..=5 {
                let key = format!("topic_{}", index);
                list.push_child(
                    VNode::element("li")
                        .with_attr("data-property", key.as_str())
                        .with_text(component.text(&key).unwrap_or_default()),
                );
            }
            Ok(Rendered::node(list))
        },
        None,
    );
    Arc::new(registry)
}

fn snapshot(count: usize, with_sections: bool) -> Snapshot {
    let mut snapshot = Snapshot::default();
    for index in 1..=count {
        let id = format!("c{}", index);
        snapshot.components.insert(
            id.clone(),
            Component::new("topics")
                .with_id(id.as_str())
                .with_data("topic_1", "Leadership")
                .with_data("topic_2", "Growth"),
        );
        snapshot.layout_order.push(id);
    }

    if with_sections {
        let layouts = [LayoutType::TwoColumn, LayoutType::ThreeColumn, LayoutType::Grid];
        for (n, chunk) in snapshot.layout_order.chunks(10).enumerate() {
            let layout = layouts[n % layouts.len()].clone();
            let mut section = Section::new(format!("s{}", n + 1), layout);
            for (i, id) in chunk.iter().enumerate() {
                section = section.with_assignment(id.as_str(), (i % 3) as i32 + 1);
            }
            snapshot.sections.push(section);
        }
    }

    snapshot
}

fn render_flat(c: &mut Criterion) {
    let snapshot = snapshot(50, false);
    let mut renderer = Renderer::new(registry());

    c.bench_function("render_50_components_flat", |b| {
        b.iter(|| {
            renderer.render(black_box(&snapshot));
        })
    });
}

fn render_sections(c: &mut Criterion) {
    let snapshot = snapshot(50, true);
    let mut renderer = Renderer::new(registry());

    c.bench_function("render_50_components_in_sections", |b| {
        b.iter(|| {
            renderer.render(black_box(&snapshot));
        })
    });
}

fn serialize_html(c: &mut Criterion) {
    let snapshot = snapshot(50, true);
    let mut renderer = Renderer::new(registry());
    let document = renderer.render(&snapshot).clone();
    let options = HtmlOptions::default();

    c.bench_function("serialize_50_components_html", |b| {
        b.iter(|| to_html(black_box(&document), &options))
    });
}

criterion_group!(benches, render_flat, render_sections, serialize_html);
criterion_main!(benches);
