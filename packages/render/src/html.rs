//! HTML serialization of a rendered document

use crate::vdom::{CssRule, VNode, VirtualDomDocument};

/// Options for HTML output
#[derive(Debug, Clone)]
pub struct HtmlOptions {
    /// Pretty print HTML
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
    /// Wrap in `<!DOCTYPE html>` with a head carrying the style rules
    pub full_document: bool,
    pub title: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "  ".to_string(),
            full_document: false,
            title: "Media Kit".to_string(),
        }
    }
}

struct Context<'a> {
    options: &'a HtmlOptions,
    depth: usize,
    buffer: String,
}

impl<'a> Context<'a> {
    fn new(options: &'a HtmlOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        self.newline();
    }

    fn newline(&mut self) {
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }
}

/// Serialize a rendered document to HTML
pub fn to_html(document: &VirtualDomDocument, options: &HtmlOptions) -> String {
    let mut ctx = Context::new(options);

    if options.full_document {
        ctx.add_line("<!DOCTYPE html>");
        ctx.add_line("<html>");
        ctx.indent();
        ctx.add_line("<head>");
        ctx.indent();
        ctx.add_line("<meta charset=\"utf-8\" />");
        ctx.add_line(&format!("<title>{}</title>", escape_html(&options.title)));
        compile_styles(&document.styles, &mut ctx);
        ctx.dedent();
        ctx.add_line("</head>");
        ctx.add_line("<body>");
        ctx.indent();
    } else {
        compile_styles(&document.styles, &mut ctx);
    }

    for node in &document.nodes {
        compile_node(node, &mut ctx);
    }

    if options.full_document {
        ctx.dedent();
        ctx.add_line("</body>");
        ctx.dedent();
        ctx.add_line("</html>");
    }

    ctx.buffer
}

/// Serialize a single node
pub fn node_to_html(node: &VNode, options: &HtmlOptions) -> String {
    let mut ctx = Context::new(options);
    compile_node(node, &mut ctx);
    ctx.buffer
}

pub fn to_css(rules: &[CssRule]) -> String {
    let mut css = String::new();
    for rule in rules {
        let body: String = rule
            .properties
            .iter()
            .map(|(key, value)| format!("{}: {};", key, value))
            .collect::<Vec<_>>()
            .join(" ");
        match &rule.media {
            Some(media) => css.push_str(&format!("@media {} {{ {} {{ {} }} }}\n", media, rule.selector, body)),
            None => css.push_str(&format!("{} {{ {} }}\n", rule.selector, body)),
        }
    }
    css
}

fn compile_styles(rules: &[CssRule], ctx: &mut Context) {
    if rules.is_empty() {
        return;
    }
    ctx.add_line("<style>");
    ctx.indent();
    for line in to_css(rules).lines() {
        ctx.add_line(line);
    }
    ctx.dedent();
    ctx.add_line("</style>");
}

fn compile_node(node: &VNode, ctx: &mut Context) {
    match node {
        VNode::Text { content } => {
            if ctx.options.pretty {
                ctx.add_indent();
            }
            ctx.add(&escape_html(content));
            ctx.newline();
        }
        VNode::Comment { content } => {
            ctx.add_line(&format!("<!-- {} -->", content.replace("--", "- -")));
        }
        VNode::Element {
            tag,
            attributes,
            styles,
            children,
            ..
        } => {
            if ctx.options.pretty {
                ctx.add_indent();
            }
            ctx.add(&format!("<{}", tag));
            for (name, value) in attributes {
                ctx.add(&format!(" {}=\"{}\"", name, escape_html(value)));
            }
            if !styles.is_empty() {
                let inline: Vec<String> = styles
                    .iter()
                    .map(|(key, value)| format!("{}: {};", key, value))
                    .collect();
                ctx.add(&format!(" style=\"{}\"", escape_html(&inline.join(" "))));
            }

            if children.is_empty() && is_self_closing(tag) {
                ctx.add(" />");
                ctx.newline();
                return;
            }

            ctx.add(">");

            // Text-only children stay on the tag's line
            if children.iter().all(|c| matches!(c, VNode::Text { .. })) {
                for child in children {
                    if let VNode::Text { content } = child {
                        ctx.add(&escape_html(content));
                    }
                }
                ctx.add(&format!("</{}>", tag));
                ctx.newline();
                return;
            }

            ctx.newline();
            ctx.indent();
            for child in children {
                compile_node(child, ctx);
            }
            ctx.dedent();
            if ctx.options.pretty {
                ctx.add_indent();
            }
            ctx.add(&format!("</{}>", tag));
            ctx.newline();
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_self_closing(tag: &str) -> bool {
    matches!(
        tag,
        "img" | "input" | "br" | "hr" | "meta" | "link" | "source" | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_text_and_attributes() {
        let node = VNode::element("p")
            .with_attr("title", "a \"quote\"")
            .with_text("<b>&</b>");
        let html = node_to_html(&node, &HtmlOptions { pretty: false, ..HtmlOptions::default() });
        assert_eq!(
            html,
            "<p title=\"a &quot;quote&quot;\">&lt;b&gt;&amp;&lt;/b&gt;</p>"
        );
    }

    #[test]
    fn test_pretty_nesting() {
        let node = VNode::element("div")
            .with_child(VNode::element("span").with_text("x"))
            .with_child(VNode::element("img").with_attr("src", "a.png"));
        let html = node_to_html(&node, &HtmlOptions::default());
        assert_eq!(html, "<div>\n  <span>x</span>\n  <img src=\"a.png\" />\n</div>\n");
    }

    #[test]
    fn test_full_document_has_styles_in_head() {
        let mut doc = VirtualDomDocument::new();
        doc.add_rule(
            CssRule::new(".a", [("color".to_string(), "red".to_string())].into_iter().collect())
                .with_media("(max-width: 768px)"),
        );
        doc.add_node(VNode::element("main"));

        let html = to_html(&doc, &HtmlOptions { full_document: true, ..HtmlOptions::default() });
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("@media (max-width: 768px) { .a { color: red; } }"));
        assert!(html.contains("<main></main>"));
    }
}
