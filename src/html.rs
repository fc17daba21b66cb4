//! HTML processing: a DOM-walking HTML to Markdown renderer and widget
//! content extraction.
//!
//! The renderer covers the structures the community's page editor produces:
//! headings, paragraphs, inline formatting, links, images, nested lists,
//! blockquotes, code blocks and simple tables. `script`/`style`/`head`
//! subtrees are dropped, whitespace runs are collapsed, and blank lines are
//! folded outside code fences.

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{Attribute, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// CSS class Igloo's page renderer wraps widget content blocks in.
const WIDGET_CONTENT_CLASS: &str = "ig-cpt";

/// Convert an HTML document (or fragment) to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let dom = parse_html(html);
    let mut out = String::new();
    render_blocks(&dom.document, &mut out);
    tidy(&out)
}

/// Extract rendered widget blocks (`div.ig-cpt`) from a page's HTML.
///
/// Returns the matched subtrees serialized back to HTML and joined with
/// newlines, or `None` when the page carries no widget content.
pub fn extract_widget_content(html: &str) -> Option<String> {
    let dom = parse_html(html);
    let mut fragments = Vec::new();
    collect_widget_divs(&dom.document, &mut fragments);
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.join("\n"))
    }
}

fn parse_html(html: &str) -> RcDom {
    let mut input = html.as_bytes();
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut input)
        .unwrap_or_default()
}

fn tag_name(name: &QualName) -> &str {
    &name.local
}

fn collect_widget_divs(node: &Handle, fragments: &mut Vec<String>) {
    if let NodeData::Element { name, attrs, .. } = &node.data {
        if tag_name(name) == "div" && has_class(&attrs.borrow(), WIDGET_CONTENT_CLASS) {
            if let Some(html) = serialize_subtree(node) {
                fragments.push(html);
            }
            // A matched widget is emitted whole; widgets nested inside it are
            // already part of the serialized subtree.
            return;
        }
    }
    for child in node.children.borrow().iter() {
        collect_widget_divs(child, fragments);
    }
}

fn serialize_subtree(node: &Handle) -> Option<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableHandle::from(node.clone()), opts).ok()?;
    String::from_utf8(bytes).ok()
}

fn has_class(attrs: &[Attribute], class: &str) -> bool {
    attr_value(attrs, "class")
        .map(|value| value.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

fn attr_value<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| tag_name(&attr.name) == name)
        .map(|attr| &*attr.value)
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "div"
            | "dl"
            | "dd"
            | "dt"
            | "fieldset"
            | "figure"
            | "figcaption"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "head"
            | "header"
            | "hr"
            | "html"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "script"
            | "section"
            | "style"
            | "table"
            | "template"
            | "ul"
    )
}

/// Walk a container node, accumulating loose inline content into paragraphs
/// and dispatching block-level elements.
fn render_blocks(node: &Handle, out: &mut String) {
    let mut paragraph = String::new();
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => {
                paragraph.push_str(&collapse_ws(&contents.borrow()));
            }
            NodeData::Element { name, .. } => {
                let tag = tag_name(name);
                if is_block(tag) {
                    flush_paragraph(&mut paragraph, out);
                    render_block_element(tag, child, out);
                } else {
                    paragraph.push_str(&inline_text(child));
                }
            }
            _ => {}
        }
    }
    flush_paragraph(&mut paragraph, out);
}

fn render_block_element(tag: &str, node: &Handle, out: &mut String) {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = (tag.as_bytes()[1] - b'0') as usize;
            let text = inline_children(node);
            let text = text.trim();
            if !text.is_empty() {
                push_block(out, &format!("{} {}", "#".repeat(level), text));
            }
        }
        "p" => {
            let text = inline_children(node);
            push_block(out, text.trim());
        }
        "ul" | "ol" => {
            let mut list = String::new();
            render_list(node, &mut list, 0, tag == "ol");
            push_block(out, list.trim_end());
        }
        "blockquote" => {
            let mut inner = String::new();
            render_blocks(node, &mut inner);
            let quoted = tidy(&inner)
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            push_block(out, &quoted);
        }
        "pre" => {
            let mut code = String::new();
            raw_text(node, &mut code);
            push_block(out, &format!("```\n{}\n```", code.trim_matches('\n')));
        }
        "table" => {
            render_table(node, out);
        }
        "hr" => {
            push_block(out, "---");
        }
        "head" | "script" | "style" | "template" => {}
        // Everything else (div, section, body, ...) is a plain container.
        _ => render_blocks(node, out),
    }
}

fn render_list(node: &Handle, out: &mut String, depth: usize, ordered: bool) {
    let mut index = 1usize;
    for child in node.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            match tag_name(name) {
                "li" => {
                    let marker = if ordered { Some(index) } else { None };
                    render_list_item(child, out, depth, marker);
                    index += 1;
                }
                "ul" => render_list(child, out, depth + 1, false),
                "ol" => render_list(child, out, depth + 1, true),
                _ => {}
            }
        }
    }
}

fn render_list_item(node: &Handle, out: &mut String, depth: usize, index: Option<usize>) {
    let mut line = String::new();
    let mut nested: Vec<(Handle, bool)> = Vec::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            match tag_name(name) {
                "ul" => {
                    nested.push((child.clone(), false));
                    continue;
                }
                "ol" => {
                    nested.push((child.clone(), true));
                    continue;
                }
                _ => {}
            }
        }
        line.push_str(&inline_text(child));
    }

    let text = line.trim();
    if !text.is_empty() {
        let marker = match index {
            Some(n) => format!("{}. ", n),
            None => "- ".to_string(),
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&marker);
        out.push_str(text);
        out.push('\n');
    }
    for (list, ordered) in nested {
        render_list(&list, out, depth + 1, ordered);
    }
}

fn render_table(node: &Handle, out: &mut String) {
    let mut rows: Vec<Vec<String>> = Vec::new();
    collect_table_rows(node, &mut rows);
    if rows.is_empty() {
        return;
    }
    let mut table = String::new();
    for (i, row) in rows.iter().enumerate() {
        table.push('|');
        for cell in row {
            table.push(' ');
            table.push_str(cell);
            table.push_str(" |");
        }
        table.push('\n');
        if i == 0 {
            table.push('|');
            for _ in row {
                table.push_str(" --- |");
            }
            table.push('\n');
        }
    }
    push_block(out, table.trim_end());
}

fn collect_table_rows(node: &Handle, rows: &mut Vec<Vec<String>>) {
    for child in node.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            match tag_name(name) {
                "tr" => {
                    let mut cells = Vec::new();
                    for cell in child.children.borrow().iter() {
                        if let NodeData::Element { name, .. } = &cell.data {
                            if matches!(tag_name(name), "td" | "th") {
                                cells.push(inline_children(cell).trim().to_string());
                            }
                        }
                    }
                    if !cells.is_empty() {
                        rows.push(cells);
                    }
                }
                "thead" | "tbody" | "tfoot" => collect_table_rows(child, rows),
                _ => {}
            }
        }
    }
}

fn inline_text(node: &Handle) -> String {
    match &node.data {
        NodeData::Text { contents } => collapse_ws(&contents.borrow()),
        NodeData::Element { name, attrs, .. } => {
            let tag = tag_name(name);
            match tag {
                "strong" | "b" => wrap_inline(node, "**"),
                "em" | "i" => wrap_inline(node, "*"),
                "code" => wrap_inline(node, "`"),
                "a" => {
                    let inner = inline_children(node);
                    let attrs = attrs.borrow();
                    match attr_value(&attrs, "href") {
                        Some(href) if !href.is_empty() => {
                            format!("[{}]({})", inner.trim(), href)
                        }
                        _ => inner,
                    }
                }
                "img" => {
                    let attrs = attrs.borrow();
                    match attr_value(&attrs, "src") {
                        Some(src) if !src.is_empty() => {
                            let alt = attr_value(&attrs, "alt").unwrap_or("");
                            format!("![{}]({})", alt, src)
                        }
                        _ => String::new(),
                    }
                }
                "br" => "\n".to_string(),
                "script" | "style" | "template" => String::new(),
                _ => inline_children(node),
            }
        }
        _ => String::new(),
    }
}

fn wrap_inline(node: &Handle, delimiter: &str) -> String {
    let inner = inline_children(node);
    let inner = inner.trim();
    if inner.is_empty() {
        String::new()
    } else {
        format!("{}{}{}", delimiter, inner, delimiter)
    }
}

fn inline_children(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        text.push_str(&inline_text(child));
    }
    text
}

fn raw_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => raw_text(child, out),
            _ => {}
        }
    }
}

fn collapse_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_ws = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_was_ws {
                out.push(' ');
            }
            last_was_ws = true;
        } else {
            out.push(ch);
            last_was_ws = false;
        }
    }
    out
}

fn flush_paragraph(paragraph: &mut String, out: &mut String) {
    let text = paragraph.trim().to_string();
    if !text.is_empty() {
        push_block(out, &text);
    }
    paragraph.clear();
}

fn push_block(out: &mut String, block: &str) {
    if block.trim().is_empty() {
        return;
    }
    out.push_str(block);
    out.push_str("\n\n");
}

/// Fold runs of blank lines and strip surrounding whitespace, leaving code
/// fences untouched.
fn tidy(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut last_blank = true;
    for line in text.lines() {
        let is_fence = line.trim_start().starts_with("```");
        if is_fence {
            in_fence = !in_fence;
        }
        let line = if in_fence || is_fence {
            line
        } else {
            line.trim_end()
        };
        let blank = line.trim().is_empty();
        if blank && !in_fence {
            if last_blank {
                continue;
            }
            lines.push("");
            last_blank = true;
        } else {
            lines.push(line);
            last_blank = blank;
        }
    }
    while matches!(lines.last(), Some(line) if line.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_paragraph() {
        assert_eq!(html_to_markdown("<p>Hi</p>"), "Hi");
    }

    #[test]
    fn test_headings() {
        let md = html_to_markdown("<h1>Title</h1><h2>Sub</h2><p>Body</p>");
        assert_eq!(md, "# Title\n\n## Sub\n\nBody");
    }

    #[test]
    fn test_inline_formatting() {
        let md = html_to_markdown("<p>a <strong>b</strong> <em>c</em> <code>d</code></p>");
        assert_eq!(md, "a **b** *c* `d`");
    }

    #[test]
    fn test_links_and_images() {
        let md = html_to_markdown(
            r#"<p><a href="/wiki/x">wiki</a> and <img src="/img/logo.png" alt="logo"></p>"#,
        );
        assert!(md.contains("[wiki](/wiki/x)"));
        assert!(md.contains("![logo](/img/logo.png)"));
    }

    #[test]
    fn test_anchor_without_href_keeps_text() {
        assert_eq!(html_to_markdown("<p><a>plain</a></p>"), "plain");
    }

    #[test]
    fn test_unordered_list() {
        let md = html_to_markdown("<ul><li>one</li><li>two</li></ul>");
        assert_eq!(md, "- one\n- two");
    }

    #[test]
    fn test_ordered_list_numbering() {
        let md = html_to_markdown("<ol><li>first</li><li>second</li><li>third</li></ol>");
        assert_eq!(md, "1. first\n2. second\n3. third");
    }

    #[test]
    fn test_nested_list_indents() {
        let md = html_to_markdown("<ul><li>outer<ul><li>inner</li></ul></li><li>next</li></ul>");
        assert_eq!(md, "- outer\n  - inner\n- next");
    }

    #[test]
    fn test_blockquote() {
        let md = html_to_markdown("<blockquote><p>quoted</p></blockquote>");
        assert_eq!(md, "> quoted");
    }

    #[test]
    fn test_code_block_preserves_lines() {
        let md = html_to_markdown("<pre><code>let a = 1;\nlet b = 2;</code></pre>");
        assert_eq!(md, "```\nlet a = 1;\nlet b = 2;\n```");
    }

    #[test]
    fn test_table() {
        let md = html_to_markdown(
            "<table><tr><th>Name</th><th>Role</th></tr><tr><td>Ada</td><td>Eng</td></tr></table>",
        );
        assert_eq!(md, "| Name | Role |\n| --- | --- |\n| Ada | Eng |");
    }

    #[test]
    fn test_skips_script_and_style() {
        let md = html_to_markdown(
            "<style>p { color: red }</style><p>visible</p><script>alert(1)</script>",
        );
        assert_eq!(md, "visible");
    }

    #[test]
    fn test_collapses_whitespace() {
        let md = html_to_markdown("<p>Hello\n      world</p>");
        assert_eq!(md, "Hello world");
    }

    #[test]
    fn test_decodes_entities() {
        let md = html_to_markdown("<p>fish &amp; chips</p>");
        assert_eq!(md, "fish & chips");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_markdown(""), "");
    }

    #[test]
    fn test_mixed_containers() {
        let md = html_to_markdown(
            "<div><h2>News</h2><div>loose text<p>para</p></div><hr></div>",
        );
        assert_eq!(md, "## News\n\nloose text\n\npara\n\n---");
    }

    #[test]
    fn test_widget_extraction_joins_matches() {
        let html = r#"<html><body>
            <div class="nav">menu</div>
            <div class="ig-cpt"><p>First widget</p></div>
            <div class="box ig-cpt"><p>Second widget</p></div>
        </body></html>"#;
        let content = extract_widget_content(html).unwrap();
        assert!(content.contains("<p>First widget</p>"));
        assert!(content.contains("<p>Second widget</p>"));
        let first = content.find("First widget").unwrap();
        let second = content.find("Second widget").unwrap();
        assert!(first < second);
        assert!(content.contains('\n'));
    }

    #[test]
    fn test_widget_extraction_requires_class() {
        let html = r#"<div class="ig-cpt-other"><p>not a widget</p></div>"#;
        assert!(extract_widget_content(html).is_none());
    }

    #[test]
    fn test_widget_extraction_none_without_widgets() {
        assert!(extract_widget_content("<html><body><p>plain</p></body></html>").is_none());
    }

    #[test]
    fn test_nested_widget_emitted_once() {
        let html = r#"<div class="ig-cpt"><div class="ig-cpt"><p>inner</p></div></div>"#;
        let content = extract_widget_content(html).unwrap();
        assert_eq!(content.matches("<p>inner</p>").count(), 1);
    }

    #[test]
    fn test_widget_markdown_round_trip() {
        let html = r#"<html><body><div class="ig-cpt"><h2>Metrics</h2><p>All green.</p></div></body></html>"#;
        let content = extract_widget_content(html).unwrap();
        let md = html_to_markdown(&content);
        assert_eq!(md, "## Metrics\n\nAll green.");
    }
}
