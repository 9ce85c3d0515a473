//! Markdown event stream to node tree conversion
//!
//! Walks pulldown-cmark's event stream with an explicit element stack. Every
//! start tag pushes exactly one frame and every end tag pops one, so the
//! closing side never needs to inspect the tag.

use super::heading::{heading_id, strip_id_annotation, HeadingIds};
use super::node::{Element, Node, RawHtml};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag};

/// Class of the root element holding a rendered document
pub const CONTENT_CLASS: &str = "markdown-body";

/// Convert markdown text into a node tree rooted at `div.markdown-body`
pub fn render_markdown(markdown: &str) -> Element {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES;

    let mut builder = TreeBuilder::new();
    for event in Parser::new_ext(markdown, options) {
        builder.process_event(event);
    }
    builder.finish()
}

/// How a frame is attached to its parent when it closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Normal,
    /// Children are spliced into the parent (e.g. HTML blocks)
    Transparent,
    /// A `code` element that gets wrapped in `pre`
    CodeBlock,
    /// Header cells that get wrapped in a row
    TableHead,
    Heading,
    /// Children become the `alt` attribute
    Image,
}

struct Frame {
    element: Element,
    kind: FrameKind,
}

struct TreeBuilder {
    stack: Vec<Frame>,
    heading_ids: HeadingIds,
    /// Column alignments of open tables
    table_alignments: Vec<Vec<Alignment>>,
    /// Index of the next cell in the current row
    cell_index: usize,
    in_table_head: bool,
    /// Inside a `<script>` element that spans several HTML events
    in_script: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame {
                element: Element::new("div").with_attr("class", CONTENT_CLASS),
                kind: FrameKind::Normal,
            }],
            heading_ids: HeadingIds::new(),
            table_alignments: Vec::new(),
            cell_index: 0,
            in_table_head: false,
            in_script: false,
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(_) => self.close_frame(),
            Event::Text(text) => self.top().push_text(text.to_string()),
            Event::Code(code) => {
                let code = Element::new("code").with_text(code.to_string());
                self.append(code);
            }
            Event::InlineMath(math) => {
                let math = Element::new("span")
                    .with_attr("class", "math math-inline")
                    .with_text(math.to_string());
                self.append(math);
            }
            Event::DisplayMath(math) => {
                let math = Element::new("span")
                    .with_attr("class", "math math-display")
                    .with_text(math.to_string());
                self.append(math);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.handle_html(&html),
            Event::SoftBreak => self.top().push_text("\n"),
            Event::HardBreak => self.append(Element::new("br")),
            Event::Rule => self.append(Element::new("hr")),
            Event::FootnoteReference(name) => {
                let link = Element::new("a")
                    .with_attr("href", format!("#fn-{}", heading_id(&name)))
                    .with_text(name.to_string());
                let sup = Element::new("sup")
                    .with_attr("class", "footnote-reference")
                    .with_child(link);
                self.append(sup);
            }
            Event::TaskListMarker(checked) => {
                let mut input = Element::new("input")
                    .with_attr("type", "checkbox")
                    .with_attr("disabled", "");
                if checked {
                    input.set_attr("checked", "");
                }
                self.append(input);
            }
        }
    }

    fn handle_start_tag(&mut self, tag: Tag<'_>) {
        let (element, kind) = match tag {
            Tag::Paragraph => (Element::new("p"), FrameKind::Normal),
            Tag::Heading { level, .. } => {
                (Element::new(format!("h{}", level as usize)), FrameKind::Heading)
            }
            Tag::BlockQuote(_) => (Element::new("blockquote"), FrameKind::Normal),
            Tag::CodeBlock(kind) => {
                let mut code = Element::new("code");
                if let CodeBlockKind::Fenced(info) = kind {
                    // Only the first word of the info string names the language
                    if let Some(lang) = info.split_whitespace().next() {
                        code.set_attr("class", format!("language-{}", lang));
                    }
                }
                (code, FrameKind::CodeBlock)
            }
            Tag::HtmlBlock => (Element::new(""), FrameKind::Transparent),
            Tag::List(Some(start)) => {
                let mut list = Element::new("ol");
                if start != 1 {
                    list.set_attr("start", start.to_string());
                }
                (list, FrameKind::Normal)
            }
            Tag::List(None) => (Element::new("ul"), FrameKind::Normal),
            Tag::Item => (Element::new("li"), FrameKind::Normal),
            Tag::FootnoteDefinition(name) => (
                Element::new("div")
                    .with_attr("class", "footnote-definition")
                    .with_attr("id", format!("fn-{}", heading_id(&name))),
                FrameKind::Normal,
            ),
            Tag::DefinitionList => (Element::new("dl"), FrameKind::Normal),
            Tag::DefinitionListTitle => (Element::new("dt"), FrameKind::Normal),
            Tag::DefinitionListDefinition => (Element::new("dd"), FrameKind::Normal),
            Tag::Table(alignments) => {
                self.table_alignments.push(alignments);
                (Element::new("table"), FrameKind::Normal)
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.cell_index = 0;
                (Element::new("thead"), FrameKind::TableHead)
            }
            Tag::TableRow => {
                self.cell_index = 0;
                (Element::new("tr"), FrameKind::Normal)
            }
            Tag::TableCell => {
                let mut cell = Element::new(if self.in_table_head { "th" } else { "td" });
                if let Some(style) = self.cell_alignment() {
                    cell.set_attr("style", style);
                }
                self.cell_index += 1;
                (cell, FrameKind::Normal)
            }
            Tag::Emphasis => (Element::new("em"), FrameKind::Normal),
            Tag::Strong => (Element::new("strong"), FrameKind::Normal),
            Tag::Strikethrough => (Element::new("del"), FrameKind::Normal),
            Tag::Superscript => (Element::new("sup"), FrameKind::Normal),
            Tag::Subscript => (Element::new("sub"), FrameKind::Normal),
            Tag::Link {
                dest_url, title, ..
            } => {
                let mut link = Element::new("a").with_attr("href", dest_url.to_string());
                if !title.is_empty() {
                    link.set_attr("title", title.to_string());
                }
                (link, FrameKind::Normal)
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                let mut image = Element::new("img").with_attr("src", dest_url.to_string());
                if !title.is_empty() {
                    image.set_attr("title", title.to_string());
                }
                (image, FrameKind::Image)
            }
            Tag::MetadataBlock(_) => (Element::new(""), FrameKind::Transparent),
        };

        self.stack.push(Frame { element, kind });
    }

    /// Inline style for the current table cell, if its column is aligned
    fn cell_alignment(&self) -> Option<&'static str> {
        let alignment = self.table_alignments.last()?.get(self.cell_index)?;
        match alignment {
            Alignment::Left => Some("text-align: left;"),
            Alignment::Center => Some("text-align: center;"),
            Alignment::Right => Some("text-align: right;"),
            Alignment::None => None,
        }
    }

    fn close_frame(&mut self) {
        // The root frame is never closed by an event
        if self.stack.len() <= 1 {
            return;
        }
        let Some(Frame { mut element, kind }) = self.stack.pop() else {
            return;
        };

        match kind {
            FrameKind::Normal => {
                if element.tag == "table" {
                    self.table_alignments.pop();
                }
                self.append(element);
            }
            FrameKind::Transparent => {
                for child in element.children {
                    match child {
                        Node::Text(text) => self.top().push_text(text),
                        other => self.top().children.push(other),
                    }
                }
            }
            FrameKind::CodeBlock => {
                let pre = Element::new("pre").with_child(element);
                self.append(pre);
            }
            FrameKind::TableHead => {
                self.in_table_head = false;
                let mut row = Element::new("tr");
                row.children = std::mem::take(&mut element.children);
                element.children.push(Node::Element(row));
                self.append(element);
            }
            FrameKind::Heading => {
                self.finish_heading(&mut element);
                self.append(element);
            }
            FrameKind::Image => {
                let alt = element.text_content();
                element.children.clear();
                element.set_attr("alt", alt);
                self.append(element);
            }
        }
    }

    /// Strip the `{#...}` annotation and assign the derived identifier
    fn finish_heading(&mut self, heading: &mut Element) {
        if let Some(Node::Text(last)) = heading.children.last_mut() {
            *last = strip_id_annotation(last);
            if last.is_empty() {
                heading.children.pop();
            }
        }

        let text = heading.text_content();
        if text.trim().is_empty() {
            log::warn!(
                "Heading <{}> has no text content; rendering it without an identifier",
                heading.tag
            );
            return;
        }

        let id = self.heading_ids.unique(&heading_id(&text));
        heading.set_attr("id", id);
    }

    fn handle_html(&mut self, html: &str) {
        let lower = html.to_ascii_lowercase();
        if self.in_script {
            self.in_script = !lower.contains("</script");
            return;
        }
        if let Some(start) = lower.find("<script") {
            log::warn!("Dropping script content from rendered markdown");
            self.in_script = !lower[start..].contains("</script");
            return;
        }
        self.top()
            .children
            .push(Node::Raw(RawHtml::from_html(html.to_string())));
    }

    fn top(&mut self) -> &mut Element {
        // The root frame is pushed in `new` and never popped before `finish`
        let last = self.stack.len() - 1;
        &mut self.stack[last].element
    }

    fn append(&mut self, element: Element) {
        self.top().children.push(Node::Element(element));
    }

    fn finish(mut self) -> Element {
        // Close anything left open by malformed input
        while self.stack.len() > 1 {
            self.close_frame();
        }
        self.stack
            .pop()
            .map(|frame| frame.element)
            .unwrap_or_else(|| Element::new("div").with_attr("class", CONTENT_CLASS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(root: &Element) -> Vec<(String, Option<String>, String)> {
        root.descendants()
            .into_iter()
            .filter(|e| e.tag.len() == 2 && e.tag.starts_with('h'))
            .map(|e| {
                (
                    e.tag.clone(),
                    e.id().map(str::to_string),
                    e.text_content(),
                )
            })
            .collect()
    }

    #[test]
    fn test_render_paragraph() {
        let root = render_markdown("Hello **world**");
        assert_eq!(
            root.to_html(),
            "<div class=\"markdown-body\"><p>Hello <strong>world</strong></p></div>"
        );
    }

    #[test]
    fn test_heading_gets_derived_id() {
        let root = render_markdown("## Load Balancing!\n\n### A & B\n");
        assert_eq!(
            headings(&root),
            vec![
                (
                    "h2".to_string(),
                    Some("load-balancing-".to_string()),
                    "Load Balancing!".to_string()
                ),
                ("h3".to_string(), Some("a-b".to_string()), "A & B".to_string()),
            ]
        );
    }

    #[test]
    fn test_heading_annotation_stripped_and_ignored() {
        let root = render_markdown("## Caching Layers {#cache}\n");
        let found = headings(&root);
        assert_eq!(found[0].1.as_deref(), Some("caching-layers"));
        assert_eq!(found[0].2, "Caching Layers");
        assert!(!root.to_html().contains("{#"));
    }

    #[test]
    fn test_duplicate_headings_get_unique_ids() {
        let root = render_markdown("## Setup\n\n## Setup\n\n## Setup\n");
        let ids: Vec<Option<String>> = headings(&root).into_iter().map(|h| h.1).collect();
        assert_eq!(
            ids,
            vec![
                Some("setup".to_string()),
                Some("setup-1".to_string()),
                Some("setup-2".to_string())
            ]
        );
    }

    #[test]
    fn test_heading_without_text_has_no_id() {
        let root = render_markdown("## ![](diagram.png)\n");
        let found = headings(&root);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1, None);
    }

    #[test]
    fn test_heading_with_inline_code_uses_text_for_id() {
        let root = render_markdown("## The `select` call\n");
        assert_eq!(headings(&root)[0].1.as_deref(), Some("the-select-call"));
        assert!(root.to_html().contains("<code>select</code>"));
    }

    #[test]
    fn test_fenced_code_block() {
        let root = render_markdown("```rust title=main\nfn main() {}\n```\n");
        assert_eq!(
            root.inner_html(),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_indented_code_block_has_no_language() {
        let root = render_markdown("    let x = 1;\n");
        assert_eq!(root.inner_html(), "<pre><code>let x = 1;\n</code></pre>");
    }

    #[test]
    fn test_table_header_wrapped_in_row() {
        let root = render_markdown("| a | b |\n|:--|--:|\n| 1 | 2 |\n");
        let html = root.inner_html();
        assert!(html.starts_with(
            "<table><thead><tr><th style=\"text-align: left;\">a</th><th style=\"text-align: right;\">b</th></tr></thead>"
        ));
        assert!(html.contains("<td style=\"text-align: left;\">1</td>"));
    }

    #[test]
    fn test_ordered_list_start() {
        let root = render_markdown("3. three\n4. four\n");
        assert!(root.inner_html().starts_with("<ol start=\"3\"><li>three</li>"));
    }

    #[test]
    fn test_task_list() {
        let root = render_markdown("- [x] done\n- [ ] todo\n");
        let html = root.inner_html();
        assert!(html.contains("<input type=\"checkbox\" disabled=\"\" checked=\"\">done"));
        assert!(html.contains("<input type=\"checkbox\" disabled=\"\">todo"));
    }

    #[test]
    fn test_image_alt_text() {
        let root = render_markdown("![OSI layers](osi.png \"Layers\")");
        assert_eq!(
            root.inner_html(),
            "<p><img src=\"osi.png\" title=\"Layers\" alt=\"OSI layers\"></p>"
        );
    }

    #[test]
    fn test_link() {
        let root = render_markdown("[docs](https://example.com)");
        assert_eq!(
            root.inner_html(),
            "<p><a href=\"https://example.com\">docs</a></p>"
        );
    }

    #[test]
    fn test_script_html_dropped() {
        let root = render_markdown("<script>alert(1)</script>\n\ntext");
        let html = root.inner_html();
        assert!(!html.contains("script"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn test_multiline_script_block_dropped() {
        let root = render_markdown("<SCRIPT>\nalert(1)\n</script>\n\ntext\n\n<div>kept</div>\n");
        let html = root.inner_html();
        assert!(!html.contains("alert"));
        assert!(!html.to_ascii_lowercase().contains("script"));
        assert!(html.contains("<p>text</p>"));
        assert!(html.contains("<div>kept</div>"));
    }

    #[test]
    fn test_inline_html_kept() {
        let root = render_markdown("a<br>b");
        assert_eq!(root.inner_html(), "<p>a<br>b</p>");
    }

    #[test]
    fn test_empty_input() {
        let root = render_markdown("");
        assert!(root.children.is_empty());
        assert!(root.has_class(CONTENT_CLASS));
    }
}
