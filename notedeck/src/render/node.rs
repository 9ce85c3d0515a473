//! HTML-equivalent node tree
//!
//! Rendered documents are kept as a small owned tree rather than a string so
//! that the outline, highlighting and export passes can work on structure.

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta"];

/// A node in a rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Raw(RawHtml),
}

/// Pre-rendered markup with a plain-text fallback
///
/// Used for passthrough HTML from the markdown source and for highlighted
/// code, where exporters that cannot consume HTML still need the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHtml {
    pub html: String,
    pub text: String,
}

impl RawHtml {
    /// Wrap a passthrough HTML fragment, deriving its text by dropping tags
    pub fn from_html(html: String) -> Self {
        let text = strip_tags(&html);
        Self { html, text }
    }

    /// Wrap markup produced from known source text
    pub fn with_text(html: String, text: String) -> Self {
        Self { html, text }
    }
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new<S: Into<String>>(tag: S) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child appender
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Builder-style text appender
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.push_text(text);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(index).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id").filter(|id| !id.is_empty())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    /// Append text, merging with a directly preceding text node
    pub fn push_text<S: Into<String>>(&mut self, text: S) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        if let Some(Node::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(Node::Text(text));
        }
    }

    /// Direct element children
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// All descendant elements in document (pre-)order, excluding `self`
    pub fn descendants(&self) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(self, &mut found);
        found
    }

    /// Visit `self` and every descendant element in document order
    pub fn walk_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.walk_mut(f);
            }
        }
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        append_text(self, &mut text);
        text
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }

    pub fn to_html(&self) -> String {
        let mut output = String::new();
        write_element(&mut output, self);
        output
    }

    pub fn inner_html(&self) -> String {
        let mut output = String::new();
        for child in &self.children {
            write_node(&mut output, child);
        }
        output
    }
}

fn collect_descendants<'a>(element: &'a Element, found: &mut Vec<&'a Element>) {
    for child in element.child_elements() {
        found.push(child);
        collect_descendants(child, found);
    }
}

fn append_text(element: &Element, text: &mut String) {
    for child in &element.children {
        match child {
            Node::Element(el) => append_text(el, text),
            Node::Text(t) => text.push_str(t),
            Node::Raw(raw) => text.push_str(&raw.text),
        }
    }
}

fn write_node(output: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_element(output, el),
        Node::Text(text) => output.push_str(&escape_html(text)),
        Node::Raw(raw) => output.push_str(&raw.html),
    }
}

fn write_element(output: &mut String, element: &Element) {
    output.push('<');
    output.push_str(&element.tag);
    for (name, value) in &element.attrs {
        output.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
    }
    output.push('>');

    if element.is_void() {
        return;
    }

    for child in &element.children {
        write_node(output, child);
    }

    output.push_str(&format!("</{}>", element.tag));
}

/// Escape HTML special characters
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Drop tags from an HTML fragment and decode the basic entities
fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<div>"), "&lt;div&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_to_html_nested() {
        let el = Element::new("p")
            .with_attr("class", "lead")
            .with_text("a < b ")
            .with_child(Element::new("strong").with_text("bold"));
        assert_eq!(
            el.to_html(),
            "<p class=\"lead\">a &lt; b <strong>bold</strong></p>"
        );
    }

    #[test]
    fn test_void_elements_have_no_closing_tag() {
        let el = Element::new("p")
            .with_text("line")
            .with_child(Element::new("br"));
        assert_eq!(el.to_html(), "<p>line<br></p>");
    }

    #[test]
    fn test_push_text_merges_adjacent_text() {
        let mut el = Element::new("h2");
        el.push_text("Load ");
        el.push_text("Balancing");
        assert_eq!(el.children, vec![Node::Text("Load Balancing".to_string())]);
    }

    #[test]
    fn test_classes() {
        let mut el = Element::new("li");
        assert!(!el.has_class("toc-h3"));
        el.add_class("toc-h3");
        el.add_class("active");
        el.add_class("active");
        assert_eq!(el.attr("class"), Some("toc-h3 active"));
        assert!(el.has_class("active"));
    }

    #[test]
    fn test_text_content_includes_raw_fallback() {
        let mut el = Element::new("code");
        el.children.push(Node::Raw(RawHtml::from_html(
            "<span class=\"kw\">fn</span> main &amp; co".to_string(),
        )));
        assert_eq!(el.text_content(), "fn main & co");
        assert_eq!(
            el.inner_html(),
            "<span class=\"kw\">fn</span> main &amp; co"
        );
    }

    #[test]
    fn test_descendants_in_document_order() {
        let root = Element::new("div")
            .with_child(Element::new("h2").with_child(Element::new("em")))
            .with_child(Element::new("h3"));
        let tags: Vec<&str> = root.descendants().iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["h2", "em", "h3"]);
    }
}
