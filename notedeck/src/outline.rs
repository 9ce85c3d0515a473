//! In-page outline built from a rendered document's headings

use crate::render::{heading_level, Element, HeadingIds, Node};

/// Class of the outline block inserted at the top of a document
pub const OUTLINE_CLASS: &str = "page-toc";

/// Title shown above the outline links
pub const OUTLINE_TITLE: &str = "Page Contents";

/// Heading levels that appear in the outline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OutlineLevel {
    H2,
    H3,
    H4,
}

impl OutlineLevel {
    fn from_level(level: u8) -> Option<Self> {
        match level {
            2 => Some(Self::H2),
            3 => Some(Self::H3),
            4 => Some(Self::H4),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::H2 => 2,
            Self::H3 => 3,
            Self::H4 => 4,
        }
    }

    /// Indent class for the outline entry; level 2 is the baseline
    pub fn indent_class(self) -> Option<&'static str> {
        match self {
            Self::H2 => None,
            Self::H3 => Some("toc-h3"),
            Self::H4 => Some("toc-h4"),
        }
    }
}

/// One outline entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingEntry {
    pub level: OutlineLevel,
    pub id: String,
    pub text: String,
}

/// Insert the outline as the first child of `root`
///
/// Any outline already present is removed first, so repeated calls never
/// stack outlines. Headings without an identifier are given
/// `heading-<index>`, where the index counts collected headings from zero,
/// suffixed when that identifier is already used in the document.
///
/// # Returns
/// * The outline entries, or an empty list when fewer than two headings
///   qualify (no outline is inserted in that case)
pub fn insert_outline(root: &mut Element) -> Vec<HeadingEntry> {
    remove_outline(root);

    if collect_headings(root).len() < 2 {
        return Vec::new();
    }

    let entries = assign_ids(root);

    let mut list = Element::new("ul");
    for entry in &entries {
        let link = Element::new("a")
            .with_attr("href", format!("#{}", entry.id))
            .with_text(entry.text.clone());
        let mut item = Element::new("li").with_child(link);
        if let Some(class) = entry.level.indent_class() {
            item.set_attr("class", class);
        }
        list = list.with_child(item);
    }

    let outline = Element::new("div")
        .with_attr("class", OUTLINE_CLASS)
        .with_child(Element::new("h2").with_text(OUTLINE_TITLE))
        .with_child(list);

    root.children.insert(0, Node::Element(outline));
    entries
}

/// Remove top-level outline blocks, returning whether one was present
pub fn remove_outline(root: &mut Element) -> bool {
    let before = root.children.len();
    root.children
        .retain(|node| !matches!(node, Node::Element(el) if el.has_class(OUTLINE_CLASS)));
    root.children.len() != before
}

/// Outline-level headings of a tree in document order, skipping any outline block
pub fn collect_headings(root: &Element) -> Vec<HeadingEntry> {
    let mut entries = Vec::new();
    visit_headings(root, &mut |level, heading| {
        entries.push(HeadingEntry {
            level,
            id: heading.id().unwrap_or_default().to_string(),
            text: heading.text_content(),
        });
    });
    entries
}

fn outline_level(element: &Element) -> Option<OutlineLevel> {
    heading_level(element).and_then(OutlineLevel::from_level)
}

fn visit_headings<F: FnMut(OutlineLevel, &Element)>(element: &Element, f: &mut F) {
    for child in element.child_elements() {
        if child.has_class(OUTLINE_CLASS) {
            continue;
        }
        match outline_level(child) {
            Some(level) => f(level, child),
            None => visit_headings(child, f),
        }
    }
}

fn visit_headings_mut<F: FnMut(OutlineLevel, &mut Element)>(element: &mut Element, f: &mut F) {
    for child in &mut element.children {
        let Node::Element(child) = child else {
            continue;
        };
        if child.has_class(OUTLINE_CLASS) {
            continue;
        }
        match outline_level(child) {
            Some(level) => f(level, child),
            None => visit_headings_mut(child, f),
        }
    }
}

fn assign_ids(root: &mut Element) -> Vec<HeadingEntry> {
    let mut ids = HeadingIds::new();
    for element in root.descendants() {
        if let Some(id) = element.id() {
            ids.reserve(id);
        }
    }

    let mut entries = Vec::new();
    let mut index = 0;
    visit_headings_mut(root, &mut |level, heading| {
        if heading.id().is_none() {
            heading.set_attr("id", ids.unique(&format!("heading-{}", index)));
        }
        entries.push(HeadingEntry {
            level,
            id: heading.id().unwrap_or_default().to_string(),
            text: heading.text_content(),
        });
        index += 1;
    });
    entries
}
