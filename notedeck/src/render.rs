//! Markdown rendering
//!
//! Converts markdown source into an HTML-equivalent node tree with stable
//! heading identifiers, and highlights fenced code blocks in that tree.

use thiserror::Error;

// Submodules
mod heading;
mod highlight;
mod markdown;
mod node;

// Re-export public types
pub use heading::{heading_id, strip_id_annotation, HeadingIds};
pub use highlight::{highlight_code_blocks, highlight_css, highlight_source, HIGHLIGHTED_CLASS};
pub use markdown::{render_markdown, CONTENT_CLASS};
pub use node::{escape_html, Element, Node, RawHtml};

/// Errors raised while turning markdown into a displayable tree
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("syntax highlighting failed: {0}")]
    Highlight(String),
}

/// Whether an element is a heading (`h1` to `h6`)
pub fn heading_level(element: &Element) -> Option<u8> {
    let mut chars = element.tag.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('h'), Some(digit @ '1'..='6'), None) => digit.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}
