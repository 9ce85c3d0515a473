//! Syntax highlighting for fenced code blocks
//!
//! Highlighting emits class-based spans; the matching stylesheet comes from
//! [`highlight_css`].

use super::node::{Element, Node, RawHtml};
use super::RenderError;
use std::sync::OnceLock;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

/// Class marking a code element that has been highlighted
pub const HIGHLIGHTED_CLASS: &str = "hljs";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };
const THEME: &str = "InspiredGitHub";

static SYNTAXES: OnceLock<SyntaxSet> = OnceLock::new();

fn syntaxes() -> &'static SyntaxSet {
    SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines)
}

/// Highlight every `pre > code` block in the tree
///
/// Blocks already carrying the highlighted class are left alone.
///
/// # Returns
/// * `Ok(usize)` - Number of blocks highlighted
/// * `Err(RenderError)` - The highlighter rejected a block
pub fn highlight_code_blocks(root: &mut Element) -> Result<usize, RenderError> {
    let mut count = 0;
    highlight_within(root, &mut count)?;
    Ok(count)
}

fn highlight_within(element: &mut Element, count: &mut usize) -> Result<(), RenderError> {
    let is_pre = element.tag == "pre";
    for child in &mut element.children {
        let Node::Element(child) = child else {
            continue;
        };
        if is_pre && child.tag == "code" {
            if !child.has_class(HIGHLIGHTED_CLASS) {
                highlight_block(child)?;
                *count += 1;
            }
        } else {
            highlight_within(child, count)?;
        }
    }
    Ok(())
}

fn highlight_block(code: &mut Element) -> Result<(), RenderError> {
    let source = code.text_content();
    let language = code
        .attr("class")
        .and_then(|classes| {
            classes
                .split_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
        })
        .map(str::to_string);

    let html = highlight_source(&source, language.as_deref())?;
    code.children = vec![Node::Raw(RawHtml::with_text(html, source))];
    code.add_class(HIGHLIGHTED_CLASS);
    Ok(())
}

/// Highlight source text, falling back to plain text for unknown languages
pub fn highlight_source(source: &str, language: Option<&str>) -> Result<String, RenderError> {
    let syntaxes = syntaxes();
    let syntax = language
        .and_then(|lang| syntaxes.find_syntax_by_token(lang))
        .unwrap_or_else(|| syntaxes.find_syntax_plain_text());

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntaxes, CLASS_STYLE);
    for line in LinesWithEndings::from(source) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| RenderError::Highlight(e.to_string()))?;
    }
    Ok(generator.finalize())
}

/// Stylesheet for the highlighted span classes
pub fn highlight_css() -> Result<String, RenderError> {
    let themes = ThemeSet::load_defaults();
    let theme = themes
        .themes
        .get(THEME)
        .ok_or_else(|| RenderError::Highlight(format!("theme '{}' is not bundled", THEME)))?;
    css_for_theme_with_class_style(theme, CLASS_STYLE)
        .map_err(|e| RenderError::Highlight(e.to_string()))
}
